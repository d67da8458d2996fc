//! Immutable client configuration and the derived effective view of it.
//!
//! [`ClientSettings`] describes the relying party once, at construction:
//! credentials, provider endpoints, scopes, and behavioral flags. The value is
//! never mutated afterwards; operations that need a resolved redirect URI
//! derive an [`EffectiveSettings`] copy instead, so callers holding the
//! original settings never observe aliasing surprises.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::ConfigError, token::TokenSecret};

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Normalized set of OAuth scopes.
///
/// Scopes are deduplicated and sorted so equality and the rendered `scope`
/// parameter stay stable regardless of configuration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ScopeSet(Vec<String>);
impl ScopeSet {
	/// Creates a normalized scope set from any iterator.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut normalized = Vec::new();

		for scope in scopes {
			let scope = scope.into();

			if scope.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if scope.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope });
			}

			normalized.push(scope);
		}

		normalized.sort_unstable();
		normalized.dedup();

		Ok(Self(normalized))
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|scope| scope.as_str())
	}

	/// Returns the normalized string representation (space-delimited).
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl TryFrom<Vec<String>> for ScopeSet {
	type Error = ScopeValidationError;

	fn try_from(scopes: Vec<String>) -> Result<Self, Self::Error> {
		Self::new(scopes)
	}
}
impl From<ScopeSet> for Vec<String> {
	fn from(scopes: ScopeSet) -> Self {
		scopes.0
	}
}

/// Immutable relying-party configuration consumed by the orchestrator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientSettings {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret used for confidential client authentication.
	pub client_secret: TokenSecret,
	/// Scopes requested on the authorization URL.
	pub scopes: ScopeSet,
	/// Authorization endpoint (browser redirect target).
	pub authorization_endpoint: Url,
	/// Token endpoint used for every grant exchange.
	pub token_endpoint: Url,
	/// Userinfo endpoint used to resolve the resource owner, if available.
	pub userinfo_endpoint: Option<Url>,
	/// Revocation endpoint; revocation short-circuits when absent.
	pub revocation_endpoint: Option<Url>,
	/// Explicit redirect URI registered with the provider.
	pub redirect_uri: Option<Url>,
	/// Hosting-environment site URL used to derive the redirect URI when no
	/// explicit value is configured.
	pub site_url: Option<Url>,
	/// Name of the authorization-request parameter carrying the prompt
	/// language; the language subscriber is a no-op when unset.
	pub language_parameter: Option<String>,
}
impl ClientSettings {
	/// Creates settings for the provided credentials and mandatory endpoints.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		authorization_endpoint: Url,
		token_endpoint: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			scopes: ScopeSet::default(),
			authorization_endpoint,
			token_endpoint,
			userinfo_endpoint: None,
			revocation_endpoint: None,
			redirect_uri: None,
			site_url: None,
			language_parameter: None,
		}
	}

	/// Sets the scopes requested during authorization.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Sets the userinfo endpoint.
	pub fn with_userinfo_endpoint(mut self, endpoint: Url) -> Self {
		self.userinfo_endpoint = Some(endpoint);

		self
	}

	/// Sets the revocation endpoint.
	pub fn with_revocation_endpoint(mut self, endpoint: Url) -> Self {
		self.revocation_endpoint = Some(endpoint);

		self
	}

	/// Sets the explicit redirect URI.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	/// Sets the hosting-environment site URL used as the redirect fallback.
	pub fn with_site_url(mut self, site_url: Url) -> Self {
		self.site_url = Some(site_url);

		self
	}

	/// Sets the authorization-request language parameter name.
	pub fn with_language_parameter(mut self, parameter: impl Into<String>) -> Self {
		self.language_parameter = Some(parameter.into());

		self
	}
}

/// Settings view with the redirect URI resolved, handed to provider factories.
///
/// Derived from [`ClientSettings`] at binding time; the caller's settings
/// value is left untouched.
#[derive(Clone, Debug)]
pub struct EffectiveSettings {
	settings: ClientSettings,
	/// Redirect URI in effect: the explicit value, else the site URL.
	pub redirect_uri: Url,
}
impl EffectiveSettings {
	/// Resolves the effective redirect URI from the provided settings.
	pub fn resolve(settings: &ClientSettings) -> Result<Self, ConfigError> {
		let redirect_uri = settings
			.redirect_uri
			.clone()
			.or_else(|| settings.site_url.clone())
			.ok_or(ConfigError::MissingRedirectUri)?;

		Ok(Self { settings: settings.clone(), redirect_uri })
	}
}
impl Deref for EffectiveSettings {
	type Target = ClientSettings;

	fn deref(&self) -> &Self::Target {
		&self.settings
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base_settings() -> ClientSettings {
		ClientSettings::new(
			"client-id",
			"client-secret",
			Url::parse("https://idp.example.com/authorize")
				.expect("Authorize endpoint fixture should parse."),
			Url::parse("https://idp.example.com/token")
				.expect("Token endpoint fixture should parse."),
		)
	}

	#[test]
	fn scopes_normalize_and_validate() {
		let scopes =
			ScopeSet::new(["profile", "openid", "profile"]).expect("Scope fixture should be valid.");

		assert_eq!(scopes.normalized(), "openid profile");
		assert_eq!(scopes.len(), 2);
		assert!(matches!(ScopeSet::new([""]), Err(ScopeValidationError::Empty)));
		assert!(matches!(
			ScopeSet::new(["open id"]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
	}

	#[test]
	fn redirect_resolution_prefers_explicit_value() {
		let settings = base_settings()
			.with_redirect_uri(
				Url::parse("https://rp.example.com/callback")
					.expect("Redirect fixture should parse."),
			)
			.with_site_url(Url::parse("https://rp.example.com/").expect("Site URL should parse."));
		let effective =
			EffectiveSettings::resolve(&settings).expect("Resolution should succeed here.");

		assert_eq!(effective.redirect_uri.as_str(), "https://rp.example.com/callback");
	}

	#[test]
	fn redirect_resolution_falls_back_to_site_url() {
		let settings = base_settings()
			.with_site_url(Url::parse("https://rp.example.com/").expect("Site URL should parse."));
		let effective =
			EffectiveSettings::resolve(&settings).expect("Site fallback should resolve.");

		assert_eq!(effective.redirect_uri.as_str(), "https://rp.example.com/");
	}

	#[test]
	fn redirect_resolution_fails_without_any_source() {
		let err = EffectiveSettings::resolve(&base_settings())
			.expect_err("Resolution must fail without redirect or site URL.");

		assert!(matches!(err, ConfigError::MissingRedirectUri));
	}

	#[test]
	fn effective_settings_do_not_mutate_the_original() {
		let settings = base_settings()
			.with_site_url(Url::parse("https://rp.example.com/").expect("Site URL should parse."));
		let _effective =
			EffectiveSettings::resolve(&settings).expect("Site fallback should resolve.");

		assert!(settings.redirect_uri.is_none());
	}
}
