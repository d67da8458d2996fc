//! Provider factory seam and the memoized provider binding.
//!
//! A [`ProviderFactory`] turns resolved [`EffectiveSettings`] into a
//! [`ProviderBinding`], the handle wrapping the configured OAuth client and
//! endpoint metadata. The orchestrator constructs the binding lazily, at most
//! once per instance, on first access by any operation; the factory seam
//! exists so vendor-specific construction (custom auth type, discovered
//! endpoints) can be injected without touching the orchestrator.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use oauth2::{
	AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl, TokenUrl,
	basic::BasicClient,
};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, error::ConfigError, ext::AuthorizationOptions, settings::EffectiveSettings};

pub(crate) type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Constructs a [`ProviderBinding`] from resolved settings.
///
/// Injected at orchestrator construction; the capability requirement the
/// original design checked at runtime is a compile-time constraint here.
pub trait ProviderFactory: Send + Sync {
	/// Creates the binding for the provided effective settings.
	fn create(&self, settings: &EffectiveSettings) -> Result<ProviderBinding>;
}

/// Default factory wiring the binding straight from the configured endpoints,
/// authenticating the client via HTTP Basic at the token endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardProviderFactory;
impl ProviderFactory for StandardProviderFactory {
	fn create(&self, settings: &EffectiveSettings) -> Result<ProviderBinding> {
		ProviderBinding::from_settings(settings.clone())
	}
}

/// Memoized handle to the concrete identity-provider endpoints.
///
/// Exclusively owned by one orchestrator instance and constructed at most
/// once during its lifetime.
pub struct ProviderBinding {
	pub(crate) oauth_client: ConfiguredBasicClient,
	settings: EffectiveSettings,
}
impl ProviderBinding {
	/// Builds a binding from resolved settings.
	pub fn from_settings(settings: EffectiveSettings) -> Result<Self> {
		let auth_url = AuthUrl::new(settings.authorization_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(settings.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(settings.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let oauth_client = BasicClient::new(ClientId::new(settings.client_id.clone()))
			.set_client_secret(ClientSecret::new(settings.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		Ok(Self { oauth_client, settings })
	}

	/// Effective settings the binding was constructed from.
	pub fn settings(&self) -> &EffectiveSettings {
		&self.settings
	}

	/// Renders the complete authorization URL for the provided options and
	/// returns it together with the generated anti-forgery state.
	///
	/// Defaults (`response_type=code`, `client_id`, `redirect_uri`, and the
	/// configured `scope`) are applied first; caller options overwrite them
	/// key by key. A caller-supplied `state` option is honored, otherwise a
	/// random state value is generated.
	pub fn authorization_url(&self, options: &AuthorizationOptions) -> (Url, String) {
		let mut params = AuthorizationOptions::new();

		params.insert("response_type".into(), "code".into());
		params.insert("client_id".into(), self.settings.client_id.clone());
		params.insert("redirect_uri".into(), self.settings.redirect_uri.to_string());

		if !self.settings.scopes.is_empty() {
			params.insert("scope".into(), self.settings.scopes.normalized());
		}

		for (key, value) in options {
			params.insert(key.clone(), value.clone());
		}

		let state = params.remove("state").unwrap_or_else(|| random_string(STATE_LEN));
		let mut url = self.settings.authorization_endpoint.clone();

		{
			let mut pairs = url.query_pairs_mut();

			for (key, value) in &params {
				pairs.append_pair(key, value);
			}

			pairs.append_pair("state", &state);
		}

		(url, state)
	}
}
impl Debug for ProviderBinding {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderBinding").field("settings", &self.settings).finish()
	}
}

/// PKCE verifier/challenge pair (RFC 7636 S256).
///
/// Generated by the caller before building the authorization URL; the
/// verifier must survive the redirect boundary and be passed back into the
/// authorization-code exchange.
#[derive(Clone)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
}
impl PkcePair {
	/// RFC 7636 identifier of the challenge method in use.
	pub const CHALLENGE_METHOD: &'static str = "S256";

	/// Generates a fresh verifier and its derived challenge.
	pub fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge }
	}

	/// Secret code verifier, exchanged alongside the authorization code.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// Public code challenge carried on the authorization URL.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.finish()
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
