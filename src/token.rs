//! Access-token value objects and their flat JSON wire form.
//!
//! The orchestrator never persists tokens; callers serialize an
//! [`AccessToken`] to its wire form (`{access_token, refresh_token?,
//! expires?, ...}`), own the storage, and hand the string back for the
//! refresh-on-expiry check. Unknown members round-trip losslessly.

// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Bearer credential issued by the provider.
///
/// A token without an expiry instant is treated as non-expiring; expiry is
/// computable purely from the stored instant and a clock reading.
#[derive(Clone, PartialEq)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Absolute expiry instant, if the provider communicated one.
	pub expires: Option<OffsetDateTime>,
	/// Provider-specific members carried through the wire form verbatim.
	pub values: BTreeMap<String, serde_json::Value>,
}
impl AccessToken {
	/// Creates a token from the bare access-token string.
	pub fn new(access_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: None,
			expires: None,
			values: BTreeMap::new(),
		}
	}

	/// Attaches a refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets an absolute expiry instant.
	pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
		self.expires = Some(expires);

		self
	}

	/// Sets expiry relative to the current clock.
	pub fn with_expires_in(self, expires_in: Duration) -> Self {
		self.with_expires(OffsetDateTime::now_utc() + expires_in)
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn has_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires.is_some_and(|expires| instant >= expires)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn has_expired(&self) -> bool {
		self.has_expired_at(OffsetDateTime::now_utc())
	}

	/// Renders the flat JSON wire form for caller-owned persistence.
	pub fn serialize(&self) -> String {
		// The wire struct contains nothing a Serialize impl can reject.
		serde_json::to_string(self).unwrap_or_default()
	}

	/// Parses the wire form produced by [`serialize`](Self::serialize).
	///
	/// Returns `None` for empty input and for input that does not parse into a
	/// non-empty JSON object carrying an `access_token`; that outcome is the
	/// "invalid token" absence class, not an error.
	pub fn from_serialized(serialized: &str) -> Option<Self> {
		if serialized.trim().is_empty() {
			return None;
		}

		let value = serde_json::from_str::<serde_json::Value>(serialized).ok()?;

		if !value.as_object().is_some_and(|object| !object.is_empty()) {
			return None;
		}

		serde_json::from_value(value).ok()
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires", &self.expires)
			.field("values", &self.values)
			.finish()
	}
}
impl Serialize for AccessToken {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		WireToken {
			access_token: self.access_token.expose().to_owned(),
			refresh_token: self.refresh_token.as_ref().map(|secret| secret.expose().to_owned()),
			expires: self.expires.map(OffsetDateTime::unix_timestamp),
			expires_in: None,
			values: self.values.clone(),
		}
		.serialize(serializer)
	}
}
impl<'de> Deserialize<'de> for AccessToken {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let wire = WireToken::deserialize(deserializer)?;
		let expires = match (wire.expires, wire.expires_in) {
			(Some(timestamp), _) => Some(
				OffsetDateTime::from_unix_timestamp(timestamp).map_err(serde::de::Error::custom)?,
			),
			(None, Some(expires_in)) =>
				Some(OffsetDateTime::now_utc() + Duration::seconds(expires_in)),
			(None, None) => None,
		};

		Ok(Self {
			access_token: TokenSecret::new(wire.access_token),
			refresh_token: wire.refresh_token.map(TokenSecret::new),
			expires,
			values: wire.values,
		})
	}
}

/// Flat wire representation; `expires` wins over `expires_in` on input.
#[derive(Serialize, Deserialize)]
struct WireToken {
	access_token: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<i64>,
	#[serde(flatten)]
	values: BTreeMap<String, serde_json::Value>,
}

/// Claims describing the authenticated resource owner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceOwnerClaims(pub serde_json::Map<String, serde_json::Value>);
impl ResourceOwnerClaims {
	/// Returns the `sub` claim, when present and textual.
	pub fn subject(&self) -> Option<&str> {
		self.get("sub").and_then(serde_json::Value::as_str)
	}

	/// Returns a raw claim value by name.
	pub fn get(&self, claim: &str) -> Option<&serde_json::Value> {
		self.0.get(claim)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn token_without_expiry_never_expires() {
		let token = AccessToken::new("opaque");

		assert!(!token.has_expired());
		assert!(!token.has_expired_at(macros::datetime!(2999-01-01 00:00 UTC)));
	}

	#[test]
	fn expiry_boundary_is_inclusive() {
		let expires = macros::datetime!(2025-06-01 12:00 UTC);
		let token = AccessToken::new("opaque").with_expires(expires);

		assert!(!token.has_expired_at(expires - Duration::seconds(1)));
		assert!(token.has_expired_at(expires));
		assert!(token.has_expired_at(expires + Duration::seconds(1)));
	}

	#[test]
	fn wire_form_round_trips_losslessly() {
		let expires = macros::datetime!(2025-06-01 12:00 UTC);
		let mut token =
			AccessToken::new("access-value").with_refresh_token("refresh-value").with_expires(expires);

		token.values.insert("token_type".into(), serde_json::Value::String("bearer".into()));

		let serialized = token.serialize();
		let restored = AccessToken::from_serialized(&serialized)
			.expect("Serialized token should parse back successfully.");

		assert_eq!(restored.access_token.expose(), "access-value");
		assert_eq!(restored.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-value"));
		assert_eq!(restored.expires, Some(expires));
		assert_eq!(
			restored.values.get("token_type"),
			Some(&serde_json::Value::String("bearer".into()))
		);
	}

	#[test]
	fn deserialization_accepts_relative_expiry() {
		let token = AccessToken::from_serialized(
			"{\"access_token\":\"abc\",\"expires_in\":3600,\"token_type\":\"bearer\"}",
		)
		.expect("Relative expiry payload should parse.");
		let expires = token.expires.expect("Relative expiry should resolve to an instant.");
		let remaining = expires - OffsetDateTime::now_utc();

		assert!(remaining > Duration::minutes(59));
		assert!(remaining <= Duration::hours(1));
	}

	#[test]
	fn invalid_serialized_tokens_yield_none() {
		assert!(AccessToken::from_serialized("").is_none());
		assert!(AccessToken::from_serialized("   ").is_none());
		assert!(AccessToken::from_serialized("{}").is_none());
		assert!(AccessToken::from_serialized("null").is_none());
		assert!(AccessToken::from_serialized("not json").is_none());
		assert!(AccessToken::from_serialized("{\"refresh_token\":\"only\"}").is_none());
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let token = AccessToken::new("access-value").with_refresh_token("refresh-value");
		let rendered = format!("{token:?}");

		assert!(!rendered.contains("access-value"));
		assert!(!rendered.contains("refresh-value"));
		assert!(rendered.contains("<redacted>"));
	}

	#[test]
	fn claims_expose_subject() {
		let claims: ResourceOwnerClaims =
			serde_json::from_str("{\"sub\":\"user-1\",\"email\":\"user@example.com\"}")
				.expect("Claims fixture should parse.");

		assert_eq!(claims.subject(), Some("user-1"));
		assert_eq!(
			claims.get("email").and_then(serde_json::Value::as_str),
			Some("user@example.com")
		);
	}
}
