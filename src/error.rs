//! Orchestrator error taxonomy shared across every exposed operation.
//!
//! Three classes exist: [`ConfigError`] for fatal local misconfiguration,
//! [`ProviderError`] for protocol steps the remote provider rejected, and
//! [`TransportError`] for network/IO failures below the protocol. Legitimate
//! absence (invalid serialized token, no revocation endpoint, a redirect
//! without a code) is modeled as `Option`/`bool` return values, never as an
//! error.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal, surfaced at first use.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Remote provider rejected a protocol step; never retried automatically.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Transport failure (DNS, TCP, TLS, IO).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Configuration and validation failures raised before any wire traffic.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured endpoint URL was rejected by the OAuth client layer.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// No redirect URI was configured and no site URL exists to derive one.
	#[error("No redirect URI is configured and no site URL is available to derive one.")]
	MissingRedirectUri,
	/// Resource-owner resolution was requested without a userinfo endpoint.
	#[error("No userinfo endpoint is configured.")]
	MissingUserinfoEndpoint,
	/// Configured scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::settings::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures reported by the remote provider for a protocol step.
#[derive(Debug, ThisError)]
pub enum ProviderError {
	/// Provider returned a structured OAuth error response.
	///
	/// The `error` and `description` fields carry the provider's
	/// `error`/`error_description` values verbatim for the caller to inspect.
	#[error("Provider rejected the request: {error}.")]
	Rejected {
		/// OAuth `error` code as returned by the provider.
		error: String,
		/// OAuth `error_description`, when the provider supplied one.
		description: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Endpoint answered with a status outside the accepted range.
	///
	/// Raised by the request-path authentication workaround when the authorize
	/// endpoint responds with anything outside 300-399.
	#[error("Endpoint responded with unexpected HTTP status {status}.")]
	UnexpectedStatus {
		/// HTTP status code of the offending response.
		status: u16,
	},
	/// Provider responded with a payload that could not be decoded.
	#[error("Provider returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Provider behaved in a way the protocol layer could not interpret.
	#[error("Provider returned an unexpected response: {message}.")]
	Unexpected {
		/// Summary of the unexpected behavior.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
