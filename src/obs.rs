//! Optional observability helpers for orchestrator flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oidc_conductor.flow` with the `flow`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oidc_conductor_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Orchestrator operations observed as flows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization URL construction (no wire traffic).
	AuthorizationUrl,
	/// Authorization-code grant exchange.
	AuthorizationCode,
	/// Resource-owner password-credentials grant.
	Password,
	/// Client-credentials grant.
	ClientCredentials,
	/// Refresh-token grant triggered by an expired serialized token.
	Refresh,
	/// Request-path authentication workaround.
	RequestPath,
	/// Resource-owner claims resolution.
	ResourceOwner,
	/// Token revocation.
	Revocation,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationUrl => "authorization_url",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Password => "password",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Refresh => "refresh",
			FlowKind::RequestPath => "request_path",
			FlowKind::ResourceOwner => "resource_owner",
			FlowKind::Revocation => "revocation",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an orchestrator operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Reports a refresh rejection through the observability channel.
///
/// The refresh-on-expiry operation maps provider rejections to a `None`
/// result; this is the only place the underlying failure surfaces.
pub(crate) fn report_refresh_rejection(err: &Error) {
	#[cfg(feature = "tracing")]
	::tracing::warn!(error = %err, "Refresh-token grant was rejected; treating the serialized token as invalid.");

	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

/// Reports an expired serialized token that carries no refresh credential.
pub(crate) fn report_unrefreshable_token() {
	#[cfg(feature = "tracing")]
	::tracing::warn!("Serialized token has expired and carries no refresh token; discarding it.");
}
