//! The token-lifecycle orchestrator.
//!
//! [`Conductor`] is the trust boundary between a relying application and a
//! remote identity provider: it builds authorization URLs (running the
//! extension hook first), dispatches among grant types to obtain tokens,
//! transparently renews expired serialized tokens, resolves the authenticated
//! identity, and revokes tokens. Every operation is synchronous
//! request/response: at most one logical unit of work, no queuing, no
//! internal retries. The only shared mutable state is the memoized provider
//! binding, whose first-access construction is guarded so it happens at most
//! once per instance.

// self
use crate::{
	_prelude::*,
	ext::{AuthorizationEvent, AuthorizationHook, AuthorizationOptions, AuthorizationSubscriber,
		RequestContext},
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{ProviderBinding, ProviderFactory},
	settings::{ClientSettings, EffectiveSettings},
	token::{AccessToken, ResourceOwnerClaims},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Conductor specialized for the crate's default reqwest transport.
pub type ReqwestConductor = Conductor<ReqwestHttpClient>;

/// Orchestrates the OAuth2/OIDC token lifecycle against a single provider.
///
/// The conductor owns the settings, the provider factory, the extension hook,
/// and the HTTP transport. The provider binding is constructed lazily on
/// first use and kept for the lifetime of the instance; share a conductor
/// across tasks via `Arc`.
pub struct Conductor<C>
where
	C: TokenHttpClient,
{
	/// Immutable relying-party settings.
	pub settings: ClientSettings,
	factory: Arc<dyn ProviderFactory>,
	hook: AuthorizationHook,
	http_client: Arc<C>,
	binding: AsyncMutex<Option<Arc<ProviderBinding>>>,
	last_state: Mutex<Option<String>>,
}
impl<C> Conductor<C>
where
	C: TokenHttpClient,
{
	/// Creates a conductor that reuses the caller-provided transport.
	pub fn with_http_client(
		settings: ClientSettings,
		factory: Arc<dyn ProviderFactory>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			settings,
			factory,
			hook: AuthorizationHook::default(),
			http_client: http_client.into(),
			binding: AsyncMutex::new(None),
			last_state: Mutex::new(None),
		}
	}

	/// Registers an authorization subscriber; construction-time configuration,
	/// dispatched in registration order.
	pub fn with_subscriber(mut self, subscriber: impl AuthorizationSubscriber + 'static) -> Self {
		self.hook.register(Arc::new(subscriber));

		self
	}

	/// Builds the complete authorization URL for the provided request context
	/// and options.
	///
	/// The event is published to every registered subscriber before the URL is
	/// rendered; subscribers may overwrite options and the last writer wins.
	/// The generated anti-forgery state is retained for [`state`](Self::state).
	/// No network call is performed.
	pub async fn authorization_url(
		&self,
		request: Option<&dyn RequestContext>,
		options: AuthorizationOptions,
	) -> Result<Url> {
		const KIND: FlowKind = FlowKind::AuthorizationUrl;

		let span = FlowSpan::new(KIND, "authorization_url");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut event = AuthorizationEvent::new(request, &self.settings, options);

				self.hook.dispatch(&mut event);

				let options = event.into_options();
				let binding = self.provider().await?;
				let (url, state) = binding.authorization_url(&options);

				*self.last_state.lock() = Some(state);

				Ok(url)
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Returns the anti-forgery state generated by the most recent
	/// [`authorization_url`](Self::authorization_url) call on this instance,
	/// or `None` if no URL has been built yet.
	///
	/// Correlating the state across the redirect boundary (typically via
	/// session storage) is the caller's responsibility.
	pub fn state(&self) -> Option<String> {
		self.last_state.lock().clone()
	}

	/// Obtains an access token using either the authorization-code grant or
	/// the resource-owner password-credentials grant.
	///
	/// With `password` absent, `code_or_username` is treated as an
	/// authorization code and `code_verifier` (PKCE) is forwarded when
	/// supplied. With `password` present, the password grant is used and
	/// `code_verifier` is ignored. Authorization codes are single-use;
	/// failures are never retried here.
	pub async fn access_token(
		&self,
		code_or_username: &str,
		password: Option<&str>,
		code_verifier: Option<&str>,
	) -> Result<AccessToken> {
		let kind =
			if password.is_some() { FlowKind::Password } else { FlowKind::AuthorizationCode };
		let span = FlowSpan::new(kind, "access_token");

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let binding = self.provider().await?;

				match password {
					Some(password) =>
						binding
							.exchange_password(
								code_or_username,
								password,
								self.http_client.as_ref(),
							)
							.await,
					None =>
						binding
							.exchange_code(
								code_or_username,
								code_verifier,
								self.http_client.as_ref(),
							)
							.await,
				}
			})
			.await;

		record_result(kind, &result);

		result
	}

	/// Obtains an access token via the client-credentials grant, with no
	/// end-user input.
	pub async fn access_token_for_client(&self) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "access_token_for_client");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let binding = self.provider().await?;

				binding.exchange_client_credentials(self.http_client.as_ref()).await
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Obtains an access token by authenticating directly against the
	/// authorize endpoint with HTTP Basic credentials, without a browser
	/// redirect.
	///
	/// The authorize endpoint must answer with a 3xx redirect; any other
	/// status is an error. A redirect whose `Location` carries no `code`
	/// query parameter yields `Ok(None)`, a legitimate "no code issued"
	/// outcome distinct from a protocol failure.
	pub async fn access_token_with_request_path_authentication(
		&self,
		username: &str,
		password: &str,
	) -> Result<Option<AccessToken>> {
		const KIND: FlowKind = FlowKind::RequestPath;

		let span = FlowSpan::new(KIND, "access_token_with_request_path_authentication");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let binding = self.provider().await?;
				let Some(code) = binding
					.request_path_code(username, password, self.http_client.as_ref())
					.await?
				else {
					return Ok(None);
				};

				binding.exchange_code(&code, None, self.http_client.as_ref()).await.map(Some)
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Validates a serialized token and transparently renews it when expired.
	///
	/// Returns `Ok(None)` when the input does not parse into a usable token,
	/// when the expired token carries no refresh credential, or when the
	/// provider rejects the refresh grant (the rejection surfaces only through
	/// the observability channel). An unexpired token round-trips unchanged
	/// with no network call. On a successful refresh the newly issued token is
	/// returned; if the provider omitted a new refresh token, the original one
	/// is carried forward so the result stays renewable.
	pub async fn fresh_access_token(&self, serialized: &str) -> Result<Option<AccessToken>> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "fresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let Some(token) = AccessToken::from_serialized(serialized) else {
					return Ok(None);
				};

				if !token.has_expired() {
					return Ok(Some(token));
				}

				let Some(refresh) = token.refresh_token.clone() else {
					obs::report_unrefreshable_token();

					return Ok(None);
				};
				let binding = self.provider().await?;

				match binding.exchange_refresh(refresh.expose(), self.http_client.as_ref()).await
				{
					Ok(mut fresh) => {
						if fresh.refresh_token.is_none() {
							fresh.refresh_token = Some(refresh);
						}

						Ok(Some(fresh))
					},
					Err(err @ Error::Provider(_)) => {
						obs::report_refresh_rejection(&err);

						Ok(None)
					},
					Err(err) => Err(err),
				}
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Fetches the authenticated identity's claims using the token as bearer
	/// credential.
	pub async fn resource_owner(&self, token: &AccessToken) -> Result<ResourceOwnerClaims> {
		const KIND: FlowKind = FlowKind::ResourceOwner;

		let span = FlowSpan::new(KIND, "resource_owner");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let binding = self.provider().await?;

				binding.resource_owner(token, self.http_client.as_ref()).await
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Invalidates the token at the provider's revocation endpoint.
	///
	/// Returns `Ok(false)` immediately, with no network call, when no
	/// revocation endpoint is configured. Otherwise returns `Ok(true)` for
	/// any received response; the response itself is not validated.
	pub async fn revoke_token(&self, token: &AccessToken) -> Result<bool> {
		const KIND: FlowKind = FlowKind::Revocation;

		let span = FlowSpan::new(KIND, "revoke_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if self.settings.revocation_endpoint.is_none() {
					return Ok(false);
				}

				let binding = self.provider().await?;

				binding.revoke(token, self.http_client.as_ref()).await
			})
			.await;

		record_result(KIND, &result);

		result
	}

	/// Returns the memoized provider binding, constructing it on first access.
	///
	/// Construction resolves the effective redirect URI and invokes the
	/// injected factory; the guard ensures at most one construction even when
	/// the conductor is shared across concurrent callers. There is no
	/// transition back to the unbound state.
	async fn provider(&self) -> Result<Arc<ProviderBinding>> {
		let mut slot = self.binding.lock().await;

		if let Some(binding) = slot.as_ref() {
			return Ok(binding.clone());
		}

		let effective = EffectiveSettings::resolve(&self.settings)?;
		let binding = Arc::new(self.factory.create(&effective)?);

		*slot = Some(binding.clone());

		Ok(binding)
	}
}
#[cfg(feature = "reqwest")]
impl Conductor<ReqwestHttpClient> {
	/// Creates a conductor with the crate's default reqwest transport.
	///
	/// The transport is built with redirect following disabled, which the
	/// request-path authentication workaround requires. Fails only when the
	/// HTTP client cannot be constructed.
	pub fn new(settings: ClientSettings, factory: Arc<dyn ProviderFactory>) -> Result<Self> {
		Ok(Self::with_http_client(settings, factory, ReqwestHttpClient::new()?))
	}
}
impl<C> Debug for Conductor<C>
where
	C: TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Conductor")
			.field("settings", &self.settings)
			.field("hook", &self.hook)
			.field("bound", &self.binding.try_lock().map(|slot| slot.is_some()))
			.finish()
	}
}

fn record_result<T>(kind: FlowKind, result: &Result<T>) {
	match result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(kind, FlowOutcome::Failure),
	}
}
