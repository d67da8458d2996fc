//! Authorization-request extension hook.
//!
//! Before the authorization URL is rendered, the orchestrator publishes an
//! [`AuthorizationEvent`] to every registered [`AuthorizationSubscriber`],
//! synchronously and in registration order. Subscribers read the inbound
//! request context and the settings, and may overwrite option entries; the
//! last writer wins. Registration is construction-time configuration, not a
//! runtime API. Subscribers must be idempotent and side-effect-free beyond
//! mutating the options.

// self
use crate::{_prelude::*, settings::ClientSettings};

/// Mapping of authorization-request parameter names to values.
pub type AuthorizationOptions = BTreeMap<String, String>;

/// Opaque, read-only view of the inbound request that triggered the
/// authorization flow.
///
/// Only locale-derived attributes are consulted; the context is never
/// mutated. Implementations bridge whatever request/session abstraction the
/// host application uses.
pub trait RequestContext: Send + Sync {
	/// Human language code (e.g. `"de"`) resolved from the request's
	/// site/locale context, when one is available.
	fn language_code(&self) -> Option<String>;
}

/// Per-call event published while building an authorization URL.
///
/// Created for each `authorization_url` call, dispatched to the subscribers,
/// and discarded once the URL is built. Never persisted.
pub struct AuthorizationEvent<'a> {
	request: Option<&'a dyn RequestContext>,
	settings: &'a ClientSettings,
	options: AuthorizationOptions,
}
impl<'a> AuthorizationEvent<'a> {
	/// Creates an event from the caller-supplied context and options.
	pub fn new(
		request: Option<&'a dyn RequestContext>,
		settings: &'a ClientSettings,
		options: AuthorizationOptions,
	) -> Self {
		Self { request, settings, options }
	}

	/// Inbound request context, if the caller supplied one.
	pub fn request(&self) -> Option<&dyn RequestContext> {
		self.request
	}

	/// Immutable settings in effect for this call.
	pub fn settings(&self) -> &ClientSettings {
		self.settings
	}

	/// Read access to the current options.
	pub fn options(&self) -> &AuthorizationOptions {
		&self.options
	}

	/// Mutable access to the options; later writes win.
	pub fn options_mut(&mut self) -> &mut AuthorizationOptions {
		&mut self.options
	}

	/// Sets a single option, replacing any previous value.
	pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.options.insert(key.into(), value.into());
	}

	pub(crate) fn into_options(self) -> AuthorizationOptions {
		self.options
	}
}
impl Debug for AuthorizationEvent<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationEvent")
			.field("has_request", &self.request.is_some())
			.field("options", &self.options)
			.finish()
	}
}

/// Subscriber invoked for every authorization URL being built.
pub trait AuthorizationSubscriber: Send + Sync {
	/// Handles the event, typically by mutating its options.
	fn handle(&self, event: &mut AuthorizationEvent);
}
impl<F> AuthorizationSubscriber for F
where
	F: Fn(&mut AuthorizationEvent) + Send + Sync,
{
	fn handle(&self, event: &mut AuthorizationEvent) {
		self(event)
	}
}

/// Registered subscriber list with synchronous in-order dispatch.
#[derive(Clone, Default)]
pub struct AuthorizationHook {
	subscribers: Vec<Arc<dyn AuthorizationSubscriber>>,
}
impl AuthorizationHook {
	/// Appends a subscriber; dispatch order equals registration order.
	pub fn register(&mut self, subscriber: Arc<dyn AuthorizationSubscriber>) {
		self.subscribers.push(subscriber);
	}

	/// Publishes the event to every subscriber, in registration order.
	pub fn dispatch(&self, event: &mut AuthorizationEvent) {
		for subscriber in &self.subscribers {
			subscriber.handle(event);
		}
	}
}
impl Debug for AuthorizationHook {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationHook").field("subscribers", &self.subscribers.len()).finish()
	}
}

/// Canonical subscriber localizing the authorization prompt.
///
/// When the settings configure a language parameter name, the subscriber sets
/// that option to the request's language code, defaulting to `"en"` when no
/// request context or locale is available. No-op otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct SetLanguageSubscriber;
impl SetLanguageSubscriber {
	const DEFAULT_LANGUAGE: &'static str = "en";
}
impl AuthorizationSubscriber for SetLanguageSubscriber {
	fn handle(&self, event: &mut AuthorizationEvent) {
		let Some(parameter) = event.settings().language_parameter.clone() else {
			return;
		};
		let language = event
			.request()
			.and_then(RequestContext::language_code)
			.unwrap_or_else(|| Self::DEFAULT_LANGUAGE.into());

		event.set_option(parameter, language);
	}
}
