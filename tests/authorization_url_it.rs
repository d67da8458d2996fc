#![cfg(feature = "reqwest")]

// self
use oidc_conductor::{
	_preludet::*,
	ext::{AuthorizationEvent, AuthorizationOptions, SetLanguageSubscriber},
	settings::{ClientSettings, ScopeSet},
};

const CLIENT_ID: &str = "client-auth-url";
const CLIENT_SECRET: &str = "secret-auth-url";

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse fixture URL.")
}

fn settings() -> ClientSettings {
	ClientSettings::new(
		CLIENT_ID,
		CLIENT_SECRET,
		url("https://idp.example.com/authorize"),
		url("https://idp.example.com/token"),
	)
	.with_scopes(ScopeSet::new(["openid", "profile"]).expect("Scope fixture should be valid."))
	.with_redirect_uri(url("https://rp.example.com/callback"))
}

fn query(auth_url: &Url) -> BTreeMap<String, String> {
	auth_url.query_pairs().map(|(key, value)| (key.into_owned(), value.into_owned())).collect()
}

#[tokio::test]
async fn authorization_url_carries_defaults_and_retains_state() {
	let conductor = build_reqwest_test_conductor(settings());
	let auth_url = conductor
		.authorization_url(None, AuthorizationOptions::new())
		.await
		.expect("Authorization URL should build from valid settings.");
	let params = query(&auth_url);

	assert!(auth_url.as_str().starts_with("https://idp.example.com/authorize?"));
	assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
	assert_eq!(params.get("client_id").map(String::as_str), Some(CLIENT_ID));
	assert_eq!(
		params.get("redirect_uri").map(String::as_str),
		Some("https://rp.example.com/callback")
	);
	assert_eq!(params.get("scope").map(String::as_str), Some("openid profile"));

	let state = conductor.state().expect("State should be retained after building the URL.");

	assert_eq!(params.get("state"), Some(&state));
}

#[tokio::test]
async fn state_tracks_the_most_recent_url() {
	let conductor = build_reqwest_test_conductor(settings());

	assert!(conductor.state().is_none());

	let first_url = conductor
		.authorization_url(None, AuthorizationOptions::new())
		.await
		.expect("First authorization URL should build.");
	let first_state = conductor.state().expect("State should exist after the first URL.");
	let second_url = conductor
		.authorization_url(None, AuthorizationOptions::new())
		.await
		.expect("Second authorization URL should build.");
	let second_state = conductor.state().expect("State should exist after the second URL.");

	assert_ne!(first_state, second_state);
	assert_eq!(query(&first_url).get("state"), Some(&first_state));
	assert_eq!(query(&second_url).get("state"), Some(&second_state));
}

#[tokio::test]
async fn subscribers_mutate_options_in_registration_order() {
	let conductor = build_reqwest_test_conductor(settings())
		.with_subscriber(|event: &mut AuthorizationEvent| {
			event.set_option("prompt", "login");
		})
		.with_subscriber(|event: &mut AuthorizationEvent| {
			event.set_option("prompt", "consent");
		});
	let auth_url = conductor
		.authorization_url(None, AuthorizationOptions::new())
		.await
		.expect("Authorization URL should build with subscribers registered.");
	let params = query(&auth_url);

	assert_eq!(params.get("prompt").map(String::as_str), Some("consent"));
}

#[tokio::test]
async fn language_subscriber_defaults_to_english_without_a_request() {
	let conductor =
		build_reqwest_test_conductor(settings().with_language_parameter("ui_locales"))
			.with_subscriber(SetLanguageSubscriber);
	let auth_url = conductor
		.authorization_url(None, AuthorizationOptions::new())
		.await
		.expect("Authorization URL should build with the language subscriber.");

	assert_eq!(query(&auth_url).get("ui_locales").map(String::as_str), Some("en"));
}

#[tokio::test]
async fn caller_options_overwrite_defaults() {
	let conductor = build_reqwest_test_conductor(settings());
	let options = AuthorizationOptions::from([("scope".to_owned(), "email".to_owned())]);
	let auth_url = conductor
		.authorization_url(None, options)
		.await
		.expect("Authorization URL should honor caller options.");

	assert_eq!(query(&auth_url).get("scope").map(String::as_str), Some("email"));
}

#[tokio::test]
async fn missing_redirect_sources_fail_fast() {
	let settings = ClientSettings::new(
		CLIENT_ID,
		CLIENT_SECRET,
		url("https://idp.example.com/authorize"),
		url("https://idp.example.com/token"),
	);
	let conductor = build_reqwest_test_conductor(settings);
	let err = conductor
		.authorization_url(None, AuthorizationOptions::new())
		.await
		.expect_err("Building a URL without a redirect source must fail.");

	assert!(matches!(err, Error::Config(_)));
}
