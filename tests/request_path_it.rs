#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use oidc_conductor::{
	_preludet::*,
	error::ProviderError,
	settings::{ClientSettings, ScopeSet},
};

const CLIENT_ID: &str = "client-request-path";
const CLIENT_SECRET: &str = "secret-request-path";

fn settings(server: &MockServer) -> ClientSettings {
	ClientSettings::new(
		CLIENT_ID,
		CLIENT_SECRET,
		Url::parse(&server.url("/authorize")).expect("Mock authorize endpoint should parse."),
		Url::parse(&server.url("/token")).expect("Mock token endpoint should parse."),
	)
	.with_scopes(ScopeSet::new(["openid"]).expect("Scope fixture should be valid."))
	.with_redirect_uri(
		Url::parse("https://rp.example.com/callback").expect("Redirect fixture should parse."),
	)
}

#[tokio::test]
async fn redirect_with_code_completes_the_exchange() {
	let server = MockServer::start_async().await;
	let conductor = build_reqwest_test_conductor(settings(&server));
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/authorize").query_param("response_type", "code");
			then.status(302)
				.header("location", "https://rp.example.com/callback?code=rp-code&state=xyz");
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=rp-code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-rp\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let token = conductor
		.access_token_with_request_path_authentication("alice", "wonderland")
		.await
		.expect("Request-path authentication should succeed.")
		.expect("A code-carrying redirect should yield a token.");

	authorize_mock.assert_async().await;
	token_mock.assert_async().await;

	assert_eq!(token.access_token.expose(), "access-rp");
}

#[tokio::test]
async fn redirect_without_code_yields_none() {
	let server = MockServer::start_async().await;
	let conductor = build_reqwest_test_conductor(settings(&server));
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/authorize");
			then.status(302).header(
				"location",
				"https://rp.example.com/callback?error=access_denied&state=xyz",
			);
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200);
		})
		.await;
	let result = conductor
		.access_token_with_request_path_authentication("alice", "wrong")
		.await
		.expect("A redirect without a code is an absence, not an error.");

	authorize_mock.assert_async().await;
	token_mock.assert_calls_async(0).await;

	assert!(result.is_none());
}

#[tokio::test]
async fn relative_redirect_targets_are_resolved() {
	let server = MockServer::start_async().await;
	let conductor = build_reqwest_test_conductor(settings(&server));
	let _authorize_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/authorize");
			then.status(303).header("location", "/callback?code=relative-code");
		})
		.await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("code=relative-code");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-relative\",\"token_type\":\"bearer\"}",
			);
		})
		.await;
	let token = conductor
		.access_token_with_request_path_authentication("alice", "wonderland")
		.await
		.expect("Relative Location values should resolve against the authorize endpoint.")
		.expect("The resolved redirect should yield a token.");

	token_mock.assert_async().await;

	assert_eq!(token.access_token.expose(), "access-relative");
}

#[tokio::test]
async fn non_redirect_statuses_are_protocol_failures() {
	let server = MockServer::start_async().await;
	let conductor = build_reqwest_test_conductor(settings(&server));
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/authorize");
			then.status(200).body("<html>login form</html>");
		})
		.await;
	let err = conductor
		.access_token_with_request_path_authentication("alice", "wonderland")
		.await
		.expect_err("A non-redirect response must fail the workaround.");

	authorize_mock.assert_async().await;

	assert!(matches!(
		err,
		Error::Provider(ProviderError::UnexpectedStatus { status: 200 })
	));
}
