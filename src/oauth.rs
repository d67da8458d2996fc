//! Wire-level protocol glue between the provider binding and the `oauth2`
//! crate: grant exchanges, raw userinfo/revocation/request-path calls, and
//! the mapping of low-level failures into the crate error taxonomy.

pub use oauth2;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, AuthorizationCode, HttpClientError, HttpRequest, HttpResponse,
	PkceCodeVerifier, RefreshToken, RequestTokenError, ResourceOwnerPassword,
	ResourceOwnerUsername, TokenResponse,
	basic::{BasicRequestTokenError, BasicTokenResponse},
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LOCATION},
	},
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProviderError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::ProviderBinding,
	token::{AccessToken, ResourceOwnerClaims},
};

impl ProviderBinding {
	/// Exchanges an authorization code (plus optional PKCE verifier) for a
	/// token at the provider's token endpoint.
	pub(crate) async fn exchange_code<C>(
		&self,
		code: &str,
		code_verifier: Option<&str>,
		http: &C,
	) -> Result<AccessToken>
	where
		C: TokenHttpClient,
	{
		let meta = ResponseMetadataSlot::default();
		let handle = http.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		if let Some(verifier) = code_verifier {
			request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
		}

		let response = request
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(token_from_response(response))
	}

	/// Performs the resource-owner password-credentials grant.
	pub(crate) async fn exchange_password<C>(
		&self,
		username: &str,
		password: &str,
		http: &C,
	) -> Result<AccessToken>
	where
		C: TokenHttpClient,
	{
		let meta = ResponseMetadataSlot::default();
		let handle = http.with_metadata(meta.clone());
		let username = ResourceOwnerUsername::new(username.to_owned());
		let password = ResourceOwnerPassword::new(password.to_owned());
		let response = self
			.oauth_client
			.exchange_password(&username, &password)
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(token_from_response(response))
	}

	/// Performs the client-credentials grant with no end-user input.
	pub(crate) async fn exchange_client_credentials<C>(&self, http: &C) -> Result<AccessToken>
	where
		C: TokenHttpClient,
	{
		let meta = ResponseMetadataSlot::default();
		let handle = http.with_metadata(meta.clone());
		let response = self
			.oauth_client
			.exchange_client_credentials()
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(token_from_response(response))
	}

	/// Performs the refresh-token grant for the provided refresh credential.
	pub(crate) async fn exchange_refresh<C>(
		&self,
		refresh_token: &str,
		http: &C,
	) -> Result<AccessToken>
	where
		C: TokenHttpClient,
	{
		let meta = ResponseMetadataSlot::default();
		let handle = http.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(meta.take(), err))?;

		Ok(token_from_response(response))
	}

	/// Fetches the authenticated identity's claims with the token as bearer
	/// credential.
	pub(crate) async fn resource_owner<C>(
		&self,
		token: &AccessToken,
		http: &C,
	) -> Result<ResourceOwnerClaims>
	where
		C: TokenHttpClient,
	{
		let endpoint = self
			.settings()
			.userinfo_endpoint
			.clone()
			.ok_or(ConfigError::MissingUserinfoEndpoint)?;
		let request = Request::builder()
			.method(Method::GET)
			.uri(endpoint.as_str())
			.header(AUTHORIZATION, format!("Bearer {}", token.access_token.expose()))
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let response = self.call_raw(http, request).await?;
		let status = response.status().as_u16();

		if !response.status().is_success() {
			return Err(provider_rejection(status, response.body()).into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProviderError::MalformedResponse { source, status: Some(status) }.into())
	}

	/// Revokes the token at the provider's revocation endpoint.
	///
	/// Returns `false` without any wire traffic when no revocation endpoint is
	/// configured. Any received response counts as `true`; its status and body
	/// are not inspected.
	pub(crate) async fn revoke<C>(&self, token: &AccessToken, http: &C) -> Result<bool>
	where
		C: TokenHttpClient,
	{
		let settings = self.settings();
		let Some(endpoint) = settings.revocation_endpoint.clone() else {
			return Ok(false);
		};
		let credentials = STANDARD
			.encode(format!("{}:{}", settings.client_id, settings.client_secret.expose()));
		let body = url::form_urlencoded::Serializer::new(String::new())
			.append_pair("token", token.access_token.expose())
			.finish();
		let request = Request::builder()
			.method(Method::POST)
			.uri(endpoint.as_str())
			.header(AUTHORIZATION, format!("Basic {credentials}"))
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.body(body.into_bytes())
			.map_err(ConfigError::from)?;
		let _response = self.call_raw(http, request).await?;

		Ok(true)
	}

	/// Obtains an authorization code via HTTP Basic authentication against
	/// the authorize endpoint, without a browser redirect.
	///
	/// A response outside 300-399 fails; a redirect whose `Location` carries
	/// no `code` query parameter yields `Ok(None)`.
	pub(crate) async fn request_path_code<C>(
		&self,
		username: &str,
		password: &str,
		http: &C,
	) -> Result<Option<String>>
	where
		C: TokenHttpClient,
	{
		let settings = self.settings();
		let mut url = settings.authorization_endpoint.clone();

		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &settings.client_id)
			.append_pair("scope", &settings.scopes.normalized())
			.append_pair("redirect_uri", settings.redirect_uri.as_str());

		let credentials = STANDARD.encode(format!("{username}:{password}"));
		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, format!("Basic {credentials}"))
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let response = self.call_raw(http, request).await?;
		let status = response.status().as_u16();

		if !(300..400).contains(&status) {
			return Err(ProviderError::UnexpectedStatus { status }.into());
		}

		let Some(location) = response.headers().get(LOCATION) else {
			return Ok(None);
		};
		let Ok(location) = location.to_str() else {
			return Ok(None);
		};
		let target = match Url::parse(location) {
			Ok(target) => target,
			// Relative Location values resolve against the authorize endpoint.
			Err(url::ParseError::RelativeUrlWithoutBase) =>
				match settings.authorization_endpoint.join(location) {
					Ok(target) => target,
					Err(_) => return Ok(None),
				},
			Err(_) => return Ok(None),
		};
		let code = target
			.query_pairs()
			.find(|(key, _)| key == "code")
			.map(|(_, value)| value.into_owned());

		Ok(code)
	}

	async fn call_raw<C>(&self, http: &C, request: HttpRequest) -> Result<HttpResponse>
	where
		C: TokenHttpClient,
	{
		let meta = ResponseMetadataSlot::default();
		let handle = http.with_metadata(meta.clone());

		handle.call(request).await.map_err(|err| map_http_client_error(meta.take(), err))
	}
}

/// Converts a successful token response into the crate's token value object.
pub(crate) fn token_from_response(response: BasicTokenResponse) -> AccessToken {
	let mut token = AccessToken::new(response.access_token().secret().clone());

	if let Some(refresh) = response.refresh_token() {
		token = token.with_refresh_token(refresh.secret().clone());
	}
	if let Some(expires_in) = response.expires_in() {
		let seconds = i64::try_from(expires_in.as_secs()).unwrap_or(i64::MAX);

		token = token.with_expires_in(Duration::seconds(seconds));
	}
	if let Ok(token_type) = serde_json::to_value(response.token_type()) {
		token.values.insert("token_type".into(), token_type);
	}
	if let Some(scopes) = response.scopes() {
		let rendered =
			scopes.iter().map(|scope| scope.as_ref()).collect::<Vec<_>>().join(" ");

		token.values.insert("scope".into(), serde_json::Value::String(rendered));
	}

	token
}

/// Maps `oauth2` token-request failures into the crate taxonomy. Structured
/// OAuth error responses keep the provider's `error`/`error_description`
/// verbatim.
pub(crate) fn map_request_error<E>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.as_ref().and_then(|meta| meta.status);

	match err {
		RequestTokenError::ServerResponse(response) => ProviderError::Rejected {
			error: response.error().as_ref().to_owned(),
			description: response.error_description().cloned(),
			status,
		}
		.into(),
		RequestTokenError::Request(error) => map_http_client_error(meta, error),
		RequestTokenError::Parse(source, _body) =>
			ProviderError::MalformedResponse { source, status }.into(),
		RequestTokenError::Other(message) => ProviderError::Unexpected { message, status }.into(),
	}
}

/// Maps transport-layer failures emitted below the `oauth2` protocol layer.
pub(crate) fn map_http_client_error<E>(
	meta: Option<ResponseMetadata>,
	err: HttpClientError<E>,
) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	let status = meta.as_ref().and_then(|meta| meta.status);

	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => ProviderError::Unexpected { message, status }.into(),
		_ => ProviderError::Unexpected {
			message: "HTTP client error occurred while calling the provider.".into(),
			status,
		}
		.into(),
	}
}

fn provider_rejection(status: u16, body: &[u8]) -> ProviderError {
	#[derive(Deserialize)]
	struct WireError {
		error: String,
		#[serde(default)]
		error_description: Option<String>,
	}

	match serde_json::from_slice::<WireError>(body) {
		Ok(wire) => ProviderError::Rejected {
			error: wire.error,
			description: wire.error_description,
			status: Some(status),
		},
		Err(_) => ProviderError::Unexpected {
			message: "Endpoint rejected the bearer credential.".into(),
			status: Some(status),
		},
	}
}
