//! OAuth 2.0 client configuration and the token-endpoint facade.
//!
//! [`OAuth2Config`] carries client credentials and endpoint URLs. [`OAuth2Client`] wraps the
//! `oauth2` crate with the crate's instrumented reqwest transport and exposes the two exchanges
//! the authenticator needs: authorization code for token, and refresh token for token. Failures
//! are classified into the crate's [`Error`] taxonomy using the OAuth `error` field first, the
//! `error_description` next, and the HTTP status last.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	context::Context,
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::{self, FlowKind},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

const STATE_LEN: usize = 32;

/// Grants performed against the token endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// `authorization_code` grant.
	AuthorizationCode,
	/// `refresh_token` grant.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 grant identifier.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How client credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Authorization and token endpoint URLs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Endpoint {
	/// Authorization endpoint users are redirected to.
	pub auth_url: String,
	/// Token endpoint used for code exchanges and refreshes.
	pub token_url: String,
}

/// Immutable OAuth 2.0 client configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Config {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret; empty for public clients.
	#[serde(default)]
	pub client_secret: String,
	/// Provider endpoints.
	pub endpoint: OAuth2Endpoint,
	/// Redirect URI registered with the provider, if any.
	#[serde(default)]
	pub redirect_url: Option<String>,
	/// Scopes requested on the authorization URL.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Client authentication method for the token endpoint.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
}
impl OAuth2Config {
	/// Creates a configuration with empty endpoints.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			endpoint: OAuth2Endpoint::default(),
			redirect_url: None,
			scopes: Vec::new(),
			client_auth_method: ClientAuthMethod::default(),
		}
	}

	/// Sets the authorization endpoint URL.
	pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
		self.endpoint.auth_url = url.into();

		self
	}

	/// Sets the token endpoint URL.
	pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
		self.endpoint.token_url = url.into();

		self
	}

	/// Sets the redirect URI.
	pub fn with_redirect_url(mut self, url: impl Into<String>) -> Self {
		self.redirect_url = Some(url.into());

		self
	}

	/// Replaces the requested scopes.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Selects how client credentials reach the token endpoint.
	pub fn with_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Builds the URL that starts the authorization-code grant for the provided `state`.
	pub fn authorization_url(&self, state: &str) -> Result<Url> {
		let mut url = Url::parse(&self.endpoint.auth_url)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.client_id);

		if let Some(redirect) = &self.redirect_url {
			pairs.append_pair("redirect_uri", redirect);
		}
		if !self.scopes.is_empty() {
			pairs.append_pair("scope", &self.scopes.join(" "));
		}

		pairs.append_pair("state", state);

		drop(pairs);

		Ok(url)
	}
}
impl Debug for OAuth2Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Config")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("endpoint", &self.endpoint)
			.field("redirect_url", &self.redirect_url)
			.field("scopes", &self.scopes)
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

/// Authorization redirect prepared for an end-user, paired with its anti-forgery `state`.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Authorization URL the user should visit.
	pub url: Url,
}
impl AuthorizationRequest {
	/// Generates a random `state` and the matching authorization URL.
	pub fn new(config: &OAuth2Config) -> Result<Self> {
		let state = random_state(STATE_LEN);
		let url = config.authorization_url(&state)?;

		Ok(Self { state, url })
	}

	/// Validates the `state` returned on the redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch.".into() })
		}
	}
}

/// Token-endpoint facade bound to one client configuration and HTTP client.
pub struct OAuth2Client {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl OAuth2Client {
	/// Validates `config` and binds it to `http_client`.
	pub fn new(config: &OAuth2Config, http_client: ReqwestHttpClient) -> Result<Self> {
		let auth_url = AuthUrl::new(config.endpoint.auth_url.clone())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoint.token_url.clone())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if !config.client_secret.is_empty() {
			oauth_client =
				oauth_client.set_client_secret(ClientSecret::new(config.client_secret.clone()));
		}
		if let Some(redirect) = &config.redirect_url {
			let redirect_url = RedirectUrl::new(redirect.clone())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;

			oauth_client = oauth_client.set_redirect_uri(redirect_url);
		}
		if matches!(config.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges a one-time authorization code for a token pair.
	pub async fn exchange(&self, ctx: &Context, code: &str) -> Result<TokenRecord> {
		obs::observe(
			FlowKind::Exchange,
			"oauth2_client.exchange",
			ctx.run(async {
				let meta = ResponseMetadataSlot::default();
				let instrumented = self.http_client.instrumented(meta.clone());
				let response = self
					.oauth_client
					.exchange_code(AuthorizationCode::new(code.to_owned()))
					.request_async(&instrumented)
					.await
					.map_err(|e| map_request_error(GrantType::AuthorizationCode, meta.take(), e))?;

				map_token_response(response)
			}),
		)
		.await
	}

	/// Redeems `refresh_token` for a fresh access token.
	///
	/// The returned record carries whatever refresh token the provider sent back, which may be
	/// none; callers decide whether to keep the previous one.
	pub async fn refresh(&self, ctx: &Context, refresh_token: &str) -> Result<TokenRecord> {
		obs::observe(
			FlowKind::Refresh,
			"oauth2_client.refresh",
			ctx.run(async {
				let meta = ResponseMetadataSlot::default();
				let instrumented = self.http_client.instrumented(meta.clone());
				let refresh_secret = RefreshToken::new(refresh_token.to_owned());
				let response = self
					.oauth_client
					.exchange_refresh_token(&refresh_secret)
					.request_async(&instrumented)
					.await
					.map_err(|e| map_request_error(GrantType::RefreshToken, meta.take(), e))?;

				map_token_response(response)
			}),
		)
		.await
	}
}
impl Debug for OAuth2Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client").finish_non_exhaustive()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ErrorKind {
	InvalidGrant,
	InvalidClient,
	InsufficientScope,
	Transient,
}

fn random_state(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn map_token_response(response: BasicTokenResponse) -> Result<TokenRecord> {
	let issued_at = OffsetDateTime::now_utc();
	let mut builder = TokenRecord::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(AsRef::<str>::as_ref(response.token_type()))
		.issued_at(issued_at);

	// A zero `expires_in` means the provider did not bound the token's lifetime.
	if let Some(expires_in) = response.expires_in().filter(|value| !value.is_zero()) {
		let secs =
			i64::try_from(expires_in.as_secs()).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

		builder = builder.expires_in(Duration::seconds(secs));
	}
	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}
	if let Some(scopes) = response.scopes() {
		builder = builder.scopes(scopes.iter().map(|scope| scope.to_string()));
	}

	builder.build().map_err(|e| ConfigError::from(e).into())
}

fn map_request_error(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(grant, response, meta_ref),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message: format!("{grant} grant failed: {message}"),
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref();
	let description = response.error_description().map(String::as_str);
	let message = match description {
		Some(description) => format!("{grant} grant returned {code}: {description}"),
		None => format!("{grant} grant returned {code}"),
	};

	match classify_token_error(code, description, meta_status(meta)) {
		ErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_transport_error(meta: Option<&ResponseMetadata>, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the token endpoint".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn classify_token_error(code: &str, description: Option<&str>, status: Option<u16>) -> ErrorKind {
	match_exact_value(code)
		.or_else(|| description.and_then(match_exact_value))
		.or_else(|| description.and_then(classify_text))
		.unwrap_or_else(|| classify_status(status))
}

fn match_exact_value(value: &str) -> Option<ErrorKind> {
	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(ErrorKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(ErrorKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(ErrorKind::InsufficientScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(ErrorKind::Transient)
	} else {
		None
	}
}

fn classify_text(text: &str) -> Option<ErrorKind> {
	let lowered = text.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") => Some(ErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") => Some(ErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ErrorKind {
	match status {
		Some(400 | 404 | 410) => ErrorKind::InvalidGrant,
		Some(401) => ErrorKind::InvalidClient,
		Some(403) => ErrorKind::InsufficientScope,
		_ => ErrorKind::Transient,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn config() -> OAuth2Config {
		OAuth2Config::new("client-id", "secret")
			.with_auth_url("https://example.com/oauth2/authorize")
			.with_token_url("https://example.com/oauth2/token")
	}

	#[test]
	fn builds_basic_and_post_clients() {
		assert!(OAuth2Client::new(&config(), ReqwestHttpClient::default()).is_ok());
		assert!(
			OAuth2Client::new(
				&config()
					.with_client_auth_method(ClientAuthMethod::ClientSecretPost)
					.with_redirect_url("https://app.example.com/callback"),
				ReqwestHttpClient::default(),
			)
			.is_ok()
		);
	}

	#[test]
	fn rejects_invalid_endpoints() {
		let err = OAuth2Client::new(&config().with_token_url("not a url"), ReqwestHttpClient::default())
			.expect_err("Token endpoint must parse.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidEndpoint { endpoint: "token", .. })));

		let err = OAuth2Client::new(&config().with_redirect_url("::"), ReqwestHttpClient::default())
			.expect_err("Redirect URI must parse.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidRedirect { .. })));
	}

	#[test]
	fn authorization_url_carries_grant_parameters() {
		let config = config()
			.with_redirect_url("https://app.example.com/callback")
			.with_scopes(["profile", "email"]);
		let request = AuthorizationRequest::new(&config).expect("Authorization URL should build.");
		let pairs: HashMap<_, _> = request.url.query_pairs().into_owned().collect();

		assert_eq!(request.state.len(), STATE_LEN);
		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&"client-id".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&"https://app.example.com/callback".into()));
		assert_eq!(pairs.get("scope"), Some(&"profile email".into()));
		assert_eq!(pairs.get("state"), Some(&request.state));
		assert!(request.validate_state(&request.state).is_ok());
		assert!(matches!(request.validate_state("forged"), Err(Error::InvalidGrant { .. })));
	}

	#[test]
	fn classification_prefers_oauth_fields_then_status() {
		assert_eq!(classify_token_error("invalid_grant", None, Some(500)), ErrorKind::InvalidGrant);
		assert_eq!(classify_token_error("unauthorized_client", None, None), ErrorKind::InvalidClient);
		assert_eq!(
			classify_token_error("custom", Some("invalid_grant: code already used"), Some(500)),
			ErrorKind::InvalidGrant
		);
		assert_eq!(classify_token_error("custom", None, Some(403)), ErrorKind::InsufficientScope);
		assert_eq!(classify_token_error("custom", None, Some(503)), ErrorKind::Transient);
	}

	#[test]
	fn debug_hides_client_secret() {
		let rendered = format!("{:?}", config());

		assert!(!rendered.contains("\"secret\""));
		assert!(rendered.contains("client_secret_set: true"));
	}
}
