//! Request executor that issues one HTTP call as an (optionally authenticated) user.

// crates.io
use reqwest::{Request, Response};
// self
use crate::{
	_prelude::*,
	auth::User,
	authenticator::{Authenticator, DefaultAuthenticator},
	context::Context,
	error::{ConfigError, TransportError},
	http::ReqwestHttpClient,
};

/// Timeout applied by [`Config::default`], in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Requester configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// Per-request timeout of the base HTTP client, in seconds; must be greater than zero.
	///
	/// An omitted field deserializes to zero and is rejected by [`Requester::new`].
	#[serde(default)]
	pub timeout: u64,
}
impl Default for Config {
	fn default() -> Self {
		Self { timeout: DEFAULT_TIMEOUT_SECS }
	}
}

/// Executes requests through the authenticator chosen per call.
///
/// Every call performs exactly one request/response cycle; nothing is retried.
#[derive(Clone, Debug)]
pub struct Requester {
	config: Config,
	http: ReqwestHttpClient,
	default_authenticator: DefaultAuthenticator,
}
impl Requester {
	/// Builds the base HTTP client from `config`.
	///
	/// A zero timeout is rejected with [`ConfigError::MissingTimeout`].
	pub fn new(config: Config) -> Result<Self> {
		if config.timeout == 0 {
			return Err(ConfigError::MissingTimeout.into());
		}

		let http = ReqwestHttpClient::with_timeout(StdDuration::from_secs(config.timeout))?;
		let default_authenticator = DefaultAuthenticator::new(http.clone());

		Ok(Self { config, http, default_authenticator })
	}

	/// Configuration the requester was built with.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Base HTTP client; bind authenticators to it so every call shares one timeout.
	pub fn http_client(&self) -> &ReqwestHttpClient {
		&self.http
	}

	/// Sends `request` as `user`, returning the raw response.
	///
	/// Without an `authenticator` the request goes out through the base client untouched.
	pub async fn send(
		&self,
		ctx: &Context,
		request: Request,
		user: Option<Arc<dyn User>>,
		authenticator: Option<&dyn Authenticator>,
	) -> Result<Response> {
		let authenticator = authenticator.unwrap_or(&self.default_authenticator);
		let client = authenticator.authenticated_client(ctx, user).await?;

		client.execute(ctx, request).await
	}

	/// Sends `request` as `user` and decodes the JSON response body into `out`.
	///
	/// An empty (or whitespace-only) body is a success that leaves `out` untouched, so endpoints
	/// replying without content can share this path. Passing `None` discards the body.
	pub async fn do_request<T>(
		&self,
		ctx: &Context,
		request: Request,
		out: Option<&mut T>,
		user: Option<Arc<dyn User>>,
		authenticator: Option<&dyn Authenticator>,
	) -> Result<()>
	where
		T: DeserializeOwned,
	{
		let response = self.send(ctx, request, user, authenticator).await?;
		let body = ctx
			.run(async { response.bytes().await.map_err(|e| Error::from(TransportError::from(e))) })
			.await?;
		let Some(out) = out else {
			return Ok(());
		};

		if body.iter().all(u8::is_ascii_whitespace) {
			return Ok(());
		}

		*out = decode_json(&body)?;

		Ok(())
	}
}

fn decode_json<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(Error::Decode)
}
