//! Transport primitives shared by token exchanges and authenticated requests.
//!
//! [`ReqwestHttpClient`] is the single HTTP stack the crate depends on. Token exchanges borrow
//! it through an instrumented [`AsyncHttpClient`] handle that publishes [`ResponseMetadata`]
//! into a [`ResponseMetadataSlot`] so error mapping can report status codes and Retry-After
//! hints. Authenticated requests go through [`AuthorizedClient`], which attaches the current
//! token from its [`TokenSource`] to every outgoing request.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::{
	Request, Response,
	header::{AUTHORIZATION, HeaderMap, HeaderValue, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	context::Context,
	error::{ConfigError, TransportError},
	obs::{self, FlowKind},
	source::TokenSource,
};

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
///
/// A fresh slot is created for each token request and read immediately after `oauth2`
/// resolves.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The same client (and therefore the same TLS and timeout configuration) is used for the
/// token endpoint and for the requests issued on behalf of users.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that fails any request taking longer than `timeout`.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		Ok(Self(ReqwestClient::builder().timeout(timeout).build()?))
	}

	/// Builds an instrumented handle that captures response metadata into `slot`.
	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Instrumented adapter that implements [`AsyncHttpClient`] for reqwest.
pub(crate) struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle passed to `oauth2` token requests.
#[derive(Clone)]
pub(crate) struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient { client, slot }))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// HTTP client handed out by authenticators.
///
/// Without a token source it forwards requests untouched; with one it resolves a token for
/// every request (refreshing and persisting it when the source decides to) and sets the
/// `Authorization` header before dispatching.
#[derive(Clone)]
pub struct AuthorizedClient {
	http: ReqwestClient,
	source: Option<Arc<dyn TokenSource>>,
}
impl AuthorizedClient {
	/// Creates a client that sends requests without credentials.
	pub fn unauthenticated(http: ReqwestClient) -> Self {
		Self { http, source: None }
	}

	/// Creates a client that authorizes every request with tokens from `source`.
	pub fn with_token_source(http: ReqwestClient, source: Arc<dyn TokenSource>) -> Self {
		Self { http, source: Some(source) }
	}

	/// Returns `true` if requests will carry credentials.
	pub fn is_authenticated(&self) -> bool {
		self.source.is_some()
	}

	/// Underlying reqwest client, useful for building requests.
	pub fn http(&self) -> &ReqwestClient {
		&self.http
	}

	/// Performs one request/response cycle, honouring the context's cancellation and deadline.
	pub async fn execute(&self, ctx: &Context, mut request: Request) -> Result<Response> {
		obs::observe(FlowKind::Request, "authorized_client.execute", async move {
			if let Some(source) = &self.source {
				let token = ctx.run(source.token()).await?;
				let value = HeaderValue::from_str(&token.authorization_value())
					.map_err(TransportError::network)?;

				request.headers_mut().insert(AUTHORIZATION, value);
			}

			ctx.run(async {
				self.http.execute(request).await.map_err(|e| Error::from(TransportError::from(e)))
			})
			.await
		})
		.await
	}
}
impl Debug for AuthorizedClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizedClient")
			.field("authenticated", &self.is_authenticated())
			.finish()
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retry_after_accepts_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}

	#[test]
	fn metadata_slot_is_consumed_on_take() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(429), retry_after: None });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(429));
		assert!(slot.take().is_none());
	}
}
