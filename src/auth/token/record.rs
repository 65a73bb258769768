//! Token record structs, validity helpers, and builders.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Tokens expiring within this window are treated as stale so they are renewed before an
/// in-flight request can observe the expiry.
pub const EXPIRY_SKEW: Duration = Duration::seconds(10);

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token can be attached to requests.
	Active,
	/// Token reached (or is within [`EXPIRY_SKEW`] of) its expiry instant.
	Expired,
	/// Token carries no access token value.
	Empty,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
}

/// OAuth 2.0 access/refresh token pair persisted per user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (usually `bearer`).
	#[serde(default)]
	pub token_type: String,
	/// Refresh token secret, if the provider issued one.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Issued-at instant recorded when the token was minted.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry instant; `None` means the token never expires.
	#[serde(default)]
	pub expires_at: Option<OffsetDateTime>,
	/// Scopes granted by the provider, when reported.
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub scopes: Vec<String>,
}
impl TokenRecord {
	/// Returns a builder for constructing records.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if self.access_token.is_empty() {
			return TokenStatus::Empty;
		}
		if self.expires_at.is_some_and(|expires_at| instant >= expires_at - EXPIRY_SKEW) {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the record can be attached to requests at the provided instant.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}

	/// Returns `true` if the record can currently be attached to requests.
	pub fn is_valid(&self) -> bool {
		matches!(self.status(), TokenStatus::Active)
	}

	/// Returns `true` if the record is stale at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the record is stale relative to the current clock.
	pub fn is_expired(&self) -> bool {
		matches!(self.status(), TokenStatus::Expired)
	}

	/// Returns `true` if the record can be renewed without user interaction.
	pub fn is_refreshable(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_empty())
	}

	/// Authorization scheme derived from [`token_type`](Self::token_type).
	///
	/// Providers report the type in arbitrary casing; well-known schemes are normalized and an
	/// empty type falls back to `Bearer`.
	pub fn scheme(&self) -> &str {
		let raw = self.token_type.as_str();

		if raw.is_empty() || raw.eq_ignore_ascii_case("bearer") {
			DEFAULT_TOKEN_TYPE
		} else if raw.eq_ignore_ascii_case("mac") {
			"MAC"
		} else if raw.eq_ignore_ascii_case("basic") {
			"Basic"
		} else {
			raw
		}
	}

	/// Formats the `Authorization` header value carrying this token.
	pub fn authorization_value(&self) -> String {
		format!("{} {}", self.scheme(), self.access_token.expose())
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("scopes", &self.scopes)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
	scopes: Vec<String>,
}
impl TokenRecordBuilder {
	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the token type (defaults to `Bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Records the scopes granted alongside the token.
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => Some(instant),
			(None, Some(delta)) => Some(issued_at + delta),
			(None, None) => None,
		};

		Ok(TokenRecord {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned()),
			refresh_token: self.refresh_token,
			issued_at,
			expires_at,
			scopes: self.scopes,
		})
	}
}
