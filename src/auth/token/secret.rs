//! Credential strings that never print themselves.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Access or refresh token value.
///
/// `Debug` and `Display` both render as `<redacted>`; the raw value is only reachable through
/// [`expose`](Self::expose). Serialized as a plain JSON string so stored records stay readable
/// by other tooling.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value, for building `Authorization` headers and grant requests.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` for the empty string, which no provider issues as a real token.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
