//! The minimal user capability consumed by authenticators and token stores.

// self
use crate::_prelude::*;

/// Identity data required to authenticate on behalf of a user.
///
/// The trait stays open so new authenticators can work with application-defined user types.
/// [`user_id`](User::user_id) keys persisted tokens and must be stable; [`auth_code`](User::auth_code)
/// carries a one-time authorization code for schemes that exchange one (empty when unused).
pub trait User
where
	Self: Send + Sync,
{
	/// Returns the user's unique identifier.
	fn user_id(&self) -> &str;

	/// Returns the user's authorization code, or an empty string.
	fn auth_code(&self) -> &str;
}

/// Plain [`User`] implementation holding an identifier and an authorization code.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicUser {
	id: String,
	auth_code: String,
}
impl BasicUser {
	/// Creates a user from its identifier and authorization code.
	pub fn new(id: impl Into<String>, auth_code: impl Into<String>) -> Self {
		Self { id: id.into(), auth_code: auth_code.into() }
	}
}
impl User for BasicUser {
	fn user_id(&self) -> &str {
		&self.id
	}

	fn auth_code(&self) -> &str {
		&self.auth_code
	}
}
impl Debug for BasicUser {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BasicUser")
			.field("id", &self.id)
			.field("auth_code", &if self.auth_code.is_empty() { "" } else { "<redacted>" })
			.finish()
	}
}
