//! Storage contracts and built-in store implementations for per-user token records.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, User, UserId},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract mapping a user's identity to their token record.
///
/// Implementations must be safe for concurrent use by requests for the same or different users,
/// and a save must be atomic for its key: a concurrent [`get_token`](TokenStore::get_token) never
/// observes a half-written record and concurrent saves never interleave.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Fetches the record stored for `user`, or `None` when nothing has been saved yet.
	///
	/// Corrupt stored data surfaces as [`StoreError::Serialization`].
	fn get_token<'a>(&'a self, user: &'a dyn User) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Persists `token` for `user`, replacing any prior record.
	///
	/// Empty tokens are rejected with [`StoreError::InvalidArgument`] before any state changes.
	fn save_token<'a>(&'a self, user: &'a dyn User, token: &'a TokenRecord) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Caller supplied a token or key the store refuses to persist.
	#[error("Invalid argument: {message}.")]
	InvalidArgument {
		/// Human-readable error payload.
		message: String,
	},
	/// Serialization failures (e.g., corrupt stored bytes) surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Derives the store key for `user`, rejecting identities the store cannot address.
pub fn user_key(user: &dyn User) -> Result<UserId, StoreError> {
	UserId::new(user.user_id())
		.map_err(|e| StoreError::InvalidArgument { message: format!("Unusable user key: {e}") })
}

/// Rejects records that must never reach persistent state.
pub fn ensure_storable(token: &TokenRecord) -> Result<(), StoreError> {
	if token.access_token.is_empty() {
		return Err(StoreError::InvalidArgument { message: "token cannot be empty".into() });
	}

	Ok(())
}
