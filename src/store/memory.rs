//! Thread-safe in-memory [`TokenStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, User, UserId},
	store::{self, StoreError, StoreFuture, TokenStore},
};

type StoreMap = Arc<Mutex<HashMap<UserId, Vec<u8>>>>;

/// Reference store that keeps serialized records in-process.
///
/// A single lock guards the whole map, so every get and save is serialized across all users.
/// Records are tiny, which keeps that acceptable for tests and low-volume tools.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of users with a stored record.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns `true` if no record has been stored yet.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}

	#[cfg(test)]
	pub(crate) fn insert_raw(&self, user_id: UserId, bytes: impl Into<Vec<u8>>) {
		self.0.lock().insert(user_id, bytes.into());
	}

	fn get_now(map: StoreMap, key: UserId) -> Result<Option<TokenRecord>, StoreError> {
		let guard = map.lock();
		let Some(bytes) = guard.get(&key) else {
			return Ok(None);
		};

		serde_json::from_slice(bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to decode token for {key}: {e}"),
		})
	}

	fn save_now(map: StoreMap, key: UserId, token: &TokenRecord) -> Result<(), StoreError> {
		let mut guard = map.lock();

		store::ensure_storable(token)?;

		let bytes = serde_json::to_vec(token).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode token for {key}: {e}"),
		})?;

		guard.insert(key, bytes);

		Ok(())
	}
}
impl TokenStore for MemoryStore {
	fn get_token<'a>(&'a self, user: &'a dyn User) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Self::get_now(map, store::user_key(user)?) })
	}

	fn save_token<'a>(&'a self, user: &'a dyn User, token: &'a TokenRecord) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, store::user_key(user)?, token) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{BasicUser, TokenSecret};

	fn record(access: &str) -> TokenRecord {
		TokenRecord::builder()
			.access_token(access)
			.refresh_token("refresh")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.")
	}

	#[tokio::test]
	async fn missing_user_is_absent_not_an_error() {
		let store = MemoryStore::default();
		let user = BasicUser::new("nobody", "");

		assert!(
			store.get_token(&user).await.expect("Lookup of unknown users should succeed.").is_none()
		);
	}

	#[tokio::test]
	async fn corrupt_bytes_surface_serialization_errors() {
		let store = MemoryStore::default();
		let user = BasicUser::new("user-corrupt", "");

		store.insert_raw(UserId::new("user-corrupt").expect("Fixture ID should be valid."), "{oops");

		let err = store.get_token(&user).await.expect_err("Corrupt payload should not decode.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}

	#[tokio::test]
	async fn empty_save_keeps_previous_record() {
		let store = MemoryStore::default();
		let user = BasicUser::new("user-keep", "");
		let original = record("access-original");

		store.save_token(&user, &original).await.expect("Saving fixture should succeed.");

		let mut empty = record("ignored");

		empty.access_token = TokenSecret::new("");

		let err = store.save_token(&user, &empty).await.expect_err("Empty tokens are rejected.");

		assert!(matches!(err, StoreError::InvalidArgument { .. }));

		let stored = store
			.get_token(&user)
			.await
			.expect("Lookup should succeed.")
			.expect("Original record should remain present.");

		assert_eq!(stored, original);
		assert_eq!(store.len(), 1);
	}
}
