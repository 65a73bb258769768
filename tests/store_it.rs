mod common;

// std
use std::{env, fs, process, sync::Arc};
// crates.io
use time::{Duration, OffsetDateTime};
// self
use oauth2_requester::{
	auth::{BasicUser, TokenSecret},
	store::{FileStore, MemoryStore, StoreError, TokenStore},
};

async fn exercise_concurrently(store: Arc<dyn TokenStore>) {
	let mut handles = Vec::new();

	for task in 0..32_usize {
		let store = store.clone();

		handles.push(tokio::spawn(async move {
			let user = BasicUser::new(format!("user-{}", task % 4), "");

			for round in 0..16_usize {
				let access = format!("access-{task}-{round}");

				store
					.save_token(&user, &common::record(&access, "refresh", Duration::hours(1)))
					.await
					.expect("Concurrent saves should succeed.");

				let fetched = store
					.get_token(&user)
					.await
					.expect("Concurrent reads must never observe torn records.")
					.expect("A record was saved for this user.");

				assert!(fetched.access_token.expose().starts_with("access-"));
				assert_eq!(fetched.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh"));
			}
		}));
	}

	for handle in handles {
		handle.await.expect("Store task should not panic.");
	}

	for user in 0..4 {
		let user = BasicUser::new(format!("user-{user}"), "");

		assert!(
			store.get_token(&user).await.expect("Final lookup should succeed.").is_some(),
			"every user should end with a record"
		);
	}
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_store_serializes_concurrent_access() {
	let store = Arc::new(MemoryStore::default());

	exercise_concurrently(store.clone()).await;

	assert_eq!(store.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_store_serializes_concurrent_access() {
	let path = env::temp_dir().join(format!(
		"oauth2_requester_store_it_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));
	let store = Arc::new(FileStore::open(&path).expect("File store should open."));

	exercise_concurrently(store).await;

	let reopened = FileStore::open(&path).expect("Snapshot should reload after concurrent saves.");

	assert!(
		reopened
			.get_token(&BasicUser::new("user-0", ""))
			.await
			.expect("Lookup should succeed.")
			.is_some()
	);

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn empty_tokens_are_rejected_without_touching_state() {
	let path = env::temp_dir().join(format!(
		"oauth2_requester_store_reject_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));
	let stores: [Arc<dyn TokenStore>; 2] = [
		Arc::new(MemoryStore::default()),
		Arc::new(FileStore::open(&path).expect("File store should open.")),
	];

	for store in stores {
		let user = BasicUser::new("user-keep", "");
		let original = common::record("original", "refresh", Duration::hours(1));

		store.save_token(&user, &original).await.expect("Initial save should succeed.");

		let mut empty = original.clone();

		empty.access_token = TokenSecret::new("");

		let err = store.save_token(&user, &empty).await.expect_err("Empty tokens must be rejected.");

		assert!(matches!(err, StoreError::InvalidArgument { .. }));
		assert_eq!(
			store.get_token(&user).await.expect("Lookup should succeed."),
			Some(original),
			"the previous record must survive a rejected save"
		);
	}

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn unusable_user_keys_are_invalid_arguments() {
	let store = MemoryStore::default();
	let err = store
		.get_token(&BasicUser::new("", ""))
		.await
		.expect_err("Empty user IDs cannot address a record.");

	assert!(matches!(err, StoreError::InvalidArgument { .. }));
}
