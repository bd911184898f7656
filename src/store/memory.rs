//! Thread-safe in-memory [`TokenCache`] for tests and single-process hosts.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, CachedToken},
	store::{self, StoreFuture, TokenCache, WriteOutcome},
};

type CacheMap = Arc<RwLock<HashMap<AccountId, CachedToken>>>;

/// Process-local token cache; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenCache(CacheMap);
impl MemoryTokenCache {
	fn read_now(map: &CacheMap, owner: &AccountId, now: OffsetDateTime) -> Option<CachedToken> {
		map.read().get(owner).filter(|token| token.is_usable_at(now)).cloned()
	}

	fn write_now(map: &CacheMap, token: CachedToken, now: OffsetDateTime) -> WriteOutcome {
		let mut guard = map.write();

		let existing = guard.get(&token.owner).cloned();

		if !store::should_replace(existing.as_ref(), now) {
			return existing.map_or(WriteOutcome::Written, WriteOutcome::Kept);
		}

		guard.insert(token.owner.clone(), token);

		WriteOutcome::Written
	}

	/// Number of entries held, expired ones included.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing has been cached yet.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl TokenCache for MemoryTokenCache {
	fn read<'a>(
		&'a self,
		owner: &'a AccountId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<CachedToken>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::read_now(&map, owner, now)) })
	}

	fn write(&self, token: CachedToken, now: OffsetDateTime) -> StoreFuture<'_, WriteOutcome> {
		let map = self.0.clone();

		Box::pin(async move { Ok(Self::write_now(&map, token, now)) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const NOW: OffsetDateTime = macros::datetime!(2025-04-01 08:00 UTC);

	fn token(value: &str, expires_at: OffsetDateTime) -> CachedToken {
		let owner = AccountId::new("api-user").expect("Account fixture should be valid.");

		CachedToken::new(owner, value, expires_at)
	}

	#[tokio::test]
	async fn round_trip_until_expiry() {
		let cache = MemoryTokenCache::default();
		let expires = NOW + Duration::hours(1);
		let owner = AccountId::new("api-user").expect("Account fixture should be valid.");

		assert_eq!(
			cache.write(token("tok-1", expires), NOW).await.expect("Write should succeed."),
			WriteOutcome::Written
		);

		let hit = cache
			.read(&owner, expires - Duration::seconds(1))
			.await
			.expect("Read should succeed.")
			.expect("Unexpired token should be returned.");

		assert_eq!(hit.token.expose(), "tok-1");
		assert_eq!(cache.read(&owner, expires).await.expect("Read should succeed."), None);
		assert_eq!(cache.len(), 1, "Expired entries stay until the next write.");
	}

	#[tokio::test]
	async fn unexpired_entry_is_never_overwritten() {
		let cache = MemoryTokenCache::default();
		let owner = AccountId::new("api-user").expect("Account fixture should be valid.");
		let first = token("first", NOW + Duration::hours(1));

		cache.write(first.clone(), NOW).await.expect("First write should succeed.");

		let outcome = cache
			.write(token("second", NOW + Duration::hours(2)), NOW + Duration::minutes(5))
			.await
			.expect("Second write should succeed.");

		assert_eq!(outcome, WriteOutcome::Kept(first.clone()));

		let current = cache
			.read(&owner, NOW + Duration::minutes(10))
			.await
			.expect("Read should succeed.")
			.expect("First token should remain cached.");

		assert_eq!(current, first);
	}

	#[tokio::test]
	async fn expired_entry_is_replaced() {
		let cache = MemoryTokenCache::default();
		let owner = AccountId::new("api-user").expect("Account fixture should be valid.");

		cache.write(token("old", NOW), NOW - Duration::hours(1)).await.expect("Write should succeed.");

		let outcome = cache
			.write(token("new", NOW + Duration::hours(1)), NOW)
			.await
			.expect("Replacement should succeed.");

		assert_eq!(outcome, WriteOutcome::Written);
		assert_eq!(
			cache
				.read(&owner, NOW)
				.await
				.expect("Read should succeed.")
				.map(|token| token.token.expose().to_owned()),
			Some("new".to_owned())
		);
	}
}
