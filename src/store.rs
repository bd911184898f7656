//! Token cache contracts and built-in cache implementations.
//!
//! A [`TokenCache`] maps account usernames to their current bearer token. Writes are
//! compare-and-write: an unexpired entry is never replaced, so processes that race
//! through a cache miss converge on whichever token landed first.

pub mod file;
pub mod memory;

pub use file::FileTokenCache;
pub use memory::MemoryTokenCache;

// self
use crate::{
	_prelude::*,
	auth::{AccountId, CachedToken},
};

/// Boxed future returned by cache and session-store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable token storage keyed by account.
pub trait TokenCache
where
	Self: Send + Sync,
{
	/// Returns the token for `owner` if one exists and is unexpired at `now`.
	///
	/// Expired entries are reported as absent but left in place until the next write.
	fn read<'a>(
		&'a self,
		owner: &'a AccountId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<CachedToken>>;

	/// Stores `token` unless an entry for the same owner is still unexpired at `now`.
	fn write(&self, token: CachedToken, now: OffsetDateTime) -> StoreFuture<'_, WriteOutcome>;
}

/// Result of a [`TokenCache::write`] attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
	/// The entry was absent or expired and has been replaced.
	Written,
	/// An unexpired entry already existed and was left untouched.
	Kept(CachedToken),
}

/// Error type produced by token caches and session stores.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Stored data could not be encoded or decoded.
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

/// Shared compare-and-write rule used by every cache backend.
pub(crate) fn should_replace(existing: Option<&CachedToken>, now: OffsetDateTime) -> bool {
	existing.is_none_or(|current| !current.is_usable_at(now))
}
