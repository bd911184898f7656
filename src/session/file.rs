//! File-backed [`SessionStore`] so rate states survive process restarts.
//!
//! Layout: `{ "<session>": { "global_requests": .., "global_requests_time": .., ... } }`,
//! sharing the locking and atomic-replace rules of the file token cache.

// std
use std::path::{Path, PathBuf};
// self
use crate::{
	_prelude::*,
	auth::SessionId,
	limiter::RateState,
	session::{SessionOp, SessionStore},
	store::{StoreError, StoreFuture, file::JsonFile},
};

/// Persists every session's rate state to one JSON file.
#[derive(Clone, Debug)]
pub struct FileSessionStore(JsonFile);
impl FileSessionStore {
	/// Opens (or creates) a store at `path`.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		JsonFile::open(path).map(Self)
	}

	/// Path of the JSON data file.
	pub fn path(&self) -> &Path {
		self.0.path()
	}
}
impl SessionStore for FileSessionStore {
	fn load<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, RateState> {
		Box::pin(async move {
			let mut states = self.0.read::<RateState>()?;

			Ok(states.remove(session.as_ref()).unwrap_or_default())
		})
	}

	fn transact<'a>(
		&'a self,
		session: &'a SessionId,
		op: SessionOp<'a>,
	) -> StoreFuture<'a, RateState> {
		Box::pin(async move {
			self.0.update::<RateState, _>(|states| {
				let state = states.entry(session.to_string()).or_default();
				let before = state.clone();

				op(state);

				let changed = *state != before;

				(state.clone(), changed)
			})
		})
	}
}
