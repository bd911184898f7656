//! Session-scoped storage for [`RateState`](crate::limiter::RateState).
//!
//! Each logical session (a user session, a worker, a tenant) owns exactly one rate state.
//! [`SessionStore::transact`] runs a mutation atomically with respect to every other
//! caller of the same store, which is what keeps two concurrent attempts from both
//! slipping under a threshold.

pub mod file;
pub mod memory;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	limiter::RateState,
	store::StoreFuture,
};

/// One-shot mutation applied inside [`SessionStore::transact`].
pub type SessionOp<'a> = Box<dyn FnOnce(&mut RateState) + 'a + Send>;

/// Durable counter storage keyed by session.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the current state for `session` (default state when unseen).
	fn load<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, RateState>;

	/// Applies `op` to the state for `session` atomically and returns the resulting state.
	fn transact<'a>(&'a self, session: &'a SessionId, op: SessionOp<'a>)
	-> StoreFuture<'a, RateState>;
}
