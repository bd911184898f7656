//! In-process [`SessionStore`] guarded by a single mutex.

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	limiter::RateState,
	session::{SessionOp, SessionStore},
	store::StoreFuture,
};

/// Keeps rate states in memory; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<Mutex<HashMap<SessionId, RateState>>>);
impl SessionStore for MemorySessionStore {
	fn load<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, RateState> {
		let state = self.0.lock().get(session).cloned().unwrap_or_default();

		Box::pin(async move { Ok(state) })
	}

	fn transact<'a>(
		&'a self,
		session: &'a SessionId,
		op: SessionOp<'a>,
	) -> StoreFuture<'a, RateState> {
		let state = {
			let mut guard = self.0.lock();
			let state = guard.entry(session.clone()).or_default();

			op(state);

			state.clone()
		};

		Box::pin(async move { Ok(state) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::thread;
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::limiter::RateLimiter;

	fn session(name: &str) -> SessionId {
		SessionId::new(name).expect("Session fixture should be valid.")
	}

	#[tokio::test]
	async fn sessions_are_isolated() {
		let store = MemorySessionStore::default();
		let now = macros::datetime!(2025-05-05 10:00 UTC);
		let limiter = RateLimiter::default();

		store
			.transact(
				&session("a"),
				Box::new(|state: &mut RateState| limiter.record_invalid_attempt(state, now)),
			)
			.await
			.expect("Transaction should succeed.");

		let touched = store.load(&session("a")).await.expect("Load should succeed.");
		let untouched = store.load(&session("b")).await.expect("Load should succeed.");

		assert_eq!(touched.invalid_attempts, 1);
		assert_eq!(untouched, RateState::default());
	}

	#[test]
	fn concurrent_increments_are_not_lost() {
		let store = MemorySessionStore::default();
		let now = macros::datetime!(2025-05-05 10:00 UTC);
		let handles = (0..16)
			.map(|_| {
				let store = store.clone();

				thread::spawn(move || {
					let runtime = tokio::runtime::Builder::new_current_thread()
						.build()
						.expect("Failed to build Tokio runtime for session test.");
					let limiter = RateLimiter::default();
					let id = session("shared");

					for _ in 0..50 {
						runtime
							.block_on(store.transact(
								&id,
								Box::new(|state: &mut RateState| limiter.admit_global_request(state, now)),
							))
							.expect("Transaction should succeed.");
					}
				})
			})
			.collect::<Vec<_>>();

		for handle in handles {
			handle.join().expect("Worker thread should not panic.");
		}

		let runtime = tokio::runtime::Builder::new_current_thread()
			.build()
			.expect("Failed to build Tokio runtime for session test.");
		let state = runtime.block_on(store.load(&session("shared"))).expect("Load should succeed.");

		assert_eq!(state.global_request_count, 800);
	}
}
