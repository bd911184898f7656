//! Time sources consulted by the rate limiter and token cache.
//!
//! Every expiry and lockout decision in the crate is a pure function of the instant a
//! [`Clock`] returns, so tests can drive time forward with [`ManualClock`] instead of
//! sleeping.

// self
use crate::_prelude::*;

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually driven clock for deterministic tests and simulations.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(Mutex::new(start)))
	}

	/// Moves the clock forward (or backward, for negative durations).
	pub fn advance(&self, delta: Duration) {
		*self.0.lock() += delta;
	}

	/// Pins the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.lock() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn manual_clock_advances_across_clones() {
		let clock = ManualClock::new(macros::datetime!(2025-03-01 09:00 UTC));
		let shared = clock.clone();

		shared.advance(Duration::seconds(90));

		assert_eq!(clock.now(), macros::datetime!(2025-03-01 09:01:30 UTC));

		clock.set(macros::datetime!(2025-03-02 00:00 UTC));

		assert_eq!(shared.now(), macros::datetime!(2025-03-02 00:00 UTC));
	}
}
