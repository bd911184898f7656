//! Session-scoped authentication throttling.
//!
//! [`RateLimiter`] is pure decision logic: it reads and mutates a [`RateState`] at an
//! instant supplied by the caller and never performs IO. Persistence and atomicity are
//! the job of [`SessionStore`](crate::session::SessionStore), which runs
//! [`RateLimiter::evaluate`] inside a single transaction per attempt.
//!
//! The gate runs in a fixed order:
//!
//! 1. refuse while a global lockout is active (no counters touched);
//! 2. count the attempt against the global window, restarting the window when it elapsed;
//! 3. arm a global lockout and refuse when the window count exceeds the cap;
//! 4. refuse while recent invalid-credential attempts reach the local limit.

// self
use crate::_prelude::*;

/// Throttling thresholds. Defaults mirror the provider's published limits with a safety
/// margin on the lockout window.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
	/// Length of the global request-counting window.
	#[serde(with = "duration_secs")]
	pub global_window: Duration,
	/// Cooldown applied once the global cap trips.
	#[serde(with = "duration_secs")]
	pub global_lockout: Duration,
	/// Attempts allowed per global window before a lockout is armed.
	pub max_global_requests: u64,
	/// Invalid-credential attempts tolerated before the local cooldown applies.
	pub max_invalid_attempts: u32,
	/// Cooldown measured from the most recent invalid attempt.
	#[serde(with = "duration_secs")]
	pub invalid_attempt_window: Duration,
	/// Clears invalid-attempt history after a successful login when set.
	pub reset_invalid_attempts_on_success: bool,
}
impl Default for RateLimitPolicy {
	fn default() -> Self {
		Self {
			global_window: Duration::seconds(240),
			global_lockout: Duration::seconds(240),
			max_global_requests: 10_000,
			max_invalid_attempts: 4,
			invalid_attempt_window: Duration::seconds(120),
			reset_invalid_attempts_on_success: false,
		}
	}
}

/// Counters owned by one logical session.
///
/// Field names on the wire match the session keys the service integration has always
/// used, with instants stored as unix seconds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
	/// Attempts counted in the current global window.
	#[serde(rename = "global_requests", default)]
	pub global_request_count: u64,
	/// Start of the current global window.
	#[serde(rename = "global_requests_time", default, with = "time::serde::timestamp::option")]
	pub global_window_start: Option<OffsetDateTime>,
	/// Instant the global lockout was armed.
	#[serde(rename = "global_lockout_time", default, with = "time::serde::timestamp::option")]
	pub global_lockout_at: Option<OffsetDateTime>,
	/// Credential rejections recorded so far.
	#[serde(default)]
	pub invalid_attempts: u32,
	/// Instant of the most recent credential rejection.
	#[serde(rename = "last_attempt_time", default, with = "time::serde::timestamp::option")]
	pub last_invalid_attempt_at: Option<OffsetDateTime>,
}

/// Which limit refused an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitReason {
	/// Session-wide request volume cap (or its lockout) is in effect.
	GlobalVolumeCap,
	/// Too many recent credential rejections.
	TooManyInvalidAttempts,
}
impl RateLimitReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::GlobalVolumeCap => "global volume cap",
			Self::TooManyInvalidAttempts => "too many invalid credential attempts",
		}
	}

	/// Operator-facing message for the refusal.
	pub const fn message(self) -> &'static str {
		match self {
			Self::GlobalVolumeCap => "Global rate limit exceeded. Please wait before trying again.",
			Self::TooManyInvalidAttempts =>
				"Too many invalid attempts. Please wait before trying again.",
		}
	}
}
impl Display for RateLimitReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Advises callers when a refused attempt may be retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Limit that refused the attempt.
	pub reason: RateLimitReason,
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Wait measured from the evaluation instant.
	pub retry_after: Duration,
}
impl RetryDirective {
	fn until(reason: RateLimitReason, now: OffsetDateTime, earliest_retry_at: OffsetDateTime) -> Self {
		let retry_after = earliest_retry_at - now;

		Self {
			reason,
			earliest_retry_at,
			retry_after: if retry_after.is_negative() { Duration::ZERO } else { retry_after },
		}
	}
}

/// Outcome of [`RateLimiter::evaluate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The attempt may proceed to the network.
	Allow,
	/// The session-wide cap (or its lockout) refused the attempt.
	GloballyLocked(RetryDirective),
	/// Recent invalid-credential attempts refused the attempt.
	RequestLocked(RetryDirective),
}
impl RateLimitDecision {
	/// Returns `true` for [`RateLimitDecision::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}

	/// Converts a refusal into [`Error::RateLimited`].
	pub fn into_result(self) -> Result<()> {
		match self {
			Self::Allow => Ok(()),
			Self::GloballyLocked(directive) | Self::RequestLocked(directive) =>
				Err(Error::RateLimited {
					reason: directive.reason,
					retry_after: directive.retry_after,
				}),
		}
	}
}

/// Pure decision logic over [`RateState`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RateLimiter {
	policy: RateLimitPolicy,
}
impl RateLimiter {
	/// Creates a limiter enforcing `policy`.
	pub fn new(policy: RateLimitPolicy) -> Self {
		Self { policy }
	}

	/// Thresholds in force.
	pub fn policy(&self) -> &RateLimitPolicy {
		&self.policy
	}

	/// Runs the full gate for one authentication attempt, mutating `state` in place.
	pub fn evaluate(&self, state: &mut RateState, now: OffsetDateTime) -> RateLimitDecision {
		if let Some(directive) = self.global_lockout_directive(state, now) {
			return RateLimitDecision::GloballyLocked(directive);
		}

		self.admit_global_request(state, now);

		if self.has_exceeded_global_threshold(state) {
			state.global_lockout_at = Some(now);

			return RateLimitDecision::GloballyLocked(RetryDirective::until(
				RateLimitReason::GlobalVolumeCap,
				now,
				now.saturating_add(self.policy.global_lockout),
			));
		}
		if self.is_request_rate_limited(state, now) {
			let last = state.last_invalid_attempt_at.unwrap_or(now);

			return RateLimitDecision::RequestLocked(RetryDirective::until(
				RateLimitReason::TooManyInvalidAttempts,
				now,
				last.saturating_add(self.policy.invalid_attempt_window),
			));
		}

		RateLimitDecision::Allow
	}

	/// Returns `true` while an armed global lockout is still cooling down.
	pub fn is_globally_locked(&self, state: &RateState, now: OffsetDateTime) -> bool {
		state.global_lockout_at.is_some_and(|armed| now - armed < self.policy.global_lockout)
	}

	/// Counts one attempt, restarting the window when it has elapsed.
	pub fn admit_global_request(&self, state: &mut RateState, now: OffsetDateTime) {
		let window_expired = match state.global_window_start {
			Some(start) => now - start >= self.policy.global_window,
			None => true,
		};

		if window_expired {
			state.global_request_count = 1;
			state.global_window_start = Some(now);
		} else {
			state.global_request_count = state.global_request_count.saturating_add(1);
		}
	}

	/// Returns `true` once the window count passes the cap.
	pub fn has_exceeded_global_threshold(&self, state: &RateState) -> bool {
		state.global_request_count > self.policy.max_global_requests
	}

	/// Returns `true` while recent credential rejections reach the local limit.
	pub fn is_request_rate_limited(&self, state: &RateState, now: OffsetDateTime) -> bool {
		state.invalid_attempts >= self.policy.max_invalid_attempts
			&& state
				.last_invalid_attempt_at
				.is_some_and(|last| now - last < self.policy.invalid_attempt_window)
	}

	/// Records a credential rejection at `now`.
	pub fn record_invalid_attempt(&self, state: &mut RateState, now: OffsetDateTime) {
		state.invalid_attempts = state.invalid_attempts.saturating_add(1);
		state.last_invalid_attempt_at = Some(now);
	}

	/// Applies the policy's success handling; returns `true` if `state` changed.
	pub fn record_success(&self, state: &mut RateState) -> bool {
		if !self.policy.reset_invalid_attempts_on_success || state.invalid_attempts == 0 {
			return false;
		}

		state.invalid_attempts = 0;
		state.last_invalid_attempt_at = None;

		true
	}

	fn global_lockout_directive(
		&self,
		state: &RateState,
		now: OffsetDateTime,
	) -> Option<RetryDirective> {
		if !self.is_globally_locked(state, now) {
			return None;
		}

		let armed = state.global_lockout_at?;

		Some(RetryDirective::until(
			RateLimitReason::GlobalVolumeCap,
			now,
			armed.saturating_add(self.policy.global_lockout),
		))
	}
}

/// Serializes [`Duration`] values as whole seconds.
pub(crate) mod duration_secs {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
