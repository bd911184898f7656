//! Optional observability helpers for client flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `creditsafe_connect.flow` with the `flow`
//!   and `stage` fields, plus debug events for token-cache hits/misses and rate-limit refusals.
//! - Enable `metrics` to increment the `creditsafe_connect_flow_total` counter for every
//!   attempt/success/failure/refusal, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client flows observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Cache-first token lookup (`get_token`).
	TokenLookup,
	/// Rate-limited login against the authentication endpoint.
	Authenticate,
	/// Authorized call against a service endpoint.
	Request,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenLookup => "token_lookup",
			FlowKind::Authenticate => "authenticate",
			FlowKind::Request => "request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a client flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Refused locally by the rate limiter.
	RateLimited,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::RateLimited => "rate_limited",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Classifies a finished flow.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => FlowOutcome::Success,
			Err(Error::RateLimited { .. }) => FlowOutcome::RateLimited,
			Err(_) => FlowOutcome::Failure,
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::limiter::RateLimitReason;

	#[test]
	fn outcome_separates_refusals_from_failures() {
		let refused: Result<()> = Err(Error::RateLimited {
			reason: RateLimitReason::GlobalVolumeCap,
			retry_after: Duration::seconds(10),
		});
		let rejected: Result<()> = Err(Error::AuthRejected { errors: vec!["bad".into()] });

		assert_eq!(FlowOutcome::of(&Ok::<_, Error>(())), FlowOutcome::Success);
		assert_eq!(FlowOutcome::of(&refused), FlowOutcome::RateLimited);
		assert_eq!(FlowOutcome::of(&rejected), FlowOutcome::Failure);
		assert_eq!(FlowKind::TokenLookup.to_string(), "token_lookup");
	}
}
