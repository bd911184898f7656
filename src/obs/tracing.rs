// self
use crate::{_prelude::*, auth::AccountId, limiter::RateLimitReason, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by client flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("creditsafe_connect.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a token-cache lookup.
pub fn trace_cache_lookup(owner: &AccountId, hit: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(owner = %owner, hit, "token cache lookup");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (owner, hit);
	}
}

/// Emits a warning for an authentication attempt refused by the rate limiter.
pub fn trace_refusal(reason: RateLimitReason, retry_after: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			reason = reason.as_str(),
			retry_after_secs = retry_after.whole_seconds(),
			"{}",
			reason.message()
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, retry_after);
	}
}

/// Emits a debug event for a status outside an endpoint's documented set.
pub fn trace_foreign_status(operation: &'static str, status: u16) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation, status, "foreign status code");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, status);
	}
}
