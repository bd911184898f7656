//! Authenticator: rate-limited login plus the cache-first token lookup.
//!
//! [`Client::get_token`] serves tokens from the shared cache and only falls through to
//! [`Client::authenticate`] on a miss. Every login first runs the session's rate-limit gate
//! inside [`SessionStore::transact`](crate::session::SessionStore::transact), so a refused
//! attempt never reaches the network. Both entry points share one async mutex per client,
//! which keeps concurrent callers from logging in twice for the same miss.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::CachedToken,
	client::Client,
	error::ConfigError,
	http::{ApiHttpClient, ApiRequest, Method},
	limiter::{RateLimitDecision, RateState},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::WriteOutcome,
};

const AUTHENTICATE_PATH: &str = "/authenticate";

/// Interpretation of a login response body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
	/// The service issued a non-empty token.
	Issued(String),
	/// The service reported validation errors for the credentials.
	Rejected(Vec<String>),
	/// Neither a token nor validation errors could be found.
	Unexpected(String),
}
impl LoginOutcome {
	/// Decodes a raw login response body.
	///
	/// Validation errors win over a token when both are present; a blank token counts as
	/// no token at all.
	pub fn decode(body: &[u8]) -> Self {
		let Ok(value) = serde_json::from_slice::<Value>(body) else {
			return Self::Unexpected("response body is not JSON".into());
		};
		let parsed: LoginBody = match serde_path_to_error::deserialize(value) {
			Ok(parsed) => parsed,
			Err(e) =>
				return Self::Unexpected(format!("malformed login payload at `{}`", e.path())),
		};

		if let Some(errors) = parsed.validation_errors {
			return Self::Rejected(validation_messages(errors));
		}

		match parsed.token {
			Some(token) if !token.trim().is_empty() => Self::Issued(token),
			Some(_) => Self::Unexpected("token is empty".into()),
			None => Self::Unexpected("response carried neither a token nor validation errors".into()),
		}
	}
}

#[derive(Deserialize)]
struct LoginBody {
	#[serde(default)]
	token: Option<String>,
	#[serde(rename = "ValidationErrors", default)]
	validation_errors: Option<Value>,
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Returns a usable token for the configured account.
	///
	/// A cache hit costs no network call and no rate-limit budget. A miss runs
	/// [`Client::authenticate`] under the client's single-flight guard, so token refresh is
	/// itself rate-limited.
	pub async fn get_token(&self) -> Result<CachedToken> {
		const KIND: FlowKind = FlowKind::TokenLookup;

		let span = FlowSpan::new(KIND, "get_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let _singleflight = self.auth_guard.lock().await;
				let owner = self.credential.username();

				if let Some(token) = self.token_cache.read(owner, self.clock.now()).await? {
					obs::trace_cache_lookup(owner, true);
					self.hold(token.clone());

					return Ok(token);
				}

				obs::trace_cache_lookup(owner, false);

				self.authenticate_locked().await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Logs in against the service, bypassing the token cache lookup.
	///
	/// Fails with [`Error::RateLimited`] before any network call when the session's gate
	/// refuses the attempt, and with [`Error::AuthRejected`] when the service reports
	/// validation errors (which also counts as an invalid attempt).
	pub async fn authenticate(&self) -> Result<CachedToken> {
		let _singleflight = self.auth_guard.lock().await;

		self.authenticate_locked().await
	}

	async fn authenticate_locked(&self) -> Result<CachedToken> {
		const KIND: FlowKind = FlowKind::Authenticate;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				self.admit_attempt().await?;

				let response = self.http_client.execute(self.login_request()?).await?;
				let now = self.clock.now();

				match LoginOutcome::decode(&response.body) {
					LoginOutcome::Issued(token) => {
						let issued = CachedToken::issued(
							self.credential.username().clone(),
							token,
							now,
							self.descriptor.token_lifetime,
						);
						let token = match self.token_cache.write(issued.clone(), now).await? {
							WriteOutcome::Written => issued,
							WriteOutcome::Kept(current) => current,
						};

						self.settle_success().await?;
						self.hold(token.clone());

						Ok(token)
					},
					LoginOutcome::Rejected(errors) => {
						self.record_rejection(now).await?;

						Err(Error::AuthRejected { errors })
					},
					LoginOutcome::Unexpected(message) =>
						Err(Error::UnexpectedResponse { message, status: Some(response.status) }),
				}
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn admit_attempt(&self) -> Result<()> {
		let now = self.clock.now();
		let limiter = &self.limiter;
		let mut decision = RateLimitDecision::Allow;
		let slot = &mut decision;

		self.session_store
			.transact(
				&self.session,
				Box::new(move |state: &mut RateState| *slot = limiter.evaluate(state, now)),
			)
			.await?;

		if let RateLimitDecision::GloballyLocked(directive)
		| RateLimitDecision::RequestLocked(directive) = &decision
		{
			obs::trace_refusal(directive.reason, directive.retry_after);
		}

		decision.into_result()
	}

	async fn record_rejection(&self, now: OffsetDateTime) -> Result<()> {
		let limiter = &self.limiter;

		self.session_store
			.transact(
				&self.session,
				Box::new(move |state: &mut RateState| limiter.record_invalid_attempt(state, now)),
			)
			.await?;

		Ok(())
	}

	async fn settle_success(&self) -> Result<()> {
		if !self.limiter.policy().reset_invalid_attempts_on_success {
			return Ok(());
		}

		let limiter = &self.limiter;

		self.session_store
			.transact(
				&self.session,
				Box::new(move |state: &mut RateState| {
					limiter.record_success(state);
				}),
			)
			.await?;

		Ok(())
	}

	fn login_request(&self) -> Result<ApiRequest> {
		let url = self.descriptor.endpoint(AUTHENTICATE_PATH)?;
		let body = serde_json::to_vec(&self.credential.login_payload())
			.map_err(ConfigError::PayloadEncode)?;

		Ok(ApiRequest::new(Method::Post, url).with_json_body(body))
	}
}

fn validation_messages(errors: Value) -> Vec<String> {
	let messages = match errors {
		Value::Array(items) => items.into_iter().map(validation_message).collect(),
		Value::Null => Vec::new(),
		other => vec![validation_message(other)],
	};

	if messages.is_empty() { vec!["validation failed".into()] } else { messages }
}

fn validation_message(item: Value) -> String {
	match item {
		Value::String(message) => message,
		Value::Object(ref fields) => fields
			.get("message")
			.and_then(Value::as_str)
			.map(str::to_owned)
			.unwrap_or_else(|| item.to_string()),
		other => other.to_string(),
	}
}
