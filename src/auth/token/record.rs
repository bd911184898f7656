//! Cached bearer-token records and their expiry rules.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, token::secret::Secret},
};

/// Lifetime the service documents for every issued token.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::hours(1);

/// Lifecycle status for a cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token may still be presented.
	Active,
	/// Token reached its expiry instant.
	Expired,
}

/// Bearer token issued to one account, with its expiry instant.
///
/// A token is usable iff `now < expires_at`; expired records are treated as absent by
/// every reader and are only replaced on the next write.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	/// Account the token was issued to.
	pub owner: AccountId,
	/// Opaque bearer token.
	pub token: Secret,
	/// Instant after which the token must not be presented.
	pub expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Creates a record for `owner` expiring at `expires_at`.
	pub fn new(owner: AccountId, token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { owner, token: Secret::new(token), expires_at }
	}

	/// Creates a record issued at `issued_at` that lives for `lifetime`.
	pub fn issued(
		owner: AccountId,
		token: impl Into<String>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Self {
		Self::new(owner, token, issued_at.saturating_add(lifetime))
	}

	/// Computes the lifecycle status at `instant`.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at { TokenStatus::Expired } else { TokenStatus::Active }
	}

	/// Returns `true` if the token may be presented at `instant`.
	pub fn is_usable_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Active)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("owner", &self.owner)
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
