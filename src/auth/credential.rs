//! Account credentials presented to the login endpoint.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, IdentifierError, Secret},
};

/// Username/password pair owned by a client for its whole lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
	username: AccountId,
	password: Secret,
}
impl Credential {
	/// Validates `username` and wraps both halves.
	pub fn new(
		username: impl AsRef<str>,
		password: impl Into<String>,
	) -> Result<Self, IdentifierError> {
		Ok(Self { username: AccountId::new(username.as_ref())?, password: Secret::new(password) })
	}

	/// Account identifier; doubles as the token-cache key.
	pub fn username(&self) -> &AccountId {
		&self.username
	}

	/// Password secret. Callers must avoid logging it.
	pub fn password(&self) -> &Secret {
		&self.password
	}

	/// JSON body expected by `POST /authenticate`.
	pub(crate) fn login_payload(&self) -> serde_json::Value {
		serde_json::json!({
			"username": self.username.as_ref(),
			"password": self.password.expose(),
		})
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_payload_carries_both_fields() {
		let credential =
			Credential::new("api-user", "pa55word").expect("Credential fixture should be valid.");

		assert_eq!(
			credential.login_payload(),
			serde_json::json!({ "username": "api-user", "password": "pa55word" })
		);
		assert!(!format!("{credential:?}").contains("pa55word"));
	}

	#[test]
	fn invalid_username_is_rejected() {
		assert!(Credential::new("", "pw").is_err());
	}
}
