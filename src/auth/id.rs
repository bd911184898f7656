//! Service-account usernames and rate-limit session labels.

// self
use crate::_prelude::*;

/// Why a username or session label was refused.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Username was empty or whitespace only.
	#[error("Username cannot be blank.")]
	BlankUsername,
	/// Username starts or ends with whitespace, usually a copy-paste artefact.
	#[error("Username must not start or end with whitespace.")]
	PaddedUsername,
	/// Session label was empty.
	#[error("Session label cannot be empty.")]
	EmptySession,
}

/// Username of a service account; keys the shared token cache.
///
/// Kept exactly as the service expects it in the login body, so email-shaped usernames
/// are fine.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccountId(String);
impl AccountId {
	/// Validates `username` and wraps it.
	pub fn new(username: impl Into<String>) -> Result<Self, IdentifierError> {
		let username = username.into();

		if username.trim().is_empty() {
			return Err(IdentifierError::BlankUsername);
		}
		if username.trim() != username {
			return Err(IdentifierError::PaddedUsername);
		}

		Ok(Self(username))
	}
}
impl AsRef<str> for AccountId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for AccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Account({})", self.0)
	}
}
impl Display for AccountId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Logical session owning one rate-limit state (a web session, a worker, a tenant).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);
impl SessionId {
	/// Wraps any non-empty label.
	pub fn new(label: impl Into<String>) -> Result<Self, IdentifierError> {
		let label = label.into();

		if label.is_empty() {
			return Err(IdentifierError::EmptySession);
		}

		Ok(Self(label))
	}

	/// Session used when the host does not partition callers.
	pub fn process_default() -> Self {
		Self("default".into())
	}
}
impl AsRef<str> for SessionId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Display for SessionId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn usernames_keep_their_service_shape() {
		let account = AccountId::new("api-user@example.com")
			.expect("Email-shaped usernames should be accepted.");

		assert_eq!(account.as_ref(), "api-user@example.com");
		assert_eq!(format!("{account:?}"), "Account(api-user@example.com)");
		assert_eq!(AccountId::new("  "), Err(IdentifierError::BlankUsername));
		assert_eq!(AccountId::new("api-user\n"), Err(IdentifierError::PaddedUsername));
	}

	#[test]
	fn sessions_accept_any_label() {
		let session = SessionId::new("tenant 42 / web").expect("Free-form labels should be accepted.");

		assert_eq!(session.to_string(), "tenant 42 / web");
		assert_eq!(SessionId::new(""), Err(IdentifierError::EmptySession));
		assert_eq!(SessionId::process_default().as_ref(), "default");
	}
}
