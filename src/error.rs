//! Client-level error types shared across the authenticator, dispatcher, and stores.

// self
use crate::{_prelude::*, limiter::RateLimitReason};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token cache or session store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The rate limiter refused the authentication attempt before any network call.
	#[error("Authentication refused: {reason}; retry in {}s.", retry_after.whole_seconds())]
	RateLimited {
		/// Which limit tripped.
		reason: RateLimitReason,
		/// Suggested wait before the next attempt.
		retry_after: Duration,
	},
	/// The service rejected the configured credentials.
	#[error("Credentials were rejected by the service: {}.", errors.join("; "))]
	AuthRejected {
		/// Validation messages returned by the service.
		errors: Vec<String>,
	},
	/// The login endpoint answered with neither a token nor validation errors.
	#[error("Authentication endpoint returned an unexpected response: {message}.")]
	UnexpectedResponse {
		/// Summary of what was received.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// An endpoint answered with a status its documentation does not declare.
	#[error("Failed to {operation}. Status code: {status}.")]
	UnexpectedStatus {
		/// Operation label supplied by the endpoint wrapper.
		operation: &'static str,
		/// Observed HTTP status code.
		status: u16,
	},
	/// Endpoint parameters failed local validation.
	#[error("Invalid request: {reason}.")]
	InvalidRequest {
		/// Human-readable validation failure.
		reason: String,
	},
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Service descriptor failed validation.
	#[error(transparent)]
	InvalidDescriptor(#[from] crate::service::ServiceDescriptorError),
	/// Endpoint path could not be joined onto the base URL.
	#[error("Endpoint path `{path}` is invalid.")]
	InvalidPath {
		/// Path supplied by the caller.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request payload could not be encoded as JSON.
	#[error("Request payload could not be encoded as JSON.")]
	PayloadEncode(#[source] serde_json::Error),
	/// Username is not a valid account identifier.
	#[error(transparent)]
	InvalidAccount(#[from] crate::auth::IdentifierError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

impl From<crate::service::ServiceDescriptorError> for Error {
	fn from(e: crate::service::ServiceDescriptorError) -> Self {
		ConfigError::from(e).into()
	}
}
impl From<crate::auth::IdentifierError> for Error {
	fn from(e: crate::auth::IdentifierError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed call.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request timed out before a response arrived.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Target URL of the failed call.
		url: String,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}
}
