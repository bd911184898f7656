//! Typed wrappers for the service endpoints.
//!
//! Each wrapper validates its parameters locally, failing with [`Error::InvalidRequest`]
//! before any network call, then forwards through [`Client::send`](crate::client::Client::send)
//! with the statuses the endpoint documents.

pub mod companies;
pub mod identity;
pub mod kyc;

pub use companies::*;
pub use identity::*;
pub use kyc::*;

// self
use crate::{_prelude::*, error::ConfigError};

fn invalid(reason: impl Into<String>) -> Error {
	Error::InvalidRequest { reason: reason.into() }
}

fn to_payload(value: &impl Serialize) -> Result<serde_json::Value> {
	Ok(serde_json::to_value(value).map_err(ConfigError::PayloadEncode)?)
}
