//! Async Creditsafe Connect client: durable bearer-token caching, session-scoped
//! authentication rate limiting, and typed endpoint wrappers in one crate.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod clock;
pub mod error;
pub mod http;
pub mod limiter;
pub mod obs;
pub mod service;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credential,
		client::Client,
		clock::ManualClock,
		http::ReqwestHttpClient,
		service::ServiceDescriptor,
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = Client<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Descriptor pointing at a mock server's base URL (for example `server.url("/v1")`).
	pub fn test_descriptor(base_url: &str) -> ServiceDescriptor {
		let url = Url::parse(base_url).expect("Mock server base URL should parse.");

		ServiceDescriptor::builder()
			.base_url(url)
			.build()
			.expect("Mock server descriptor should build.")
	}

	/// Constructs a [`Client`] with in-memory stores, the insecure reqwest transport, and a
	/// [`ManualClock`] the test controls.
	pub fn build_reqwest_test_client(
		descriptor: ServiceDescriptor,
		username: &str,
		password: &str,
		start: OffsetDateTime,
	) -> (ReqwestTestClient, ManualClock) {
		let credential =
			Credential::new(username, password).expect("Test credential should be valid.");
		let clock = ManualClock::new(start);
		let client: ReqwestTestClient =
			Client::with_http_client(descriptor, credential, test_reqwest_http_client());
		let client = client.with_clock(Arc::new(clock.clone()));

		(client, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, creditsafe_connect as _, httpmock as _, tracing_subscriber as _};
