//! Transport primitives for calls against the service.
//!
//! [`ApiHttpClient`] is the crate's only dependency on an HTTP stack. The dispatcher
//! builds a fully formed [`ApiRequest`] (URL, headers, encoded body) and the transport
//! executes it, reporting the raw [`HttpResponse`] or a [`TransportError`]. Timeouts,
//! proxies, and TLS settings belong to the transport; nothing above it retries.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute service calls.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by
/// many clients behind an [`Arc`].
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw response, whatever its status.
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_>;
}

/// HTTP verbs used by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Upper-case verb as sent on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully formed request handed to the transport.
#[derive(Clone)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Header name/value pairs.
	pub headers: Vec<(&'static str, String)>,
	/// Encoded body, if any.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
		self.headers.push((name, value.into()));

		self
	}

	/// Attaches a JSON body and the matching content type.
	pub fn with_json_body(self, body: Vec<u8>) -> Self {
		let mut this = self.with_header("Content-Type", "application/json");

		this.body = Some(body);

		this
	}

	/// Returns the first header value matching `name` case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				if name.eq_ignore_ascii_case("authorization") {
					(*name, "<redacted>")
				} else {
					(*name, value.as_str())
				}
			})
			.collect::<Vec<_>>();

		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Raw response reported by the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Undecoded body bytes.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Builds a response with a status and body.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, retry_after: None, body: body.into() }
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that gives up on calls exceeding `timeout`.
	pub fn with_timeout(timeout: Duration) -> Result<Self, crate::error::ConfigError> {
		let timeout = std::time::Duration::try_from(timeout)
			.map_err(crate::error::ConfigError::http_client_build)?;
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.build()
			.map_err(crate::error::ConfigError::http_client_build)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body } = request;
			let method = match method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = client.request(method, url.clone());

			for (name, value) in headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await.map_err(|e| map_reqwest_error(&url, e))?;
			let status = response.status().as_u16();
			let retry_after = parse_retry_after(response.headers());
			let body = response.bytes().await.map_err(|e| map_reqwest_error(&url, e))?.to_vec();

			Ok(HttpResponse { status, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(url: &Url, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		TransportError::Timeout { url: url.to_string() }
	} else {
		TransportError::network(url, err)
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
