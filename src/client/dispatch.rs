//! Request dispatcher: bearer attachment, status capture, and response classification.

// crates.io
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	client::Client,
	error::ConfigError,
	http::{ApiHttpClient, ApiRequest, HttpResponse, Method},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Decoded response body.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseBody {
	/// The body was empty or whitespace only.
	Empty,
	/// The body parsed as JSON.
	Json(Value),
	/// The body was not JSON; kept as (lossily decoded) text.
	Text(String),
}
impl ResponseBody {
	/// Decodes raw bytes, falling back to text when they are not JSON.
	pub fn decode(bytes: &[u8]) -> Self {
		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Self::Empty;
		}

		match serde_json::from_slice(bytes) {
			Ok(value) => Self::Json(value),
			Err(_) => Self::Text(String::from_utf8_lossy(bytes).into_owned()),
		}
	}

	/// JSON payload, if the body decoded as JSON.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			_ => None,
		}
	}

	/// Raw text, if the body did not decode as JSON.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}
}

/// Response returned by the dispatcher; the status travels with the body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
	/// HTTP status code observed for this call.
	pub status: u16,
	/// Retry-After hint, when the service sent one.
	pub retry_after: Option<Duration>,
	/// Decoded body.
	pub body: ResponseBody,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Fails with [`Error::UnexpectedStatus`] when the status is outside `known`.
	///
	/// Documented error statuses (for example 400 on a search) pass; the caller inspects
	/// the body to tell them apart.
	pub fn ensure_known_status(&self, operation: &'static str, known: &[u16]) -> Result<()> {
		if known.contains(&self.status) {
			return Ok(());
		}

		obs::trace_foreign_status(operation, self.status);

		Err(Error::UnexpectedStatus { operation, status: self.status })
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		Self {
			status: response.status,
			retry_after: response.retry_after,
			body: ResponseBody::decode(&response.body),
		}
	}
}

/// One endpoint call: verb, path, payload, and the statuses the endpoint documents.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiCall {
	/// Label used in [`Error::UnexpectedStatus`] ("Failed to {operation}").
	pub operation: &'static str,
	/// HTTP verb.
	pub method: Method,
	/// Path relative to the versioned base URL.
	pub path: String,
	/// Query parameters, URL-encoded onto the request.
	pub query: Vec<(String, String)>,
	/// JSON body.
	pub body: Option<Value>,
	/// Documented statuses; `None` accepts any status.
	pub known_statuses: Option<&'static [u16]>,
}
impl ApiCall {
	/// Creates a call without query, body, or status contract.
	pub fn new(operation: &'static str, method: Method, path: impl Into<String>) -> Self {
		Self {
			operation,
			method,
			path: path.into(),
			query: Vec::new(),
			body: None,
			known_statuses: None,
		}
	}

	/// `GET` call.
	pub fn get(operation: &'static str, path: impl Into<String>) -> Self {
		Self::new(operation, Method::Get, path)
	}

	/// `POST` call carrying `body`.
	pub fn post(operation: &'static str, path: impl Into<String>, body: Value) -> Self {
		Self::new(operation, Method::Post, path).with_body(body)
	}

	/// `PUT` call carrying `body`.
	pub fn put(operation: &'static str, path: impl Into<String>, body: Value) -> Self {
		Self::new(operation, Method::Put, path).with_body(body)
	}

	/// `DELETE` call.
	pub fn delete(operation: &'static str, path: impl Into<String>) -> Self {
		Self::new(operation, Method::Delete, path)
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Replaces the query parameters.
	pub fn with_query<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		self
	}

	/// Declares the statuses the endpoint documents.
	pub fn expecting(mut self, known: &'static [u16]) -> Self {
		self.known_statuses = Some(known);

		self
	}
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Sends an authorized request and returns the response whatever its status.
	///
	/// The held token is reused while it is unexpired; otherwise [`Client::get_token`]
	/// supplies one (from the cache, or by logging in).
	pub async fn authorized_request(
		&self,
		method: Method,
		path: &str,
		query: &[(String, String)],
		body: Option<&Value>,
	) -> Result<ApiResponse> {
		let token = match self.held_token() {
			Some(token) => token,
			None => self.get_token().await?,
		};
		let mut url = self.descriptor.endpoint(path)?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		let mut request = ApiRequest::new(method, url)
			.with_header("Authorization", format!("Bearer {}", token.token.expose()));

		if let Some(body) = body {
			request = request
				.with_json_body(serde_json::to_vec(body).map_err(ConfigError::PayloadEncode)?);
		}

		let response = self.http_client.execute(request).await?;

		Ok(response.into())
	}

	/// Dispatches `call` and enforces its status contract.
	pub async fn send(&self, call: &ApiCall) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, call.operation);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let response = self
					.authorized_request(call.method, &call.path, &call.query, call.body.as_ref())
					.await?;

				if let Some(known) = call.known_statuses {
					response.ensure_known_status(call.operation, known)?;
				}

				Ok(response)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}
}
