#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::macros;
// self
use creditsafe_connect::{
	_preludet::*,
	auth::{AccountId, CachedToken, Credential},
	client::Client,
	error::TransportError,
	http::{ApiHttpClient, ApiRequest, HttpFuture},
	limiter::{RateLimitPolicy, RateLimitReason},
	service::ServiceDescriptor,
	session::SessionStore,
	store::{FileTokenCache, TokenCache, WriteOutcome},
};

const USERNAME: &str = "api-user@example.com";
const PASSWORD: &str = "correct horse battery staple";

fn start() -> OffsetDateTime {
	macros::datetime!(2025-06-02 09:00 UTC)
}

async fn mock_login_success<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/authenticate")
				.header("content-type", "application/json")
				.json_body(json!({ "username": USERNAME, "password": PASSWORD }));
			then.status(200).json_body(json!({ "token": token }));
		})
		.await
}

async fn mock_login_rejected(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/authenticate");
			then.status(401).json_body(json!({
				"ValidationErrors": [{ "property": "password", "message": "Invalid credentials." }]
			}));
		})
		.await
}

fn temp_cache_path(label: &str) -> std::path::PathBuf {
	let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();

	std::env::temp_dir()
		.join(format!("creditsafe-connect-it-{label}-{}-{nanos}", std::process::id()))
		.join("tokens.json")
}

#[tokio::test]
async fn fresh_session_authenticates_once_then_serves_cache() {
	let server = MockServer::start_async().await;
	let login = mock_login_success(&server, "token-fresh").await;
	let (client, clock) =
		build_reqwest_test_client(test_descriptor(&server.url("/v1")), USERNAME, PASSWORD, start());
	let first = client.get_token().await.expect("First lookup should authenticate.");

	assert_eq!(first.token.expose(), "token-fresh");
	assert_eq!(first.expires_at, start() + Duration::seconds(3600));

	clock.advance(Duration::seconds(10));

	let second = client.get_token().await.expect("Second lookup should hit the cache.");

	assert_eq!(second, first);

	login.assert_calls_async(1).await;

	let state =
		client.session_store.load(&client.session).await.expect("Session state should load.");

	assert_eq!(state.global_request_count, 1);
	assert_eq!(state.invalid_attempts, 0);
}

#[tokio::test]
async fn fifth_attempt_after_four_rejections_is_refused_locally() {
	let server = MockServer::start_async().await;
	let login = mock_login_rejected(&server).await;
	let (client, clock) =
		build_reqwest_test_client(test_descriptor(&server.url("/v1")), USERNAME, PASSWORD, start());

	for attempt in 0..4 {
		let err = client.get_token().await.expect_err("Rejected credentials should fail.");

		assert!(
			matches!(&err, Error::AuthRejected { errors } if errors == &["Invalid credentials."]),
			"Attempt {attempt} should be rejected by the service, got {err:?}."
		);

		clock.advance(Duration::seconds(15));
	}

	// Last rejection landed at +45s; the clock now reads +60s.
	let err = client.get_token().await.expect_err("The fifth attempt should be throttled.");

	match err {
		Error::RateLimited { reason, retry_after } => {
			assert_eq!(reason, RateLimitReason::TooManyInvalidAttempts);
			assert_eq!(retry_after, Duration::seconds(105));
		},
		other => panic!("Expected a local refusal, got {other:?}."),
	}

	login.assert_calls_async(4).await;

	clock.advance(Duration::seconds(106));

	let err = client.get_token().await.expect_err("The cooled-down attempt should reach the service.");

	assert!(matches!(err, Error::AuthRejected { .. }));

	login.assert_calls_async(5).await;
}

#[tokio::test]
async fn success_keeps_invalid_attempt_history_by_default() {
	let server = MockServer::start_async().await;
	let rejected = mock_login_rejected(&server).await;
	let (client, _clock) =
		build_reqwest_test_client(test_descriptor(&server.url("/v1")), USERNAME, PASSWORD, start());

	for _ in 0..3 {
		client.authenticate().await.expect_err("Rejected credentials should fail.");
	}

	rejected.delete_async().await;

	let accepted = mock_login_success(&server, "token-after-rejections").await;

	client.authenticate().await.expect("Valid credentials should log in.");

	let state =
		client.session_store.load(&client.session).await.expect("Session state should load.");

	assert_eq!(state.invalid_attempts, 3);

	accepted.assert_calls_async(1).await;
}

#[tokio::test]
async fn reset_policy_clears_history_after_success() {
	let server = MockServer::start_async().await;
	let rejected = mock_login_rejected(&server).await;
	let descriptor = ServiceDescriptor::builder()
		.base_url(Url::parse(&server.url("/v1")).expect("Mock base URL should parse."))
		.rate_limit(RateLimitPolicy { reset_invalid_attempts_on_success: true, ..Default::default() })
		.build()
		.expect("Descriptor with reset policy should build.");
	let (client, _clock) = build_reqwest_test_client(descriptor, USERNAME, PASSWORD, start());

	client.authenticate().await.expect_err("Rejected credentials should fail.");
	rejected.delete_async().await;
	mock_login_success(&server, "token-reset").await;
	client.authenticate().await.expect("Valid credentials should log in.");

	let state =
		client.session_store.load(&client.session).await.expect("Session state should load.");

	assert_eq!(state.invalid_attempts, 0);
	assert_eq!(state.last_invalid_attempt_at, None);
}

#[tokio::test]
async fn global_cap_arms_lockout_without_counting_refusals() {
	let server = MockServer::start_async().await;
	let login = mock_login_success(&server, "token-capped").await;
	let policy = RateLimitPolicy { max_global_requests: 2, ..Default::default() };
	let descriptor = ServiceDescriptor::builder()
		.base_url(Url::parse(&server.url("/v1")).expect("Mock base URL should parse."))
		.rate_limit(policy)
		.build()
		.expect("Descriptor with a small cap should build.");
	let (client, clock) = build_reqwest_test_client(descriptor, USERNAME, PASSWORD, start());

	client.authenticate().await.expect("First login should pass the gate.");
	client.authenticate().await.expect("Second login should pass the gate.");

	let err = client.authenticate().await.expect_err("Third login should trip the cap.");

	assert!(matches!(
		err,
		Error::RateLimited { reason: RateLimitReason::GlobalVolumeCap, retry_after }
			if retry_after == Duration::seconds(240)
	));

	clock.advance(Duration::seconds(100));

	let err = client.authenticate().await.expect_err("The lockout should still hold.");

	assert!(matches!(
		err,
		Error::RateLimited { reason: RateLimitReason::GlobalVolumeCap, retry_after }
			if retry_after == Duration::seconds(140)
	));

	let state =
		client.session_store.load(&client.session).await.expect("Session state should load.");

	assert_eq!(state.global_request_count, 3);
	assert_eq!(state.global_lockout_at, Some(start()));

	login.assert_calls_async(2).await;
	clock.advance(Duration::seconds(140));
	client.authenticate().await.expect("Login should pass once the lockout elapses.");
	login.assert_calls_async(3).await;
}

#[tokio::test]
async fn unexpected_login_payload_is_not_an_invalid_attempt() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/authenticate");
			then.status(502).body("<html>Bad Gateway</html>");
		})
		.await;

	let (client, _clock) =
		build_reqwest_test_client(test_descriptor(&server.url("/v1")), USERNAME, PASSWORD, start());
	let err = client.get_token().await.expect_err("A gateway page should not yield a token.");

	assert!(matches!(err, Error::UnexpectedResponse { status: Some(502), .. }));

	let state =
		client.session_store.load(&client.session).await.expect("Session state should load.");

	assert_eq!(state.invalid_attempts, 0);
	assert_eq!(state.global_request_count, 1);
}

#[tokio::test]
async fn concurrent_lookups_share_one_login() {
	let server = MockServer::start_async().await;
	let login = mock_login_success(&server, "token-shared").await;
	let (client, _clock) =
		build_reqwest_test_client(test_descriptor(&server.url("/v1")), USERNAME, PASSWORD, start());
	let other = client.clone();
	let (first, second) = tokio::join!(client.get_token(), other.get_token());
	let first = first.expect("First concurrent lookup should succeed.");
	let second = second.expect("Second concurrent lookup should succeed.");

	assert_eq!(first.token.expose(), "token-shared");
	assert_eq!(second, first);

	login.assert_calls_async(1).await;
}

#[tokio::test]
async fn file_cache_is_shared_between_clients() {
	let server = MockServer::start_async().await;
	let login = mock_login_success(&server, "token-on-disk").await;
	let path = temp_cache_path("shared");
	let descriptor = test_descriptor(&server.url("/v1"));
	let (first, _) = build_reqwest_test_client(descriptor.clone(), USERNAME, PASSWORD, start());
	let first = first.with_token_cache(Arc::new(
		FileTokenCache::open(&path).expect("Token cache file should open."),
	));
	let (second, _) = build_reqwest_test_client(descriptor, USERNAME, PASSWORD, start());
	let second = second.with_token_cache(Arc::new(
		FileTokenCache::open(&path).expect("Token cache file should reopen."),
	));

	first.get_token().await.expect("First client should authenticate.");

	let reused = second.get_token().await.expect("Second client should read the file cache.");

	assert_eq!(reused.token.expose(), "token-on-disk");

	login.assert_calls_async(1).await;

	let raw = std::fs::read_to_string(&path).expect("Cache file should be readable.");
	let stored: serde_json::Value = serde_json::from_str(&raw).expect("Cache file should be JSON.");

	assert_eq!(stored[USERNAME]["token"], "token-on-disk");
	assert_eq!(stored[USERNAME]["expiry_time"], (start() + Duration::hours(1)).unix_timestamp());
}

#[tokio::test]
async fn losing_a_cache_race_adopts_the_cached_token() {
	let server = MockServer::start_async().await;

	mock_login_success(&server, "token-late").await;

	let (client, _clock) =
		build_reqwest_test_client(test_descriptor(&server.url("/v1")), USERNAME, PASSWORD, start());
	let owner = AccountId::new(USERNAME).expect("Account fixture should be valid.");
	let winner = CachedToken::new(owner, "token-first", start() + Duration::minutes(30));
	let outcome = client
		.token_cache
		.write(winner.clone(), start())
		.await
		.expect("Seeding the cache should succeed.");

	assert_eq!(outcome, WriteOutcome::Written);

	let token = client.authenticate().await.expect("Login should succeed.");

	assert_eq!(token, winner);
	assert_eq!(client.held_token(), Some(winner));
}

#[derive(Debug)]
struct TimeoutTransport;
impl ApiHttpClient for TimeoutTransport {
	fn execute(&self, request: ApiRequest) -> HttpFuture<'_> {
		Box::pin(async move { Err(TransportError::Timeout { url: request.url.to_string() }) })
	}
}

#[tokio::test]
async fn transport_failures_never_count_as_invalid_attempts() {
	let credential = Credential::new(USERNAME, PASSWORD).expect("Credential should be valid.");
	let client: Client<TimeoutTransport> = Client::with_http_client(
		test_descriptor("https://connect.example.com/v1"),
		credential,
		TimeoutTransport,
	);

	for _ in 0..5 {
		let err = client.get_token().await.expect_err("Timeouts should surface.");

		assert!(matches!(err, Error::Transport(TransportError::Timeout { .. })));
	}

	let state =
		client.session_store.load(&client.session).await.expect("Session state should load.");

	assert_eq!(state.invalid_attempts, 0);
	assert_eq!(state.global_request_count, 5);
}
