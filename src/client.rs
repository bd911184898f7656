//! The service client: credential lifecycle plus authorized request dispatch.

pub mod auth;
pub mod dispatch;

pub use auth::*;
pub use dispatch::*;

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credential, SessionId},
	clock::{Clock, SystemClock},
	http::ApiHttpClient,
	limiter::RateLimiter,
	service::ServiceDescriptor,
	session::{MemorySessionStore, SessionStore},
	store::{MemoryTokenCache, TokenCache},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestConnectClient = Client<ReqwestHttpClient>;

/// Talks to one service deployment on behalf of one account and one session.
///
/// The client owns the transport, the shared token cache, the session store holding
/// its rate state, and the clock every expiry and lockout decision is made against.
/// Clones share the in-memory token and the single-flight guard, so a clone handed to
/// another task still authenticates at most once at a time.
pub struct Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// HTTP transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Token cache shared with other clients of the same account.
	pub token_cache: Arc<dyn TokenCache>,
	/// Store that owns the session's rate state.
	pub session_store: Arc<dyn SessionStore>,
	/// Session whose rate state this client consumes.
	pub session: SessionId,
	/// Where the service lives and which limits apply.
	pub descriptor: ServiceDescriptor,
	/// Time source for expiry and rate-limit decisions.
	pub clock: Arc<dyn Clock>,
	credential: Credential,
	limiter: RateLimiter,
	held_token: Arc<RwLock<Option<CachedToken>>>,
	auth_guard: Arc<AsyncMutex<()>>,
}
impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client over the caller-provided transport.
	///
	/// Defaults to an in-memory token cache, an in-memory session store under
	/// [`SessionId::process_default`], and the system clock.
	pub fn with_http_client(
		descriptor: ServiceDescriptor,
		credential: Credential,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			token_cache: Arc::new(MemoryTokenCache::default()),
			session_store: Arc::new(MemorySessionStore::default()),
			session: SessionId::process_default(),
			limiter: RateLimiter::new(descriptor.rate_limit.clone()),
			descriptor,
			clock: Arc::new(SystemClock),
			credential,
			held_token: Default::default(),
			auth_guard: Default::default(),
		}
	}

	/// Replaces the token cache (for example with a shared
	/// [`FileTokenCache`](crate::store::FileTokenCache)).
	pub fn with_token_cache(mut self, cache: Arc<dyn TokenCache>) -> Self {
		self.token_cache = cache;

		self
	}

	/// Binds the client to `session` inside `store`.
	pub fn with_session(mut self, store: Arc<dyn SessionStore>, session: SessionId) -> Self {
		self.session_store = store;
		self.session = session;

		self
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Credential presented at login.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	/// Rate limiter built from the descriptor's policy.
	pub fn limiter(&self) -> &RateLimiter {
		&self.limiter
	}

	/// Token currently held in memory, if it is still usable.
	pub fn held_token(&self) -> Option<CachedToken> {
		let now = self.clock.now();

		self.held_token.read().as_ref().filter(|token| token.is_usable_at(now)).cloned()
	}

	fn hold(&self, token: CachedToken) {
		*self.held_token.write() = Some(token);
	}
}
#[cfg(feature = "reqwest")]
impl Client<ReqwestHttpClient> {
	/// Creates a client over a default reqwest transport.
	pub fn new(descriptor: ServiceDescriptor, credential: Credential) -> Self {
		Self::with_http_client(descriptor, credential, ReqwestHttpClient::default())
	}
}
impl<C> Clone for Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			token_cache: self.token_cache.clone(),
			session_store: self.session_store.clone(),
			session: self.session.clone(),
			descriptor: self.descriptor.clone(),
			clock: self.clock.clone(),
			credential: self.credential.clone(),
			limiter: self.limiter.clone(),
			held_token: self.held_token.clone(),
			auth_guard: self.auth_guard.clone(),
		}
	}
}
impl<C> Debug for Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("descriptor", &self.descriptor)
			.field("credential", &self.credential)
			.field("session", &self.session)
			.field("token_held", &self.held_token.read().is_some())
			.finish()
	}
}
