//! Service descriptor: where the API lives and which limits apply to it.
//!
//! Descriptors are plain serde values so hosts can load them from configuration. Both
//! [`ServiceDescriptorBuilder::build`] and deserialization run the same validation.

// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::DEFAULT_TOKEN_LIFETIME,
	error::ConfigError,
	limiter::RateLimitPolicy,
};

/// Deployments published by the provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
	/// Live data, billed usage.
	Production,
	/// Test deployment with synthetic data.
	#[default]
	Sandbox,
}
impl Environment {
	/// Versioned base URL for the deployment.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::Production => "https://connect.creditsafe.com/v1",
			Self::Sandbox => "https://connect.sandbox.creditsafe.com/v1",
		}
	}

	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Production => "production",
			Self::Sandbox => "sandbox",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ServiceDescriptorError {
	/// No base URL was configured.
	#[error("Missing base URL.")]
	MissingBaseUrl,
	/// The base URL must use HTTPS unless it targets a loopback host.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// URL that failed validation.
		url: String,
	},
	/// The base URL carries a query or fragment.
	#[error("The base URL must not carry a query or fragment: {url}.")]
	UnexpectedUrlSuffix {
		/// URL that failed validation.
		url: String,
	},
	/// Token lifetime must be positive.
	#[error("Token lifetime must be positive.")]
	NonPositiveTokenLifetime,
	/// Token lifetime exceeds [`MAX_CONFIGURED_DURATION`].
	#[error("Token lifetime must not exceed {} days.", MAX_CONFIGURED_DURATION.whole_days())]
	TokenLifetimeTooLong,
	/// A rate-limit threshold is unusable.
	#[error("Rate-limit policy is invalid: {reason}.")]
	InvalidRateLimit {
		/// Which threshold failed validation.
		reason: &'static str,
	},
}

/// Longest lifetime, window, or lockout a descriptor accepts.
pub const MAX_CONFIGURED_DURATION: Duration = Duration::days(366);

/// Immutable service descriptor consumed by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedDescriptor")]
pub struct ServiceDescriptor {
	/// Versioned base URL every endpoint path is appended to.
	pub base_url: Url,
	/// Lifetime assigned to freshly issued tokens.
	#[serde(with = "crate::limiter::duration_secs", default = "default_lifetime")]
	pub token_lifetime: Duration,
	/// Authentication throttling thresholds.
	#[serde(default)]
	pub rate_limit: RateLimitPolicy,
}
impl ServiceDescriptor {
	/// Creates an empty builder.
	pub fn builder() -> ServiceDescriptorBuilder {
		ServiceDescriptorBuilder::default()
	}

	/// Builder seeded with the base URL of `environment`.
	pub fn for_environment(environment: Environment) -> ServiceDescriptorBuilder {
		let builder = Self::builder();

		match Url::parse(environment.base_url()) {
			Ok(url) => builder.base_url(url),
			Err(_) => builder,
		}
	}

	/// Resolves `path` against the versioned base URL, keeping the version prefix.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let joined = format!(
			"{}/{}",
			self.base_url.as_str().trim_end_matches('/'),
			path.trim_start_matches('/')
		);

		Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	fn validate(&self) -> Result<(), ServiceDescriptorError> {
		validate_base_url(&self.base_url)?;

		if !self.token_lifetime.is_positive() {
			return Err(ServiceDescriptorError::NonPositiveTokenLifetime);
		}
		if self.token_lifetime > MAX_CONFIGURED_DURATION {
			return Err(ServiceDescriptorError::TokenLifetimeTooLong);
		}

		validate_policy(&self.rate_limit)
	}
}
impl TryFrom<UncheckedDescriptor> for ServiceDescriptor {
	type Error = ServiceDescriptorError;

	fn try_from(raw: UncheckedDescriptor) -> Result<Self, Self::Error> {
		let descriptor = Self {
			base_url: raw.base_url,
			token_lifetime: raw.token_lifetime,
			rate_limit: raw.rate_limit,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

/// Wire shape of [`ServiceDescriptor`] before validation.
#[derive(Deserialize)]
struct UncheckedDescriptor {
	base_url: Url,
	#[serde(with = "crate::limiter::duration_secs", default = "default_lifetime")]
	token_lifetime: Duration,
	#[serde(default)]
	rate_limit: RateLimitPolicy,
}

/// Builder for [`ServiceDescriptor`] values.
#[derive(Debug, Default)]
pub struct ServiceDescriptorBuilder {
	/// Versioned base URL.
	pub base_url: Option<Url>,
	/// Token lifetime override.
	pub token_lifetime: Option<Duration>,
	/// Rate-limit policy override.
	pub rate_limit: Option<RateLimitPolicy>,
}
impl ServiceDescriptorBuilder {
	/// Sets the versioned base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the token lifetime (defaults to one hour).
	pub fn token_lifetime(mut self, lifetime: Duration) -> Self {
		self.token_lifetime = Some(lifetime);

		self
	}

	/// Overrides the rate-limit policy.
	pub fn rate_limit(mut self, policy: RateLimitPolicy) -> Self {
		self.rate_limit = Some(policy);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ServiceDescriptor, ServiceDescriptorError> {
		let descriptor = ServiceDescriptor {
			base_url: self.base_url.ok_or(ServiceDescriptorError::MissingBaseUrl)?,
			token_lifetime: self.token_lifetime.unwrap_or(DEFAULT_TOKEN_LIFETIME),
			rate_limit: self.rate_limit.unwrap_or_default(),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn validate_base_url(url: &Url) -> Result<(), ServiceDescriptorError> {
	if url.query().is_some() || url.fragment().is_some() {
		return Err(ServiceDescriptorError::UnexpectedUrlSuffix { url: url.to_string() });
	}
	if url.scheme() == "https" || (url.scheme() == "http" && is_loopback(url)) {
		Ok(())
	} else {
		Err(ServiceDescriptorError::InsecureEndpoint { url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => ip.is_loopback(),
		Some(Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}

fn validate_policy(policy: &RateLimitPolicy) -> Result<(), ServiceDescriptorError> {
	let too_long = |duration: Duration| duration > MAX_CONFIGURED_DURATION;
	let reason = if !policy.global_window.is_positive() {
		"global_window must be positive"
	} else if policy.global_lockout.is_negative() {
		"global_lockout must not be negative"
	} else if policy.max_global_requests == 0 {
		"max_global_requests must be at least 1"
	} else if policy.invalid_attempt_window.is_negative() {
		"invalid_attempt_window must not be negative"
	} else if too_long(policy.global_window)
		|| too_long(policy.global_lockout)
		|| too_long(policy.invalid_attempt_window)
	{
		"durations must not exceed 366 days"
	} else {
		return Ok(());
	};

	Err(ServiceDescriptorError::InvalidRateLimit { reason })
}

fn default_lifetime() -> Duration {
	DEFAULT_TOKEN_LIFETIME
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor URL fixture.")
	}

	#[test]
	fn environments_resolve_versioned_urls() {
		let production = ServiceDescriptor::for_environment(Environment::Production)
			.build()
			.expect("Production descriptor should build.");
		let sandbox = ServiceDescriptor::for_environment(Environment::Sandbox)
			.build()
			.expect("Sandbox descriptor should build.");

		assert_eq!(production.base_url.as_str(), "https://connect.creditsafe.com/v1");
		assert_eq!(sandbox.base_url.as_str(), "https://connect.sandbox.creditsafe.com/v1");
		assert_eq!(sandbox.token_lifetime, Duration::hours(1));
		assert_eq!(sandbox.rate_limit, RateLimitPolicy::default());
	}

	#[test]
	fn endpoint_keeps_version_prefix() {
		let descriptor = ServiceDescriptor::for_environment(Environment::Sandbox)
			.build()
			.expect("Sandbox descriptor should build.");
		let endpoint =
			descriptor.endpoint("/companies/searchcriteria").expect("Endpoint should resolve.");

		assert_eq!(
			endpoint.as_str(),
			"https://connect.sandbox.creditsafe.com/v1/companies/searchcriteria"
		);
	}

	#[test]
	fn rejects_insecure_and_decorated_urls() {
		let err = ServiceDescriptor::builder()
			.base_url(url("http://connect.example.com/v1"))
			.build()
			.expect_err("Plain HTTP must be rejected for remote hosts.");

		assert!(matches!(err, ServiceDescriptorError::InsecureEndpoint { .. }));

		let err = ServiceDescriptor::builder()
			.base_url(url("https://connect.example.com/v1?debug=1"))
			.build()
			.expect_err("Query strings must be rejected.");

		assert!(matches!(err, ServiceDescriptorError::UnexpectedUrlSuffix { .. }));
		assert_eq!(
			ServiceDescriptor::builder().build().expect_err("Base URL is required."),
			ServiceDescriptorError::MissingBaseUrl
		);
	}

	#[test]
	fn loopback_http_is_allowed() {
		for base in ["http://127.0.0.1:8080/v1", "http://localhost/v1", "http://[::1]:9000"] {
			ServiceDescriptor::builder()
				.base_url(url(base))
				.build()
				.unwrap_or_else(|e| panic!("Loopback base {base} should be accepted: {e}"));
		}
	}

	#[test]
	fn rejects_unusable_limits() {
		let err = ServiceDescriptor::for_environment(Environment::Sandbox)
			.token_lifetime(Duration::ZERO)
			.build()
			.expect_err("Zero lifetimes must be rejected.");

		assert_eq!(err, ServiceDescriptorError::NonPositiveTokenLifetime);

		let err = ServiceDescriptor::for_environment(Environment::Sandbox)
			.rate_limit(RateLimitPolicy { max_global_requests: 0, ..Default::default() })
			.build()
			.expect_err("A zero global cap must be rejected.");

		assert!(matches!(err, ServiceDescriptorError::InvalidRateLimit { .. }));
	}

	#[test]
	fn descriptor_deserializes_with_defaults() {
		let descriptor: ServiceDescriptor = serde_json::from_value(serde_json::json!({
			"base_url": "https://connect.creditsafe.com/v1",
			"token_lifetime": 1800,
			"rate_limit": { "max_invalid_attempts": 3 }
		}))
		.expect("Descriptor should deserialize.");

		assert_eq!(descriptor.token_lifetime, Duration::minutes(30));
		assert_eq!(descriptor.rate_limit.max_invalid_attempts, 3);
		assert_eq!(descriptor.rate_limit.global_lockout, Duration::seconds(240));
	}

	#[test]
	fn deserialization_runs_validation() {
		let parse = |value: serde_json::Value| serde_json::from_value::<ServiceDescriptor>(value);

		parse(serde_json::json!({
			"base_url": "http://connect.example.com/v1?x=1",
			"token_lifetime": -5,
			"rate_limit": { "max_global_requests": 0, "global_window": 0 }
		}))
		.expect_err("Decorated plain-HTTP URLs must be rejected when loaded from config.");
		parse(serde_json::json!({
			"base_url": "https://connect.example.com/v1",
			"token_lifetime": -5
		}))
		.expect_err("Negative lifetimes must be rejected when loaded from config.");
		parse(serde_json::json!({
			"base_url": "https://connect.example.com/v1",
			"rate_limit": { "max_global_requests": 0 }
		}))
		.expect_err("A zero global cap must be rejected when loaded from config.");

		let err = parse(serde_json::json!({
			"base_url": "https://connect.example.com/v1",
			"rate_limit": { "max_global_requests": 1, "global_lockout": i64::MAX }
		}))
		.expect_err("Unbounded lockouts must be rejected when loaded from config.");

		assert!(err.to_string().contains("366 days"), "Unexpected error: {err}.");
	}

	#[test]
	fn rejects_oversized_durations() {
		let err = ServiceDescriptor::for_environment(Environment::Sandbox)
			.token_lifetime(Duration::seconds(i64::MAX))
			.build()
			.expect_err("Huge lifetimes must be rejected.");

		assert_eq!(err, ServiceDescriptorError::TokenLifetimeTooLong);

		ServiceDescriptor::for_environment(Environment::Sandbox)
			.token_lifetime(MAX_CONFIGURED_DURATION)
			.rate_limit(RateLimitPolicy {
				global_lockout: MAX_CONFIGURED_DURATION,
				..Default::default()
			})
			.build()
			.expect("The bound itself should be accepted.");
	}
}
