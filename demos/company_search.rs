//! Demonstrates a company search against a local mock of the service, with the token shared
//! through a file cache so a second client skips the login entirely.
//!
//! Run with `RUST_LOG=creditsafe_connect=debug` to see the cache hit/miss events.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use url::Url;
// self
use creditsafe_connect::{
	api::CompanyQuery,
	auth::Credential,
	client::Client,
	http::ReqwestHttpClient,
	service::ServiceDescriptor,
	store::FileTokenCache,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/authenticate");
			then.status(200).json_body(json!({ "token": "demo-bearer" }));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/companies").header("authorization", "Bearer demo-bearer");
			then.status(200).json_body(json!({
				"totalSize": 1,
				"companies": [{ "id": "GB-0-01234567", "name": "ACME TRADING LTD" }]
			}));
		})
		.await;

	let descriptor = ServiceDescriptor::builder().base_url(Url::parse(&server.url("/v1"))?).build()?;
	let cache_path = std::env::temp_dir().join("creditsafe-connect-demo").join("tokens.json");
	let cache = Arc::new(FileTokenCache::open(&cache_path)?);
	let query = CompanyQuery::new("GB").name("Acme").page_size(10);

	for worker in ["first", "second"] {
		let credential = Credential::new("demo-user", "demo-password")?;
		let client: Client<ReqwestHttpClient> = Client::new(descriptor.clone(), credential);
		let client = client.with_token_cache(cache.clone());
		let response = client.company_search(&query).await?;

		println!("{worker} client -> status {}: {:?}", response.status, response.body);
	}

	println!("login calls: {} (cache at {})", login.calls_async().await, cache_path.display());

	Ok(())
}
