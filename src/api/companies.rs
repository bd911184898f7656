//! Company search and its criteria discovery.

// self
use crate::{
	_prelude::*,
	api,
	client::{ApiCall, ApiResponse, Client},
	http::ApiHttpClient,
};

const SEARCH_PATH: &str = "/companies";
const CRITERIA_PATH: &str = "/companies/searchcriteria";
const SEARCH_STATUSES: &[u16] = &[200, 400, 401];
const CRITERIA_STATUSES: &[u16] = &[200, 400, 401, 403];

/// Query parameters for the company endpoints; `countries` is mandatory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompanyQuery {
	params: Vec<(String, String)>,
}
impl CompanyQuery {
	/// Starts a query scoped to a comma-separated list of ISO country codes (`"GB,IE"`).
	pub fn new(countries: impl Into<String>) -> Self {
		Self::default().param("countries", countries)
	}

	/// Company name filter.
	pub fn name(self, name: impl Into<String>) -> Self {
		self.param("name", name)
	}

	/// Registration number filter.
	pub fn reg_no(self, reg_no: impl Into<String>) -> Self {
		self.param("regNo", reg_no)
	}

	/// One-based result page.
	pub fn page(self, page: u32) -> Self {
		self.param("page", page.to_string())
	}

	/// Results per page.
	pub fn page_size(self, size: u32) -> Self {
		self.param("pageSize", size.to_string())
	}

	/// Sets any other documented parameter, replacing an earlier value for `key`.
	pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let key = key.into();
		let value = value.into();

		match self.params.iter_mut().find(|(k, _)| *k == key) {
			Some(slot) => slot.1 = value,
			None => self.params.push((key, value)),
		}

		self
	}

	/// Country filter, if set.
	pub fn countries(&self) -> Option<&str> {
		self.params.iter().find(|(k, _)| k == "countries").map(|(_, v)| v.as_str())
	}

	/// Parameters in insertion order.
	pub fn params(&self) -> &[(String, String)] {
		&self.params
	}

	fn validate(&self) -> Result<()> {
		match self.countries() {
			Some(countries) if !countries.trim().is_empty() => Ok(()),
			_ => Err(api::invalid("'countries' must be present and a non-empty string")),
		}
	}
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Searches companies (`GET /companies`).
	///
	/// Documented statuses: 200, 400, 401.
	pub async fn company_search(&self, query: &CompanyQuery) -> Result<ApiResponse> {
		query.validate()?;

		let call = ApiCall::get("search companies", SEARCH_PATH)
			.with_query(query.params().iter().cloned())
			.expecting(SEARCH_STATUSES);

		self.send(&call).await
	}

	/// Lists the search parameters available for the queried countries
	/// (`GET /companies/searchcriteria`).
	///
	/// Documented statuses: 200, 400, 401, 403.
	pub async fn company_search_criteria(&self, query: &CompanyQuery) -> Result<ApiResponse> {
		query.validate()?;

		let call = ApiCall::get("fetch company search criteria", CRITERIA_PATH)
			.with_query(query.params().iter().cloned())
			.expecting(CRITERIA_STATUSES);

		self.send(&call).await
	}
}
