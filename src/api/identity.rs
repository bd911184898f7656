//! UK identity (AML) search.

// self
use crate::{
	_prelude::*,
	api,
	client::{ApiCall, ApiResponse, Client},
	http::ApiHttpClient,
};

const AML_SEARCH_PATH: &str = "/localSolutions/GB/identitysearch";
const AML_SEARCH_STATUSES: &[u16] = &[200, 400, 401, 403];

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Runs a GB identity search (`POST /localSolutions/GB/identitysearch`).
	///
	/// The payload is forwarded unchanged. Documented statuses: 200, 400, 401, 403.
	pub async fn aml_search(&self, payload: &impl Serialize) -> Result<ApiResponse> {
		let body = api::to_payload(payload)?;
		let call =
			ApiCall::post("run AML search", AML_SEARCH_PATH, body).expecting(AML_SEARCH_STATUSES);

		self.send(&call).await
	}
}
