//! KYC Protect profile management.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	api,
	client::{ApiCall, ApiResponse, Client},
	http::ApiHttpClient,
};

const PROFILES_PATH: &str = "/compliance/kyc-protect/profiles";
const CREATE_PROFILE_STATUSES: &[u16] = &[201, 400, 401, 403, 409];

/// Entity types a KYC profile can describe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProfileKind {
	/// `trust`
	Trust,
	/// `individual`
	Individual,
	/// `soleTrader`
	SoleTrader,
	/// `company`
	Company,
	/// `plc`
	Plc,
	/// `partnership`
	Partnership,
	/// `otherEntity`
	OtherEntity,
}
impl ProfileKind {
	/// Every kind, in documentation order.
	pub const ALL: [Self; 7] = [
		Self::Trust,
		Self::Individual,
		Self::SoleTrader,
		Self::Company,
		Self::Plc,
		Self::Partnership,
		Self::OtherEntity,
	];

	/// Wire name of the kind.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Trust => "trust",
			Self::Individual => "individual",
			Self::SoleTrader => "soleTrader",
			Self::Company => "company",
			Self::Plc => "plc",
			Self::Partnership => "partnership",
			Self::OtherEntity => "otherEntity",
		}
	}
}
impl Display for ProfileKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for ProfileKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| api::invalid(format!("invalid profile type `{s}`")))
	}
}

/// Payload for [`Client::create_profile`].
///
/// `details.legalName` is mandatory; the remaining documented fields are optional and
/// omitted from the payload when unset. Anything else goes into `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProfile {
	/// Profile name, unique across profiles.
	pub name: String,
	/// Entity type.
	#[serde(rename = "type")]
	pub kind: ProfileKind,
	/// Entity details; must carry a non-empty `legalName`.
	pub details: Map<String, Value>,
	/// Caller-side reference.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub internal_id: Option<String>,
	/// User the profile is assigned to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub assigned_to_id: Option<String>,
	/// Next KYC review date.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kyc_review_on: Option<String>,
	/// Profile status.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	/// Risk rating label.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub risk_rating: Option<String>,
	/// Free-form reviewer comments.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub kyc_comments: Option<String>,
	/// Additional fields merged into the payload as-is.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl NewProfile {
	/// Creates a profile payload with the mandatory legal name.
	pub fn new(name: impl Into<String>, kind: ProfileKind, legal_name: impl Into<String>) -> Self {
		let mut details = Map::new();

		details.insert("legalName".into(), Value::String(legal_name.into()));

		Self {
			name: name.into(),
			kind,
			details,
			internal_id: None,
			assigned_to_id: None,
			kyc_review_on: None,
			status: None,
			risk_rating: None,
			kyc_comments: None,
			extra: Map::new(),
		}
	}

	/// Adds an entry to `details`.
	pub fn detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.details.insert(key.into(), value.into());

		self
	}

	/// Sets the caller-side reference.
	pub fn internal_id(mut self, id: impl Into<String>) -> Self {
		self.internal_id = Some(id.into());

		self
	}

	fn validate(&self) -> Result<()> {
		if self.name.trim().is_empty() {
			return Err(api::invalid("'name' must not be empty"));
		}

		match self.details.get("legalName").and_then(Value::as_str) {
			Some(legal_name) if !legal_name.trim().is_empty() => Ok(()),
			_ => Err(api::invalid("'legalName' is required in 'details'")),
		}
	}
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a KYC profile (`POST /compliance/kyc-protect/profiles`).
	///
	/// Documented statuses: 201, 400, 401, 403, 409 (name already taken).
	pub async fn create_profile(&self, profile: &NewProfile) -> Result<ApiResponse> {
		profile.validate()?;

		let call = ApiCall::post("create profile", PROFILES_PATH, api::to_payload(profile)?)
			.expecting(CREATE_PROFILE_STATUSES);

		self.send(&call).await
	}
}
