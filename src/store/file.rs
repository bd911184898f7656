//! File-backed [`TokenCache`] shared by every process that points at the same path.
//!
//! The data file holds `{ "<username>": { "token": "...", "expiry_time": <unix secs> } }`.
//! Each read-check-write runs under an exclusive lock on a sidecar `<file>.lock`, and the
//! data file is replaced atomically through a temp file so readers never observe a torn
//! mapping.

// std
use std::{
	fs::{self, File, OpenOptions},
	io::Write,
	path::{Path, PathBuf},
};
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{AccountId, CachedToken, Secret},
	store::{self, StoreError, StoreFuture, TokenCache, WriteOutcome},
};

/// Persists tokens to a JSON file under cross-process locking.
#[derive(Clone, Debug)]
pub struct FileTokenCache(JsonFile);
impl FileTokenCache {
	/// Opens (or creates) a cache at `path`.
	///
	/// A missing file is created empty so the first read has something to lock against.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		JsonFile::open(path).map(Self)
	}

	/// Path of the JSON data file.
	pub fn path(&self) -> &Path {
		self.0.path()
	}
}
impl TokenCache for FileTokenCache {
	fn read<'a>(
		&'a self,
		owner: &'a AccountId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<CachedToken>> {
		Box::pin(async move {
			let entries = self.0.read::<CacheEntry>()?;

			Ok(entries
				.get(owner.as_ref())
				.map(|entry| entry.to_token(owner))
				.filter(|token| token.is_usable_at(now)))
		})
	}

	fn write(&self, token: CachedToken, now: OffsetDateTime) -> StoreFuture<'_, WriteOutcome> {
		Box::pin(async move {
			self.0.update::<CacheEntry, _>(|entries| {
				let existing = entries.get(token.owner.as_ref()).map(|entry| entry.to_token(&token.owner));

				if !store::should_replace(existing.as_ref(), now) {
					return (existing.map_or(WriteOutcome::Written, WriteOutcome::Kept), false);
				}

				entries.insert(token.owner.to_string(), CacheEntry::from(&token));

				(WriteOutcome::Written, true)
			})
		})
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CacheEntry {
	token: Secret,
	#[serde(with = "time::serde::timestamp")]
	expiry_time: OffsetDateTime,
}
impl CacheEntry {
	fn to_token(&self, owner: &AccountId) -> CachedToken {
		CachedToken { owner: owner.clone(), token: self.token.clone(), expires_at: self.expiry_time }
	}
}
impl From<&CachedToken> for CacheEntry {
	fn from(token: &CachedToken) -> Self {
		Self { token: token.token.clone(), expiry_time: token.expires_at }
	}
}

/// JSON object file keyed by string, guarded by an advisory lock on a sidecar file.
///
/// Shared by the token cache and the file-backed session store.
#[derive(Clone, Debug)]
pub(crate) struct JsonFile {
	path: PathBuf,
	lock_path: PathBuf,
	tmp_path: PathBuf,
}
impl JsonFile {
	pub(crate) fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		let this =
			Self { lock_path: sibling(&path, ".lock"), tmp_path: sibling(&path, ".tmp"), path };
		let _guard = this.lock_exclusive()?;

		if !this.path.exists() {
			File::create(&this.path).map_err(|e| backend("create", &this.path, e))?;
		}

		Ok(this)
	}

	pub(crate) fn path(&self) -> &Path {
		&self.path
	}

	/// Loads the mapping under a shared lock.
	pub(crate) fn read<V>(&self) -> Result<BTreeMap<String, V>, StoreError>
	where
		V: DeserializeOwned,
	{
		let _guard = self.lock_shared()?;

		self.load()
	}

	/// Runs `op` over the mapping under an exclusive lock, persisting when it reports a change.
	pub(crate) fn update<V, T>(
		&self,
		op: impl FnOnce(&mut BTreeMap<String, V>) -> (T, bool),
	) -> Result<T, StoreError>
	where
		V: Serialize + DeserializeOwned,
	{
		let _guard = self.lock_exclusive()?;
		let mut contents = self.load()?;
		let (output, changed) = op(&mut contents);

		if changed {
			self.persist(&contents)?;
		}

		Ok(output)
	}

	fn lock_file(&self) -> Result<File, StoreError> {
		OpenOptions::new()
			.create(true)
			.truncate(false)
			.read(true)
			.write(true)
			.open(&self.lock_path)
			.map_err(|e| backend("open lock", &self.lock_path, e))
	}

	fn lock_shared(&self) -> Result<File, StoreError> {
		let file = self.lock_file()?;

		file.lock_shared().map_err(|e| backend("lock", &self.lock_path, e))?;

		Ok(file)
	}

	fn lock_exclusive(&self) -> Result<File, StoreError> {
		let file = self.lock_file()?;

		file.lock().map_err(|e| backend("lock", &self.lock_path, e))?;

		Ok(file)
	}

	fn load<V>(&self) -> Result<BTreeMap<String, V>, StoreError>
	where
		V: DeserializeOwned,
	{
		if !self.path.exists() {
			return Ok(BTreeMap::new());
		}

		let bytes = fs::read(&self.path).map_err(|e| backend("read", &self.path, e))?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(BTreeMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", self.path.display()),
		})
	}

	fn persist<V>(&self, contents: &BTreeMap<String, V>) -> Result<(), StoreError>
	where
		V: Serialize,
	{
		let serialized = serde_json::to_vec(contents).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize {}: {e}", self.path.display()),
		})?;
		let tmp_path = &self.tmp_path;

		{
			let mut file = File::create(tmp_path).map_err(|e| backend("create", tmp_path, e))?;

			file.write_all(&serialized).map_err(|e| backend("write", tmp_path, e))?;
			file.sync_all().map_err(|e| backend("sync", tmp_path, e))?;
		}

		fs::rename(tmp_path, &self.path).map_err(|e| backend("replace", &self.path, e))
	}
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| backend("create directory", parent, e))?;
	}

	Ok(())
}

/// `path` with `suffix` appended to its full file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
	let mut name = path.file_name().map(|name| name.to_os_string()).unwrap_or_default();

	name.push(suffix);

	path.with_file_name(name)
}

fn backend(action: &str, path: &Path, err: std::io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {err}", path.display()) }
}
