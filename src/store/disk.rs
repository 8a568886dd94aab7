//! On-disk + in-memory [`Store`]: the sole [`CredentialStore`] implementation.
//!
//! `clients.json` and `refresh_tokens.json` are the durable subset (§4.A); codes,
//! access tokens, and pending authorizations live only in the in-process maps and
//! never touch disk (invariant 8).

// std
use std::{
	fs::{self, File},
	io::Write as _,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, ClientRegistration, PendingAuthorization, RedeemedCode,
		RefreshToken,
	},
	store::{CredentialStore, StoreError, SweepReport},
};

const CLIENTS_FILE: &str = "clients.json";
const REFRESH_TOKENS_FILE: &str = "refresh_tokens.json";

/// All state guarded by [`Store`]'s single lock, matching the spec's "one
/// mutual-exclusion section guards the whole store" concurrency model.
#[derive(Default)]
struct StoreState {
	clients: HashMap<String, ClientRegistration>,
	refresh_tokens: HashMap<String, RefreshToken>,
	codes: HashMap<String, AuthorizationCode>,
	access_tokens: HashMap<String, AccessToken>,
	pending: HashMap<String, PendingAuthorization>,
	redeemed_codes: HashMap<String, RedeemedCode>,
}

/// Credential store backed by a directory of JSON snapshots plus in-memory-only
/// ephemeral maps, guarded by a single lock (§4.A, §5).
#[derive(Clone)]
pub struct Store {
	dir: PathBuf,
	state: Arc<RwLock<StoreState>>,
}
impl Store {
	/// Opens (or creates) a store rooted at `dir`, hydrating `clients.json` and
	/// `refresh_tokens.json` if present. A missing or empty file yields an empty map
	/// (§4.A "Readers... tolerate a missing or empty file").
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();

		fs::create_dir_all(&dir).map_err(|e| StoreError::Backend {
			message: format!("failed to create store directory {}: {e}", dir.display()),
		})?;

		let clients = Self::load_map(&dir.join(CLIENTS_FILE))?;
		let mut refresh_tokens: HashMap<String, RefreshToken> =
			Self::load_map(&dir.join(REFRESH_TOKENS_FILE))?;
		let cutoff = now();

		refresh_tokens.retain(|_, record| !record.is_expired(cutoff));

		let state = StoreState { clients, refresh_tokens, ..Default::default() };

		Ok(Self { dir, state: Arc::new(RwLock::new(state)) })
	}

	fn load_map<T>(path: &Path) -> Result<HashMap<String, T>, StoreError>
	where
		T: serde::de::DeserializeOwned,
	{
		if !path.exists() {
			return Ok(HashMap::new());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(HashMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("failed to parse {}: {e}", path.display()),
		})
	}

	fn persist_map<T>(&self, file_name: &str, map: &HashMap<String, T>) -> Result<(), StoreError>
	where
		T: Serialize,
	{
		let path = self.dir.join(file_name);
		let serialized = serde_json::to_vec_pretty(map).map_err(|e| StoreError::Serialization {
			message: format!("failed to serialize {file_name}: {e}"),
		})?;
		let mut tmp_path = path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &path).map_err(|e| StoreError::Backend {
			message: format!("failed to replace {}: {e}", path.display()),
		})
	}

	fn persist_clients_locked(&self, state: &StoreState) -> Result<(), StoreError> {
		self.persist_map(CLIENTS_FILE, &state.clients)
	}

	fn persist_refresh_tokens_locked(&self, state: &StoreState) -> Result<(), StoreError> {
		self.persist_map(REFRESH_TOKENS_FILE, &state.refresh_tokens)
	}
}
impl CredentialStore for Store {
	fn register_client(&self, record: ClientRegistration) -> Result<(), StoreError> {
		let mut state = self.state.write();

		if state.clients.contains_key(&record.client_id) {
			return Err(StoreError::Conflict { client_id: record.client_id });
		}

		state.clients.insert(record.client_id.clone(), record);
		self.persist_clients_locked(&state)
	}

	fn get_client(&self, client_id: &str) -> Result<ClientRegistration, StoreError> {
		self.state
			.read()
			.clients
			.get(client_id)
			.cloned()
			.ok_or_else(|| StoreError::NotFound { key: client_id.to_owned() })
	}

	fn add_code(&self, record: AuthorizationCode) -> Result<(), StoreError> {
		self.state.write().codes.insert(record.code.clone(), record);

		Ok(())
	}

	fn consume_code(&self, code: &str) -> Result<AuthorizationCode, StoreError> {
		let mut state = self.state.write();
		let record = state
			.codes
			.remove(code)
			.ok_or_else(|| StoreError::NotFound { key: code.to_owned() })?;

		if record.is_expired(now()) {
			return Err(StoreError::Expired { key: code.to_owned() });
		}

		Ok(record)
	}

	fn record_redeemed_code(&self, code: &str, record: RedeemedCode) -> Result<(), StoreError> {
		self.state.write().redeemed_codes.insert(code.to_owned(), record);

		Ok(())
	}

	fn lookup_redeemed_code(&self, code: &str) -> Result<RedeemedCode, StoreError> {
		self.state
			.read()
			.redeemed_codes
			.get(code)
			.cloned()
			.ok_or_else(|| StoreError::NotFound { key: code.to_owned() })
	}

	fn add_access_token(&self, record: AccessToken) -> Result<(), StoreError> {
		self.state.write().access_tokens.insert(record.token.clone(), record);

		Ok(())
	}

	fn load_access_token(&self, token: &str) -> Result<AccessToken, StoreError> {
		let mut state = self.state.write();
		let Some(record) = state.access_tokens.get(token) else {
			return Err(StoreError::NotFound { key: token.to_owned() });
		};

		if record.is_expired(now()) {
			state.access_tokens.remove(token);

			return Err(StoreError::Expired { key: token.to_owned() });
		}

		Ok(record.clone())
	}

	fn add_refresh_token(&self, record: RefreshToken) -> Result<(), StoreError> {
		let mut state = self.state.write();

		state.refresh_tokens.insert(record.token.clone(), record);
		self.persist_refresh_tokens_locked(&state)
	}

	fn load_refresh_token(&self, token: &str) -> Result<RefreshToken, StoreError> {
		let mut state = self.state.write();
		let Some(record) = state.refresh_tokens.get(token) else {
			return Err(StoreError::NotFound { key: token.to_owned() });
		};

		if record.is_expired(now()) {
			state.refresh_tokens.remove(token);

			return Err(StoreError::Expired { key: token.to_owned() });
		}

		Ok(record.clone())
	}

	fn rotate_refresh(&self, old: &str, new: RefreshToken) -> Result<(), StoreError> {
		let mut state = self.state.write();
		let Some(existing) = state.refresh_tokens.get(old) else {
			return Err(StoreError::NotFound { key: old.to_owned() });
		};

		if existing.is_expired(now()) {
			return Err(StoreError::Expired { key: old.to_owned() });
		}

		state.refresh_tokens.remove(old);
		state.refresh_tokens.insert(new.token.clone(), new);
		self.persist_refresh_tokens_locked(&state)
	}

	fn revoke(&self, token: &str) -> Result<(), StoreError> {
		let mut state = self.state.write();

		state.access_tokens.remove(token);

		if state.refresh_tokens.remove(token).is_some() {
			self.persist_refresh_tokens_locked(&state)?;
		}

		Ok(())
	}

	fn put_pending(&self, state_key: String, record: PendingAuthorization) -> Result<(), StoreError> {
		self.state.write().pending.insert(state_key, record);

		Ok(())
	}

	fn take_pending(&self, state_key: &str) -> Result<PendingAuthorization, StoreError> {
		let mut state = self.state.write();
		let record = state
			.pending
			.remove(state_key)
			.ok_or_else(|| StoreError::NotFound { key: state_key.to_owned() })?;

		if record.is_expired(now()) {
			return Err(StoreError::Expired { key: state_key.to_owned() });
		}

		Ok(record)
	}

	fn sweep(&self, now: i64) -> SweepReport {
		let mut state = self.state.write();
		let mut report = SweepReport::default();

		let before = state.refresh_tokens.len();

		state.refresh_tokens.retain(|_, record| !record.is_expired(now));
		report.refresh_tokens = before - state.refresh_tokens.len();

		let before = state.access_tokens.len();

		state.access_tokens.retain(|_, record| !record.is_expired(now));
		report.access_tokens = before - state.access_tokens.len();

		let before = state.codes.len();

		state.codes.retain(|_, record| !record.is_expired(now));
		report.codes = before - state.codes.len();

		let before = state.pending.len();

		state.pending.retain(|_, record| !record.is_expired(now));
		report.pending = before - state.pending.len();

		let before = state.redeemed_codes.len();

		state.redeemed_codes.retain(|_, record| !record.is_expired(now));
		report.redeemed_codes = before - state.redeemed_codes.len();

		if report.refresh_tokens > 0 {
			if let Err(error) = self.persist_refresh_tokens_locked(&state) {
				tracing::warn!(%error, "failed to persist refresh tokens after sweep");
			}
		}

		report
	}

	fn flush(&self) -> Result<(), StoreError> {
		let state = self.state.read();

		self.persist_clients_locked(&state)?;
		self.persist_refresh_tokens_locked(&state)?;

		Ok(())
	}
}

fn now() -> i64 {
	OffsetDateTime::now_utc().unix_timestamp()
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;
	use crate::auth::ScopeSet;

	fn temp_dir() -> PathBuf {
		let unique = format!("mcp_oauth_core_store_{}_{}", process::id(), now());

		env::temp_dir().join(unique)
	}

	fn client_fixture(id: &str) -> ClientRegistration {
		ClientRegistration {
			client_id: id.into(),
			client_secret_hash: None,
			redirect_uris: vec!["https://app.example/cb".into()],
			scope: ScopeSet::new(["read"]),
			token_endpoint_auth_method: Default::default(),
			grant_types: vec!["authorization_code".into()],
			response_types: vec!["code".into()],
			client_name: None,
			issued_at: now(),
		}
	}

	#[test]
	fn register_client_rejects_duplicate_id() {
		let store = Store::open(temp_dir()).expect("should open store");

		store.register_client(client_fixture("dup")).expect("first registration should succeed");

		let err = store.register_client(client_fixture("dup")).expect_err("should reject duplicate");

		assert!(matches!(err, StoreError::Conflict { client_id } if client_id == "dup"));
	}

	#[test]
	fn refresh_tokens_survive_reopen() {
		let dir = temp_dir();
		let store = Store::open(&dir).expect("should open store");
		let token = RefreshToken {
			token: "rt-1".into(),
			client_id: "client-1".into(),
			scopes: ScopeSet::new(["read"]),
			expires_at: now() + 3600,
		};

		store.add_refresh_token(token.clone()).expect("should persist refresh token");
		drop(store);

		let reopened = Store::open(&dir).expect("should reopen store");
		let loaded = reopened
			.state
			.read()
			.refresh_tokens
			.get("rt-1")
			.cloned()
			.expect("refresh token should survive restart");

		assert_eq!(loaded.client_id, token.client_id);

		fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn load_refresh_token_does_not_consume_it() {
		let store = Store::open(temp_dir()).expect("should open store");
		let token = RefreshToken {
			token: "rt-peek".into(),
			client_id: "client-1".into(),
			scopes: ScopeSet::new(["read"]),
			expires_at: now() + 3600,
		};

		store.add_refresh_token(token).expect("should persist");

		let loaded = store.load_refresh_token("rt-peek").expect("should load");

		assert_eq!(loaded.client_id, "client-1");
		assert!(store.load_refresh_token("rt-peek").is_ok(), "peek must not remove the token");
	}

	#[test]
	fn consume_code_removes_it_atomically() {
		let store = Store::open(temp_dir()).expect("should open store");
		let code = AuthorizationCode {
			code: "code-1".into(),
			client_id: "client-1".into(),
			redirect_uri: "https://app.example/cb".into(),
			mcp_state: "st1".into(),
			scope: ScopeSet::new(["read"]),
			code_challenge: "challenge".into(),
			code_challenge_method: "S256".into(),
			identity: None,
			created_at: now(),
			expires_at: now() + 600,
		};

		store.add_code(code.clone()).expect("should store code");
		store.consume_code("code-1").expect("first consume should succeed");

		let err = store.consume_code("code-1").expect_err("second consume should fail");

		assert!(matches!(err, StoreError::NotFound { key } if key == "code-1"));
	}

	#[test]
	fn sweep_removes_expired_refresh_tokens_and_persists() {
		let dir = temp_dir();
		let store = Store::open(&dir).expect("should open store");

		store
			.add_refresh_token(RefreshToken {
				token: "expired".into(),
				client_id: "client-1".into(),
				scopes: ScopeSet::new(["read"]),
				expires_at: now() - 1,
			})
			.expect("should persist");

		let report = store.sweep(now());

		assert_eq!(report.refresh_tokens, 1);
		assert!(!store.state.read().refresh_tokens.contains_key("expired"));

		let reopened = Store::open(&dir).expect("should reopen store");

		assert!(!reopened.state.read().refresh_tokens.contains_key("expired"));

		fs::remove_dir_all(&dir).ok();
	}
}
