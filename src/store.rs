//! Storage contract and the single on-disk + in-memory [`Store`] implementation
//! backing the authorization server's credential store (§4.A).

pub mod disk;

pub use disk::Store;

// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, ClientRegistration, PendingAuthorization, RedeemedCode,
		RefreshToken,
	},
};

/// Persistence and lookup contract for the five entity kinds (§3), implemented by
/// [`Store`]. Kept as a trait so handlers and the federation orchestrator depend on
/// the contract rather than the concrete backing, mirroring how the teacher's flows
/// depend on `BrokerStore` rather than `FileStore`/`MemoryStore` directly.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists a new client registration. Fails with [`StoreError::Conflict`] if the
	/// `client_id` is already registered.
	fn register_client(&self, record: ClientRegistration) -> Result<(), StoreError>;

	/// Fetches a client registration by id.
	fn get_client(&self, client_id: &str) -> Result<ClientRegistration, StoreError>;

	/// Stores a freshly minted authorization code in memory.
	fn add_code(&self, record: AuthorizationCode) -> Result<(), StoreError>;

	/// Removes and returns an authorization code, failing the exchange if it was
	/// already consumed, never existed, or has expired (invariant 2).
	fn consume_code(&self, code: &str) -> Result<AuthorizationCode, StoreError>;

	/// Records the tokens minted from a code's first redemption, so a later
	/// replay of the same code can be detected and those tokens revoked
	/// (invariant 2).
	fn record_redeemed_code(&self, code: &str, record: RedeemedCode) -> Result<(), StoreError>;

	/// Looks up the tokens minted from a prior redemption of `code`, without
	/// removing the record (a third, fourth, ... replay must still resolve to
	/// the same tokens, which are revoked on every such attempt anyway).
	fn lookup_redeemed_code(&self, code: &str) -> Result<RedeemedCode, StoreError>;

	/// Stores a freshly minted access token in memory. Never persisted to disk
	/// (invariant 8).
	fn add_access_token(&self, record: AccessToken) -> Result<(), StoreError>;

	/// Looks up an access token for bearer validation.
	fn load_access_token(&self, token: &str) -> Result<AccessToken, StoreError>;

	/// Persists a freshly minted refresh token.
	fn add_refresh_token(&self, record: RefreshToken) -> Result<(), StoreError>;

	/// Looks up a refresh token without consuming it, used to recover the scope it
	/// was originally granted before reconciling a refresh request (§4.B "Scope
	/// policy").
	fn load_refresh_token(&self, token: &str) -> Result<RefreshToken, StoreError>;

	/// Atomically replaces `old` with `new`, failing if `old` does not exist or has
	/// expired (invariant 3: rotation is all-or-nothing).
	fn rotate_refresh(&self, old: &str, new: RefreshToken) -> Result<(), StoreError>;

	/// Removes a refresh token if present. Best-effort: a missing token is not an
	/// error (§4.C `revoke`).
	fn revoke(&self, token: &str) -> Result<(), StoreError>;

	/// Stores a pending federated authorization, keyed by the correlation `state`.
	fn put_pending(&self, state: String, record: PendingAuthorization) -> Result<(), StoreError>;

	/// Removes and returns a pending authorization by its correlation `state`.
	fn take_pending(&self, state: &str) -> Result<PendingAuthorization, StoreError>;

	/// Drops every expired refresh token, access token, authorization code, and
	/// pending authorization as of `now`, persisting the durable subset that
	/// changed. Returns the number of entries removed from each map.
	fn sweep(&self, now: i64) -> SweepReport;

	/// Persists the durable subset of the store (clients, refresh tokens) to its
	/// backing storage, regardless of whether anything changed since the last
	/// write. Called once during graceful shutdown (§4.F).
	fn flush(&self) -> Result<(), StoreError>;
}

/// Counts of entries removed by one [`CredentialStore::sweep`] pass, used for the
/// sweeper's `tracing::debug!` log line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
	/// Expired refresh tokens removed.
	pub refresh_tokens: usize,
	/// Expired access tokens removed.
	pub access_tokens: usize,
	/// Expired authorization codes removed.
	pub codes: usize,
	/// Expired pending authorizations removed.
	pub pending: usize,
	/// Expired redeemed-code replay records removed.
	pub redeemed_codes: usize,
}
impl SweepReport {
	/// Returns true if nothing was removed.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

/// Maps a credential-redemption failure (unknown, expired, reused code or
/// refresh token) onto `invalid_grant`, per §7 "Credential failures ... ->
/// `invalid_grant` at `/token`". Distinct from the blanket `From<StoreError>
/// for Error`, which is reserved for genuine storage-backend failures
/// (serialization, disk I/O) that should surface as `server_error`.
pub fn redemption_error(err: StoreError) -> Error {
	match err {
		StoreError::NotFound { .. } => {
			Error::InvalidGrant { reason: "the credential is unknown or was already used".into() }
		},
		StoreError::Expired { .. } => {
			Error::InvalidGrant { reason: "the credential has expired".into() }
		},
		other => Error::Storage(other),
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Debug, ThisError)]
pub enum StoreError {
	/// `register_client` was called with an id that already exists.
	#[error("Client `{client_id}` is already registered.")]
	Conflict {
		/// The conflicting client id.
		client_id: String,
	},
	/// The requested record does not exist.
	#[error("No record found for `{key}`.")]
	NotFound {
		/// The key that was looked up.
		key: String,
	},
	/// The record exists but has passed its expiry.
	#[error("Record for `{key}` has expired.")]
	Expired {
		/// The key that was looked up.
		key: String,
	},
	/// Reading or writing the JSON snapshot failed.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// The filesystem backing the store could not be read or written.
	#[error("Storage backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
