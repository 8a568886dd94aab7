//! Access- and refresh-token records (§3 "Access token" / "Refresh token").

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Short-lived bearer credential presented with tool calls (§3, default 1 hour TTL).
/// Access tokens are never persisted to disk (invariant 8; see DESIGN.md).
#[derive(Clone, Debug)]
pub struct AccessToken {
	/// The token string presented in the `Authorization: Bearer` header.
	pub token: String,
	/// Owning client.
	pub client_id: String,
	/// Granted scopes.
	pub scope: ScopeSet,
	/// Identity captured from a federated IdP, if any.
	pub subject: Option<String>,
	/// Creation instant, epoch seconds UTC.
	pub issued_at: i64,
	/// Expiry instant, epoch seconds UTC.
	pub expires_at: i64,
}
impl AccessToken {
	/// Returns true if `now` (epoch seconds UTC) is at or past [`Self::expires_at`].
	pub fn is_expired(&self, now: i64) -> bool {
		now >= self.expires_at
	}
}

/// Long-lived, rotating credential used to mint new access tokens (§3, default 24h
/// TTL). Persisted; rotated atomically on each use (invariant 3).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RefreshToken {
	/// The token string.
	pub token: String,
	/// Owning client.
	pub client_id: String,
	/// Granted scopes, serialized as a JSON array (§6 `refresh_tokens.json` layout).
	#[serde(with = "crate::auth::scope::array")]
	pub scopes: ScopeSet,
	/// Expiry instant, epoch seconds UTC.
	pub expires_at: i64,
}
impl RefreshToken {
	/// Returns true if `now` (epoch seconds UTC) is at or past [`Self::expires_at`].
	pub fn is_expired(&self, now: i64) -> bool {
		now >= self.expires_at
	}
}
