//! Authorization code record (§3 "Authorization code").

// self
use crate::{
	_prelude::*,
	auth::{IdentityClaims, ScopeSet},
};

/// One-time, ephemeral authorization code minted at consent / IdP return and redeemed
/// at most once at the token endpoint (invariant 2).
#[derive(Clone, Debug)]
pub struct AuthorizationCode {
	/// The code string presented by the client.
	pub code: String,
	/// Owning client.
	pub client_id: String,
	/// Redirect URI the code was bound to; must match byte-for-byte at exchange
	/// (invariant 7).
	pub redirect_uri: String,
	/// The originating MCP client's opaque `state`, carried through so the
	/// `/authorize/approve` redirect can echo it back unchanged.
	pub mcp_state: String,
	/// Granted scopes.
	pub scope: ScopeSet,
	/// PKCE `code_challenge` presented at `/authorize`.
	pub code_challenge: String,
	/// PKCE challenge method (`S256` or `plain`).
	pub code_challenge_method: String,
	/// Identity captured from a federated IdP, if this code was minted after a
	/// federation round trip.
	pub identity: Option<IdentityClaims>,
	/// Creation instant, epoch seconds UTC.
	pub created_at: i64,
	/// Expiry instant, epoch seconds UTC (created_at + 10 minutes, §3).
	pub expires_at: i64,
}
impl AuthorizationCode {
	/// Returns true if `now` (epoch seconds UTC) is at or past [`Self::expires_at`].
	pub fn is_expired(&self, now: i64) -> bool {
		now >= self.expires_at
	}
}

/// Record of the tokens minted from a code's first (and only legitimate)
/// redemption, kept around past `consume_code` so a later replay of the same
/// code can revoke them (invariant 2: "attempting to redeem a code twice
/// invalidates any tokens issued from its first redemption"). In-memory only,
/// like the code itself (invariant 8).
#[derive(Clone, Debug)]
pub struct RedeemedCode {
	/// Access token minted from the first redemption.
	pub access_token: String,
	/// Refresh token minted from the first redemption.
	pub refresh_token: String,
	/// Expiry instant past which the replay is no longer worth tracking;
	/// mirrors the redeemed code's own `expires_at`.
	pub expires_at: i64,
}
impl RedeemedCode {
	/// Returns true if `now` (epoch seconds UTC) is at or past [`Self::expires_at`].
	pub fn is_expired(&self, now: i64) -> bool {
		now >= self.expires_at
	}
}
