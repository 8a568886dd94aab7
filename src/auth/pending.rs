//! Pending (federated) authorization record (§3 "Authorization request (pending)").

// self
use crate::_prelude::*;
use crate::auth::{IdentityClaims, ScopeSet};

/// Correlation record connecting a federated IdP round trip back to the originating
/// MCP authorization request. Ephemeral, in-memory only; keyed by a server-generated
/// correlation token carried through the IdP as its `state` parameter (§4.D).
///
/// The same record shape also backs the *local* consent ticket the custom provider
/// and the post-federation consent step hand to the browser between the GET that
/// renders the consent page and the POST that approves it — both are "a pending
/// authorization waiting on an out-of-band confirmation", just with a different
/// confirmer (the IdP vs. the end user's click). `identity` is only ever populated
/// on the second leg, once a federated IdP round trip has returned claims.
#[derive(Clone, Debug)]
pub struct PendingAuthorization {
	/// Originating MCP `client_id`.
	pub client_id: String,
	/// Originating MCP redirect URI.
	pub redirect_uri: String,
	/// Requested scopes.
	pub scope: ScopeSet,
	/// PKCE `code_challenge` presented by the MCP client.
	pub code_challenge: String,
	/// PKCE challenge method (`S256` or `plain`).
	pub code_challenge_method: String,
	/// The original MCP `state`, returned verbatim on completion or failure.
	pub mcp_state: String,
	/// Identity captured from a federated IdP, populated only after the IdP leg of
	/// a `google`/`azure` flow has completed and before local consent is shown.
	pub identity: Option<IdentityClaims>,
	/// Creation instant, epoch seconds UTC.
	pub created_at: i64,
	/// Expiry instant, epoch seconds UTC (created_at + 10 minutes, §3).
	pub expires_at: i64,
}
impl PendingAuthorization {
	/// Returns true if `now` (epoch seconds UTC) is at or past [`Self::expires_at`].
	pub fn is_expired(&self, now: i64) -> bool {
		now >= self.expires_at
	}
}
