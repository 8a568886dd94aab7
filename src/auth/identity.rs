//! Identity claims captured from a federated IdP during the federated-auth round trip.

// self
use crate::_prelude::*;

/// Minimal identity captured from a federated IdP's userinfo/Graph response and
/// attached to an authorization code / access token for observability (§3: "never
/// exposed to tool clients beyond scopes").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
	/// Stable subject identifier from the IdP.
	pub subject: String,
	/// Email address, if the IdP returned one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Display name, if the IdP returned one.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
}
