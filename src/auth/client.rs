//! Client registration record (§3 "Client registration").

// self
use crate::{_prelude::*, auth::ScopeSet};

/// Token endpoint authentication method a client advertised at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenEndpointAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// Public client; proves possession via PKCE only.
	None,
}
impl TokenEndpointAuthMethod {
	/// Returns true for clients that must present a `client_secret`.
	pub fn is_confidential(self) -> bool {
		!matches!(self, TokenEndpointAuthMethod::None)
	}
}
impl Default for TokenEndpointAuthMethod {
	fn default() -> Self {
		TokenEndpointAuthMethod::ClientSecretBasic
	}
}

/// Long-lived, immutable-after-creation record of a dynamically registered OAuth
/// client (§3 invariant: "never mutated after creation; destroyed only by operator
/// action").
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientRegistration {
	/// Unique opaque client identifier.
	pub client_id: String,
	/// BCrypt-style secret hash, present only if a secret was issued. Omitted (never
	/// serialized as `null`) when absent — a prior production bug broke downstream
	/// validators that rejected `null` for this field.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_secret_hash: Option<String>,
	/// Allowed redirect URIs (§3: must match byte-for-byte at token exchange).
	pub redirect_uris: Vec<String>,
	/// Requested/allowed scopes, space-separated on the wire.
	pub scope: ScopeSet,
	/// Preferred token endpoint authentication method.
	pub token_endpoint_auth_method: TokenEndpointAuthMethod,
	/// Grant types this client is allowed to use.
	pub grant_types: Vec<String>,
	/// Response types this client is allowed to request.
	pub response_types: Vec<String>,
	/// Optional human-readable display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_name: Option<String>,
	/// Registration instant, epoch seconds UTC.
	pub issued_at: i64,
}
impl ClientRegistration {
	/// Returns true if `uri` matches one of the registered redirect URIs
	/// byte-for-byte (invariant 7).
	pub fn allows_redirect(&self, uri: &str) -> bool {
		self.redirect_uris.iter().any(|registered| registered == uri)
	}

	/// Returns true if the client is confidential (secret-bearing).
	pub fn is_confidential(&self) -> bool {
		self.client_secret_hash.is_some()
	}
}
