//! Token minting, PKCE verification, and scope-policy glue (§4.B).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, IdentityClaims, RefreshToken, ScopeSet,
		generate_opaque_string, reconcile_scope,
	},
};

/// Default access-token lifetime in seconds (§3), overridden by `OAUTH_ACCESS_TOKEN_TTL`.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
/// Default refresh-token lifetime in seconds (§3), overridden by `OAUTH_REFRESH_TOKEN_TTL`.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 86_400;
/// Default authorization-code / pending-authorization lifetime in seconds (§3),
/// overridden by `OAUTH_AUTH_CODE_TTL`.
pub const DEFAULT_AUTH_CODE_TTL_SECS: i64 = 600;

/// Policy knobs threaded through minting calls, read once from [`crate::config::Config`].
#[derive(Clone, Copy, Debug)]
pub struct TokenPolicy {
	/// Access-token lifetime in seconds.
	pub access_token_ttl_secs: i64,
	/// Refresh-token lifetime in seconds.
	pub refresh_token_ttl_secs: i64,
	/// Authorization-code lifetime in seconds.
	pub auth_code_ttl_secs: i64,
}
impl Default for TokenPolicy {
	fn default() -> Self {
		Self {
			access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
			refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
			auth_code_ttl_secs: DEFAULT_AUTH_CODE_TTL_SECS,
		}
	}
}
impl TokenPolicy {
	/// Mints a fresh authorization code for `client_id`/`redirect_uri`, binding the
	/// PKCE challenge and any federated identity captured during the round trip.
	pub fn mint_code(
		&self,
		client_id: impl Into<String>,
		redirect_uri: impl Into<String>,
		mcp_state: impl Into<String>,
		scope: ScopeSet,
		code_challenge: impl Into<String>,
		code_challenge_method: impl Into<String>,
		identity: Option<IdentityClaims>,
		now: i64,
	) -> AuthorizationCode {
		AuthorizationCode {
			code: generate_opaque_string(),
			client_id: client_id.into(),
			redirect_uri: redirect_uri.into(),
			mcp_state: mcp_state.into(),
			scope,
			code_challenge: code_challenge.into(),
			code_challenge_method: code_challenge_method.into(),
			identity,
			created_at: now,
			expires_at: now + self.auth_code_ttl_secs,
		}
	}

	/// Mints a fresh access token for `client_id`, bound to `scope`.
	pub fn mint_access_token(
		&self,
		client_id: impl Into<String>,
		scope: ScopeSet,
		subject: Option<String>,
		now: i64,
	) -> AccessToken {
		AccessToken {
			token: generate_opaque_string(),
			client_id: client_id.into(),
			scope,
			subject,
			issued_at: now,
			expires_at: now + self.access_token_ttl_secs,
		}
	}

	/// Mints a fresh refresh token for `client_id`, bound to `scope`.
	pub fn mint_refresh_token(
		&self,
		client_id: impl Into<String>,
		scope: ScopeSet,
		now: i64,
	) -> RefreshToken {
		RefreshToken {
			token: generate_opaque_string(),
			client_id: client_id.into(),
			scopes: scope,
			expires_at: now + self.refresh_token_ttl_secs,
		}
	}
}

/// PKCE `code_challenge_method` values recognized at `/authorize` and `/token` (§4.B).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceMethod {
	/// SHA-256 based PKCE (RFC 7636 S256); required for public clients.
	S256,
	/// Plaintext comparison; only accepted from confidential clients.
	Plain,
}
impl PkceMethod {
	/// Parses the wire string used in authorize/token requests.
	pub fn parse(raw: &str) -> Result<Self, Error> {
		match raw {
			"S256" => Ok(PkceMethod::S256),
			"plain" => Ok(PkceMethod::Plain),
			other => Err(Error::InvalidRequest {
				reason: format!("unsupported code_challenge_method `{other}`"),
			}),
		}
	}

	/// The RFC 7636 identifier for this method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceMethod::S256 => "S256",
			PkceMethod::Plain => "plain",
		}
	}
}

/// Verifies a presented PKCE `code_verifier` against the `code_challenge` stored on
/// the authorization code, per §4.B. `plain` is rejected outright for public clients;
/// any mismatch is a hard `invalid_grant` failure.
pub fn verify_pkce(
	method: &str,
	verifier: &str,
	challenge: &str,
	client_is_confidential: bool,
) -> Result<(), Error> {
	match PkceMethod::parse(method)? {
		PkceMethod::S256 => {
			if compute_pkce_challenge(verifier) == challenge {
				Ok(())
			} else {
				Err(Error::InvalidGrant { reason: "PKCE verification failed.".into() })
			}
		},
		PkceMethod::Plain => {
			if !client_is_confidential {
				return Err(Error::InvalidGrant {
					reason: "the `plain` PKCE method is not accepted for public clients".into(),
				});
			}

			if verifier == challenge {
				Ok(())
			} else {
				Err(Error::InvalidGrant { reason: "PKCE verification failed.".into() })
			}
		},
	}
}

/// Computes the S256 PKCE code challenge for a verifier: SHA-256 then base64url
/// without padding.
pub fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	let digest = hasher.finalize();

	URL_SAFE_NO_PAD.encode(digest)
}

/// Reconciles a token-endpoint scope request against what was previously granted and
/// the server's valid-scope configuration, translating [`crate::auth::ScopeError`]
/// into the request-facing [`Error::InvalidScope`] (§4.B "Scope policy").
pub fn reconcile_requested_scope(
	requested: &ScopeSet,
	granted: &ScopeSet,
	valid: &ScopeSet,
) -> Result<ScopeSet, Error> {
	reconcile_scope(requested, granted, valid)
		.map_err(|err| Error::InvalidScope { reason: err.to_string() })
}
