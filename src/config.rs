//! Configuration & lifecycle (§4.F): reads the process environment, validates it,
//! and selects exactly one provider variant.

// self
use crate::{_prelude::*, auth::ScopeSet, error::ConfigError, token::TokenPolicy};

/// Provider variant selected by `OAUTH_PROVIDER` (§4.C).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
	/// Local consent only, no external IdP.
	Custom,
	/// Federates to Google's OIDC provider before issuing our own tokens.
	Google,
	/// Federates to Azure AD / Entra ID before issuing our own tokens.
	Azure,
}
impl ProviderKind {
	fn parse(raw: &str) -> Result<Self, ConfigError> {
		match raw {
			"custom" => Ok(ProviderKind::Custom),
			"google" => Ok(ProviderKind::Google),
			"azure" => Ok(ProviderKind::Azure),
			other => Err(ConfigError::UnknownProvider { provider: other.to_owned() }),
		}
	}

	/// Returns true if this variant federates to an external IdP.
	pub fn is_federated(self) -> bool {
		!matches!(self, ProviderKind::Custom)
	}

	/// Returns a stable display/log label.
	pub fn as_str(self) -> &'static str {
		match self {
			ProviderKind::Custom => "custom",
			ProviderKind::Google => "google",
			ProviderKind::Azure => "azure",
		}
	}
}

/// Federated-provider client credentials, required when [`ProviderKind::is_federated`].
#[derive(Clone)]
pub struct FederatedCredentials {
	/// OAuth client id issued by the IdP for this server.
	pub client_id: String,
	/// OAuth client secret issued by the IdP for this server.
	pub client_secret: String,
	/// Azure tenant segment (`common`, `organizations`, `consumers`, or a tenant id).
	/// Unused for Google.
	pub tenant_id: Option<String>,
}
impl Debug for FederatedCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FederatedCredentials")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("tenant_id", &self.tenant_id)
			.finish()
	}
}

/// Fully validated server configuration, assembled once at startup (§4.F).
#[derive(Clone, Debug)]
pub struct Config {
	/// Master switch (`OAUTH_ENABLED`); callers should refuse to mount the HTTP
	/// surface when this is false.
	pub enabled: bool,
	/// Selected provider variant.
	pub provider: ProviderKind,
	/// Absolute URL identifying this server, used as `issuer` and to build
	/// endpoint URLs in the metadata document.
	pub issuer_url: url::Url,
	/// Complete set of scopes this deployment is willing to grant.
	pub valid_scopes: ScopeSet,
	/// Scopes granted when a registration or request omits `scope` entirely.
	pub default_scopes: ScopeSet,
	/// Token lifetimes.
	pub token_policy: TokenPolicy,
	/// Federated-IdP credentials, present only for `google`/`azure`.
	pub federated_credentials: Option<FederatedCredentials>,
	/// Socket address the HTTP surface binds to.
	pub bind_addr: String,
	/// Directory holding `clients.json`/`refresh_tokens.json`.
	pub store_dir: String,
}
impl Config {
	/// Loads and validates configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		let enabled = parse_bool_env("OAUTH_ENABLED", true)?;
		let provider = ProviderKind::parse(&require_env("OAUTH_PROVIDER")?)?;
		let issuer_raw = require_env("OAUTH_ISSUER_URL")?;
		let issuer_url =
			url::Url::parse(&issuer_raw).map_err(|source| ConfigError::InvalidUrl {
				field: "OAUTH_ISSUER_URL",
				source,
			})?;

		if issuer_url.scheme() != "https" && !is_local_host(&issuer_url) {
			return Err(ConfigError::InsecureIssuer { url: issuer_raw });
		}

		let valid_scopes = ScopeSet::new(parse_comma_list("OAUTH_VALID_SCOPES")?);
		let default_scopes = ScopeSet::new(parse_comma_list("OAUTH_DEFAULT_SCOPES")?);
		let token_policy = TokenPolicy {
			access_token_ttl_secs: parse_int_env(
				"OAUTH_ACCESS_TOKEN_TTL",
				crate::token::DEFAULT_ACCESS_TOKEN_TTL_SECS,
			)?,
			refresh_token_ttl_secs: parse_int_env(
				"OAUTH_REFRESH_TOKEN_TTL",
				crate::token::DEFAULT_REFRESH_TOKEN_TTL_SECS,
			)?,
			auth_code_ttl_secs: parse_int_env(
				"OAUTH_AUTH_CODE_TTL",
				crate::token::DEFAULT_AUTH_CODE_TTL_SECS,
			)?,
		};
		let federated_credentials = if provider.is_federated() {
			let client_id = std::env::var("OAUTH_CLIENT_ID").ok().filter(|v| !v.is_empty());
			let client_secret = std::env::var("OAUTH_CLIENT_SECRET").ok().filter(|v| !v.is_empty());

			match (client_id, client_secret) {
				(Some(client_id), Some(client_secret)) => {
					let tenant_id = if matches!(provider, ProviderKind::Azure) {
						Some(std::env::var("OAUTH_TENANT_ID").unwrap_or_else(|_| "common".into()))
					} else {
						None
					};

					Some(FederatedCredentials { client_id, client_secret, tenant_id })
				},
				_ => {
					return Err(ConfigError::MissingFederatedCredentials {
						provider: provider.as_str(),
					});
				},
			}
		} else {
			None
		};
		let bind_addr =
			std::env::var("MCP_OAUTH_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8089".into());
		let store_dir =
			std::env::var("MCP_OAUTH_STORE_DIR").unwrap_or_else(|_| "./mcp-oauth-data".into());

		Ok(Self {
			enabled,
			provider,
			issuer_url,
			valid_scopes,
			default_scopes,
			token_policy,
			federated_credentials,
			bind_addr,
			store_dir,
		})
	}
}

fn is_local_host(url: &url::Url) -> bool {
	matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"))
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
	std::env::var(key).map_err(|_| ConfigError::MissingEnv { key })
}

fn parse_bool_env(key: &'static str, default: bool) -> Result<bool, ConfigError> {
	match std::env::var(key) {
		Ok(raw) => raw
			.parse()
			.map_err(|_| ConfigError::InvalidEnv { key, reason: "expected `true` or `false`".into() }),
		Err(_) => Ok(default),
	}
}

fn parse_int_env(key: &'static str, default: i64) -> Result<i64, ConfigError> {
	match std::env::var(key) {
		Ok(raw) => raw
			.parse()
			.map_err(|_| ConfigError::InvalidEnv { key, reason: "expected an integer".into() }),
		Err(_) => Ok(default),
	}
}

fn parse_comma_list(key: &'static str) -> Result<Vec<String>, ConfigError> {
	Ok(std::env::var(key)
		.unwrap_or_default()
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(str::to_owned)
		.collect())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rejects_plain_http_issuer_for_non_local_host() {
		let url = url::Url::parse("http://auth.example.com").expect("fixture should parse");

		assert!(!is_local_host(&url));
	}

	#[test]
	fn accepts_plain_http_for_localhost() {
		let url = url::Url::parse("http://127.0.0.1:8089").expect("fixture should parse");

		assert!(is_local_host(&url));
	}

	#[test]
	fn comma_list_trims_and_drops_empties() {
		// SAFETY: test-only env mutation, single-threaded test (no parallel env reads of this key).
		unsafe {
			std::env::set_var("OAUTH_TEST_SCOPES_CONFIG", " read , write ,,");
		}

		let values = parse_comma_list("OAUTH_TEST_SCOPES_CONFIG").expect("should parse");

		assert_eq!(values, vec!["read".to_string(), "write".to_string()]);

		unsafe {
			std::env::remove_var("OAUTH_TEST_SCOPES_CONFIG");
		}
	}
}
