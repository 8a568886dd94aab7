//! Azure AD / Entra ID federated provider variant (§4.C `azure`): authenticates
//! the user against the Microsoft identity platform, then fetches their profile
//! from Microsoft Graph before rendering local consent.
//!
//! Compiled only with the `reqwest` feature, since every operation here depends
//! on calling out to Microsoft over HTTP.

// crates.io
use async_trait::async_trait;
// self
use crate::{
	_prelude::*,
	auth::{AuthorizationCode, ClientRegistration, IdentityClaims, PendingAuthorization, ScopeSet, generate_opaque_string},
	error::FederationError,
	federation::{IdpEndpoints, IdpHttpClient, build_idp_authorize_url, exchange_and_fetch_identity},
	provider::{
		AuthorizeOutcome, AuthorizeRequest, ConsentView, IssuedTokens, Provider, ProviderInfo,
		custom::{exchange_code_with, refresh_with},
	},
	store::CredentialStore,
	token::TokenPolicy,
};

/// Scopes requested from the Microsoft identity platform.
const AZURE_SCOPES: &[&str] = &["openid", "email", "profile", "offline_access", "User.Read"];
/// Microsoft Graph endpoint used in place of a generic OIDC userinfo endpoint.
const GRAPH_ME_URL: &str = "https://graph.microsoft.com/v1.0/me";
/// Approval form action the post-federation consent page posts to.
pub const APPROVE_ACTION: &str = "/oauth/consent/approve";

/// Federates to Azure AD / Entra ID, templating the tenant segment into the
/// v2.0 endpoints per Microsoft's multi-tenant convention, then falls back to
/// the same local consent step the custom provider uses.
pub struct AzureProvider {
	store: Arc<dyn CredentialStore>,
	token_policy: TokenPolicy,
	valid_scopes: ScopeSet,
	client_id: String,
	client_secret: String,
	callback_uri: url::Url,
	endpoints: IdpEndpoints,
	http: IdpHttpClient,
}
impl AzureProvider {
	/// Builds the Azure provider. `tenant_id` is the tenant segment Microsoft's
	/// v2.0 endpoints expect: `common`, `organizations`, `consumers`, or a
	/// specific tenant GUID.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		token_policy: TokenPolicy,
		valid_scopes: ScopeSet,
		client_id: String,
		client_secret: String,
		callback_uri: url::Url,
		tenant_id: &str,
	) -> Result<Self, FederationError> {
		let base = format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0");
		let parse = |url: String| {
			url::Url::parse(&url).map_err(|source| FederationError::Discovery { reason: source.to_string() })
		};

		Ok(Self {
			store,
			token_policy,
			valid_scopes,
			client_id,
			client_secret,
			callback_uri,
			endpoints: IdpEndpoints {
				authorization: parse(format!("{base}/authorize"))?,
				token: parse(format!("{base}/token"))?,
				userinfo: parse(GRAPH_ME_URL.to_owned())?,
			},
			http: IdpHttpClient::new()?,
		})
	}
}
#[async_trait]
impl Provider for AzureProvider {
	fn info(&self) -> ProviderInfo {
		ProviderInfo { kind: "azure", display_name: "Microsoft Entra ID", external: true }
	}

	async fn start_authorization(&self, request: AuthorizeRequest) -> Result<AuthorizeOutcome> {
		let correlation = generate_opaque_string();
		let now = OffsetDateTime::now_utc().unix_timestamp();
		let pending = PendingAuthorization {
			client_id: request.client.client_id,
			redirect_uri: request.redirect_uri,
			scope: request.scope,
			code_challenge: request.code_challenge,
			code_challenge_method: request.code_challenge_method,
			mcp_state: request.state,
			identity: None,
			created_at: now,
			expires_at: now + self.token_policy.auth_code_ttl_secs,
		};

		self.store.put_pending(correlation.clone(), pending)?;

		let url = build_idp_authorize_url(
			&self.endpoints,
			&self.client_id,
			&self.callback_uri,
			AZURE_SCOPES,
			&correlation,
			&[],
		)
		.map_err(Error::Federation)?;

		Ok(AuthorizeOutcome::ExternalRedirect(url))
	}

	async fn handle_idp_callback(&self, idp_code: &str, idp_state: &str) -> Result<ConsentView> {
		let pending = self
			.store
			.take_pending(idp_state)
			.map_err(|_| Error::Federation(FederationError::UnknownState))?;
		let identity = exchange_and_fetch_identity(
			&self.http,
			&self.endpoints,
			&self.client_id,
			&self.client_secret,
			&self.callback_uri,
			idp_code,
			parse_graph_identity,
		)
		.await
		.map_err(Error::Federation)?;

		let ticket = generate_opaque_string();
		let client = self.store.get_client(&pending.client_id)?;
		let client_name = client.client_name.clone().unwrap_or(client.client_id);
		let scope = pending.scope.clone();
		let consent_pending = PendingAuthorization { identity: Some(identity.clone()), ..pending };

		self.store.put_pending(ticket.clone(), consent_pending)?;

		Ok(ConsentView { ticket, client_name, scope, identity: Some(identity), approve_action: APPROVE_ACTION })
	}

	fn complete_authorization(&self, ticket: &str) -> Result<AuthorizationCode> {
		let pending = self.store.take_pending(ticket).map_err(|_| Error::InvalidRequest {
			reason: "unknown or expired consent ticket".into(),
		})?;
		let now = OffsetDateTime::now_utc().unix_timestamp();
		let code = self.token_policy.mint_code(
			pending.client_id,
			pending.redirect_uri,
			pending.mcp_state,
			pending.scope,
			pending.code_challenge,
			pending.code_challenge_method,
			pending.identity,
			now,
		);

		self.store.add_code(code.clone())?;

		Ok(code)
	}

	async fn exchange_code(
		&self,
		code: &str,
		code_verifier: &str,
		redirect_uri: &str,
		client: &ClientRegistration,
	) -> Result<IssuedTokens> {
		exchange_code_with(&*self.store, &self.token_policy, code, code_verifier, redirect_uri, client)
	}

	async fn refresh(
		&self,
		refresh_token: &str,
		client: &ClientRegistration,
		requested_scope: ScopeSet,
	) -> Result<IssuedTokens> {
		refresh_with(&*self.store, &self.token_policy, &self.valid_scopes, refresh_token, client, requested_scope)
	}

	fn introspect(&self, token: &str) -> Result<crate::auth::AccessToken> {
		Ok(self.store.load_access_token(token)?)
	}

	fn revoke(&self, token: &str) {
		if let Err(error) = self.store.revoke(token) {
			tracing::warn!(%error, "failed to revoke token");
		}
	}
}

/// Maps Microsoft Graph's `/me` response (`id`, `mail`/`userPrincipalName`,
/// `displayName`) onto [`IdentityClaims`]. Graph omits `mail` for some tenant
/// configurations, so `userPrincipalName` is the fallback.
fn parse_graph_identity(profile: serde_json::Value) -> Result<IdentityClaims, FederationError> {
	let subject = profile
		.get("id")
		.and_then(serde_json::Value::as_str)
		.ok_or_else(|| FederationError::Userinfo { reason: "missing `id` in Graph profile".into() })?
		.to_owned();
	let email = profile
		.get("mail")
		.and_then(serde_json::Value::as_str)
		.or_else(|| profile.get("userPrincipalName").and_then(serde_json::Value::as_str))
		.map(str::to_owned);
	let display_name = profile.get("displayName").and_then(serde_json::Value::as_str).map(str::to_owned);

	Ok(IdentityClaims { subject, email, display_name })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn templates_tenant_segment_into_endpoints() {
		let store: Arc<dyn CredentialStore> =
			Arc::new(crate::store::disk::Store::open(std::env::temp_dir().join("mcp_oauth_core_azure_tenant")).unwrap());
		let provider = AzureProvider::new(
			store,
			TokenPolicy::default(),
			ScopeSet::new(["read"]),
			"client-1".into(),
			"secret".into(),
			url::Url::parse("https://mcp.example/oauth/azure/callback").unwrap(),
			"contoso-tenant-id",
		)
		.expect("should build provider");

		assert_eq!(
			provider.endpoints.authorization.as_str(),
			"https://login.microsoftonline.com/contoso-tenant-id/oauth2/v2.0/authorize"
		);
	}

	#[test]
	fn parses_graph_profile_falling_back_to_upn() {
		let profile = json!({ "id": "abc", "userPrincipalName": "a@contoso.com", "displayName": "A" });
		let identity = parse_graph_identity(profile).expect("should parse");

		assert_eq!(identity.email.as_deref(), Some("a@contoso.com"));
	}
}
