//! Google-federated provider variant (§4.C `google`): authenticates the user
//! against Google's OIDC provider before rendering local consent.
//!
//! Compiled only with the `reqwest` feature, since every operation here depends
//! on calling out to Google over HTTP.

// crates.io
use async_trait::async_trait;
// self
use crate::{
	_prelude::*,
	auth::{AuthorizationCode, ClientRegistration, IdentityClaims, PendingAuthorization, ScopeSet, generate_opaque_string},
	error::FederationError,
	federation::{
		DiscoveryCache, IdpEndpoints, IdpHttpClient, build_idp_authorize_url,
		discovery::GOOGLE_DISCOVERY_URL, exchange_and_fetch_identity,
	},
	provider::{
		AuthorizeOutcome, AuthorizeRequest, ConsentView, IssuedTokens, Provider, ProviderInfo,
		custom::{exchange_code_with, refresh_with},
	},
	store::CredentialStore,
	token::TokenPolicy,
};

/// Scopes requested from Google itself (distinct from the MCP-facing scope the
/// tool client requested).
const GOOGLE_SCOPES: &[&str] = &["openid", "email", "profile"];
/// Approval form action the post-federation consent page posts to.
pub const APPROVE_ACTION: &str = "/oauth/consent/approve";

/// Federates to Google's OIDC provider, then falls back to the same local
/// consent step the custom provider uses once identity is known.
pub struct GoogleProvider {
	store: Arc<dyn CredentialStore>,
	token_policy: TokenPolicy,
	valid_scopes: ScopeSet,
	client_id: String,
	client_secret: String,
	callback_uri: url::Url,
	discovery: DiscoveryCache,
	http: IdpHttpClient,
}
impl GoogleProvider {
	/// Builds the Google provider over a shared store and the deployment's
	/// registered Google OAuth client credentials.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		token_policy: TokenPolicy,
		valid_scopes: ScopeSet,
		client_id: String,
		client_secret: String,
		callback_uri: url::Url,
	) -> Result<Self, FederationError> {
		Ok(Self {
			store,
			token_policy,
			valid_scopes,
			client_id,
			client_secret,
			callback_uri,
			discovery: DiscoveryCache::new(GOOGLE_DISCOVERY_URL),
			http: IdpHttpClient::new()?,
		})
	}

	async fn endpoints(&self) -> Result<IdpEndpoints, FederationError> {
		let document = self.discovery.get(&self.http).await?;

		Ok(IdpEndpoints {
			authorization: document.authorization_endpoint.clone(),
			token: document.token_endpoint.clone(),
			userinfo: document.userinfo_endpoint.clone(),
		})
	}
}
#[async_trait]
impl Provider for GoogleProvider {
	fn info(&self) -> ProviderInfo {
		ProviderInfo { kind: "google", display_name: "Google", external: true }
	}

	async fn start_authorization(&self, request: AuthorizeRequest) -> Result<AuthorizeOutcome> {
		let endpoints = self.endpoints().await.map_err(Error::Federation)?;
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
			&endpoints,
			&self.client_id,
			&self.callback_uri,
			GOOGLE_SCOPES,
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
		let endpoints = self.endpoints().await.map_err(Error::Federation)?;
		let identity = exchange_and_fetch_identity(
			&self.http,
			&endpoints,
			&self.client_id,
			&self.client_secret,
			&self.callback_uri,
			idp_code,
			parse_google_identity,
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

/// Maps Google's userinfo response (`sub`, `email`, `name`) onto [`IdentityClaims`].
fn parse_google_identity(profile: serde_json::Value) -> Result<IdentityClaims, FederationError> {
	let subject = profile
		.get("sub")
		.and_then(serde_json::Value::as_str)
		.ok_or_else(|| FederationError::Userinfo { reason: "missing `sub` in Google profile".into() })?
		.to_owned();
	let email = profile.get("email").and_then(serde_json::Value::as_str).map(str::to_owned);
	let display_name = profile.get("name").and_then(serde_json::Value::as_str).map(str::to_owned);

	Ok(IdentityClaims { subject, email, display_name })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn parses_google_profile_into_identity_claims() {
		let profile = json!({ "sub": "1234", "email": "a@example.com", "name": "A B" });
		let identity = parse_google_identity(profile).expect("should parse");

		assert_eq!(identity.subject, "1234");
		assert_eq!(identity.email.as_deref(), Some("a@example.com"));
	}

	#[test]
	fn rejects_profile_missing_subject() {
		let err = parse_google_identity(json!({ "email": "a@example.com" })).expect_err("should reject");

		assert!(matches!(err, FederationError::Userinfo { .. }));
	}
}
