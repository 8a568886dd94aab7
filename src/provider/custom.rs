//! Local-consent provider variant (§4.C `custom`): no external IdP, the resource
//! owner's click on the consent page is the only assertion of identity.

// crates.io
use async_trait::async_trait;
// self
use crate::{
	_prelude::*,
	auth::{
		AuthorizationCode, ClientRegistration, PendingAuthorization, RedeemedCode, ScopeSet,
		generate_opaque_string,
	},
	provider::{AuthorizeOutcome, AuthorizeRequest, ConsentView, IssuedTokens, Provider, ProviderInfo},
	store::{CredentialStore, StoreError, redemption_error},
	token::{TokenPolicy, reconcile_requested_scope, verify_pkce},
};

/// Approval form action this variant's consent page posts to.
pub const APPROVE_ACTION: &str = "/oauth/authorize/approve";

/// No external IdP: `/authorize` renders the consent page directly.
pub struct CustomProvider {
	store: Arc<dyn CredentialStore>,
	token_policy: TokenPolicy,
	valid_scopes: ScopeSet,
}
impl CustomProvider {
	/// Builds the custom provider over a shared store.
	pub fn new(store: Arc<dyn CredentialStore>, token_policy: TokenPolicy, valid_scopes: ScopeSet) -> Self {
		Self { store, token_policy, valid_scopes }
	}
}
#[async_trait]
impl Provider for CustomProvider {
	fn info(&self) -> ProviderInfo {
		ProviderInfo { kind: "custom", display_name: "Local consent", external: false }
	}

	async fn start_authorization(&self, request: AuthorizeRequest) -> Result<AuthorizeOutcome> {
		let ticket = generate_opaque_string();
		let now = OffsetDateTime::now_utc().unix_timestamp();
		let client_name =
			request.client.client_name.clone().unwrap_or_else(|| request.client.client_id.clone());
		let pending = PendingAuthorization {
			client_id: request.client.client_id,
			redirect_uri: request.redirect_uri,
			scope: request.scope.clone(),
			code_challenge: request.code_challenge,
			code_challenge_method: request.code_challenge_method,
			mcp_state: request.state,
			identity: None,
			created_at: now,
			expires_at: now + self.token_policy.auth_code_ttl_secs,
		};

		self.store.put_pending(ticket.clone(), pending)?;

		Ok(AuthorizeOutcome::Consent(ConsentView {
			ticket,
			client_name,
			scope: request.scope,
			identity: None,
			approve_action: APPROVE_ACTION,
		}))
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

/// Shared token-exchange logic (§4.B invariants 2, 6, 7), reused by every provider
/// variant since PKCE/redirect-URI/code-consumption checks do not depend on how
/// identity was established.
pub(crate) fn exchange_code_with(
	store: &dyn CredentialStore,
	token_policy: &TokenPolicy,
	code: &str,
	code_verifier: &str,
	redirect_uri: &str,
	client: &ClientRegistration,
) -> Result<IssuedTokens> {
	let record = match store.consume_code(code) {
		Ok(record) => record,
		Err(StoreError::NotFound { .. }) => {
			// Either never issued, or this is a replay of an already-redeemed
			// code: revoke whatever the first redemption minted (invariant 2)
			// before reporting the same invalid_grant either way.
			if let Ok(redeemed) = store.lookup_redeemed_code(code) {
				if let Err(error) = store.revoke(&redeemed.access_token) {
					tracing::warn!(%error, "failed to revoke access token after code replay");
				}
				if let Err(error) = store.revoke(&redeemed.refresh_token) {
					tracing::warn!(%error, "failed to revoke refresh token after code replay");
				}
			}

			return Err(redemption_error(StoreError::NotFound { key: code.to_owned() }));
		},
		Err(error) => return Err(redemption_error(error)),
	};

	if record.client_id != client.client_id {
		return Err(Error::InvalidGrant { reason: "authorization code was issued to a different client".into() });
	}

	if record.redirect_uri != redirect_uri {
		return Err(Error::InvalidGrant { reason: "redirect_uri does not match the original request".into() });
	}

	verify_pkce(
		&record.code_challenge_method,
		code_verifier,
		&record.code_challenge,
		client.is_confidential(),
	)?;

	let now = OffsetDateTime::now_utc().unix_timestamp();
	let subject = record.identity.as_ref().map(|identity| identity.subject.clone());
	let access_token =
		token_policy.mint_access_token(client.client_id.clone(), record.scope.clone(), subject, now);

	store.add_access_token(access_token.clone())?;

	let refresh_token = token_policy.mint_refresh_token(client.client_id.clone(), record.scope, now);

	store.add_refresh_token(refresh_token.clone())?;

	if let Err(error) = store.record_redeemed_code(code, RedeemedCode {
		access_token: access_token.token.clone(),
		refresh_token: refresh_token.token.clone(),
		expires_at: record.expires_at,
	}) {
		tracing::warn!(%error, "failed to record redeemed code for replay detection");
	}

	Ok(IssuedTokens { access_token, refresh_token })
}

/// Shared refresh-grant logic (§4.B invariants 3-4), reused by every provider
/// variant.
pub(crate) fn refresh_with(
	store: &dyn CredentialStore,
	token_policy: &TokenPolicy,
	valid_scopes: &ScopeSet,
	refresh_token: &str,
	client: &ClientRegistration,
	requested_scope: ScopeSet,
) -> Result<IssuedTokens> {
	let existing = store.load_refresh_token(refresh_token).map_err(redemption_error)?;

	if existing.client_id != client.client_id {
		return Err(Error::InvalidGrant { reason: "refresh token was issued to a different client".into() });
	}

	let granted_scope = reconcile_requested_scope(&requested_scope, &existing.scopes, valid_scopes)?;
	let now = OffsetDateTime::now_utc().unix_timestamp();
	let new_refresh = token_policy.mint_refresh_token(client.client_id.clone(), granted_scope.clone(), now);

	store.rotate_refresh(refresh_token, new_refresh.clone()).map_err(redemption_error)?;

	let access_token = token_policy.mint_access_token(client.client_id.clone(), granted_scope, None, now);

	store.add_access_token(access_token.clone())?;

	Ok(IssuedTokens { access_token, refresh_token: new_refresh })
}
