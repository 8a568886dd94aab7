//! Provider abstraction (§4.C): a single contract with three variants —
//! [`custom::CustomProvider`] (local auto-consent), [`google::GoogleProvider`] and
//! [`azure::AzureProvider`] (OIDC/Microsoft-identity federation). A
//! [`factory::ProviderFactory`] selects exactly one at startup from
//! [`crate::config::Config`].

#[cfg(feature = "reqwest")] pub mod azure;
pub mod custom;
pub mod factory;
#[cfg(feature = "reqwest")] pub mod google;

#[cfg(feature = "reqwest")] pub use azure::AzureProvider;
pub use custom::CustomProvider;
pub use factory::ProviderFactory;
#[cfg(feature = "reqwest")] pub use google::GoogleProvider;

// crates.io
use async_trait::async_trait;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthorizationCode, ClientRegistration, IdentityClaims, RefreshToken, ScopeSet},
};

/// Inputs the HTTP layer's `GET /authorize` handler gathers before delegating to
/// a provider (§4.D step 1).
#[derive(Clone, Debug)]
pub struct AuthorizeRequest {
	/// The already-validated client registration making the request.
	pub client: ClientRegistration,
	/// Redirect URI presented at `/authorize`, already checked against the
	/// client's registered set.
	pub redirect_uri: String,
	/// Requested scopes, already reconciled against the server's valid set.
	pub scope: ScopeSet,
	/// Opaque `state` the MCP client supplied, returned verbatim on completion.
	pub state: String,
	/// PKCE `code_challenge`.
	pub code_challenge: String,
	/// PKCE `code_challenge_method` (`S256` or `plain`).
	pub code_challenge_method: String,
}

/// What the HTTP layer should do in response to `start_authorization` (§4.C).
#[derive(Debug)]
pub enum AuthorizeOutcome {
	/// Render the local consent page immediately (custom provider, or a
	/// federated provider resuming after the IdP leg).
	Consent(ConsentView),
	/// Redirect the browser to an external IdP's authorization endpoint
	/// (`google`/`azure`).
	ExternalRedirect(url::Url),
}

/// Everything the consent template needs to render the approval form and the
/// HTTP layer needs to resolve the eventual decision (§4.E `/oauth/authorize/approve`,
/// `/oauth/consent/approve`).
#[derive(Clone, Debug)]
pub struct ConsentView {
	/// Correlation ticket carried as a hidden form field, consumed by
	/// [`Provider::complete_authorization`] on approval.
	pub ticket: String,
	/// The client's display name (falls back to its `client_id`).
	pub client_name: String,
	/// Requested scopes, shown with human-readable descriptions.
	pub scope: ScopeSet,
	/// Identity captured from a federated IdP, present only on the
	/// post-federation consent step.
	pub identity: Option<IdentityClaims>,
	/// Route the approval form should `POST` to.
	pub approve_action: &'static str,
}

/// Access + refresh token pair minted by [`Provider::exchange_code`] or
/// [`Provider::refresh`].
#[derive(Clone, Debug)]
pub struct IssuedTokens {
	/// The newly minted access token.
	pub access_token: AccessToken,
	/// The newly minted (and, on refresh, rotated) refresh token.
	pub refresh_token: RefreshToken,
}

/// Metadata describing a provider variant, surfaced in logs and available for
/// diagnostics endpoints (§4.C `info`).
#[derive(Clone, Copy, Debug)]
pub struct ProviderInfo {
	/// Stable variant identifier (`custom`, `google`, `azure`).
	pub kind: &'static str,
	/// Human-readable display name.
	pub display_name: &'static str,
	/// True if this variant interposes an external identity provider.
	pub external: bool,
}

/// The provider contract (§4.C): every deployment selects exactly one
/// implementation via [`ProviderFactory`]; the HTTP surface depends only on this
/// trait, never on a concrete variant.
#[async_trait]
pub trait Provider
where
	Self: Send + Sync,
{
	/// Returns this provider's metadata.
	fn info(&self) -> ProviderInfo;

	/// Begins an authorization request: either renders local consent
	/// immediately, or redirects to an external IdP (§4.C).
	async fn start_authorization(&self, request: AuthorizeRequest) -> Result<AuthorizeOutcome>;

	/// Handles an external IdP's callback, consuming the pending authorization
	/// keyed by `state` and resolving to a fresh local consent step (§4.D steps
	/// 2-3). Only meaningful for federated variants; the custom provider never
	/// receives this call because no IdP callback route dispatches to it.
	async fn handle_idp_callback(
		&self,
		idp_code: &str,
		idp_state: &str,
	) -> Result<ConsentView> {
		let _ = (idp_code, idp_state);

		Err(Error::InvalidRequest { reason: "this provider does not federate to an IdP".into() })
	}

	/// Resolves an approved consent ticket into a freshly minted authorization
	/// code (§4.C `complete_authorization`).
	fn complete_authorization(&self, ticket: &str) -> Result<AuthorizationCode>;

	/// Exchanges an authorization code for an access + refresh token pair,
	/// verifying PKCE and the redirect URI (§4.B, invariants 6-7).
	async fn exchange_code(
		&self,
		code: &str,
		code_verifier: &str,
		redirect_uri: &str,
		client: &ClientRegistration,
	) -> Result<IssuedTokens>;

	/// Rotates a refresh token, narrowing scope per §4.B's policy (invariant 3-4).
	async fn refresh(
		&self,
		refresh_token: &str,
		client: &ClientRegistration,
		requested_scope: ScopeSet,
	) -> Result<IssuedTokens>;

	/// Looks up an access token for the bearer middleware (§4.E).
	fn introspect(&self, token: &str) -> Result<AccessToken>;

	/// Best-effort revocation of an access or refresh token (§4.E `/revoke`).
	fn revoke(&self, token: &str);
}
