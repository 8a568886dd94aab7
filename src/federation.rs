//! Federated-auth orchestrator (§4.D).
//!
//! This is the logic that straddles the MCP client, this server, and an external
//! identity provider: building the IdP authorization URL, correlating the IdP's
//! callback with the pending MCP authorization request via [`crate::auth::PendingAuthorization`],
//! exchanging the IdP's code, and fetching the user's profile before an MCP
//! authorization code is minted.

#[cfg(feature = "reqwest")] pub mod discovery;
#[cfg(feature = "reqwest")] pub mod transport;

#[cfg(feature = "reqwest")] pub use discovery::{DiscoveryCache, DiscoveryDocument};
#[cfg(feature = "reqwest")] pub use transport::IdpHttpClient;

// crates.io
use oauth2::{AuthUrl, ClientId, CsrfToken, Scope, TokenUrl, basic::BasicClient};
use serde::Deserialize;
// self
use crate::{_prelude::*, auth::IdentityClaims, error::FederationError};

/// Upstream endpoints an IdP-federated [`crate::provider::Provider`] targets.
#[derive(Clone, Debug)]
pub struct IdpEndpoints {
	/// The IdP's authorization endpoint.
	pub authorization: url::Url,
	/// The IdP's token endpoint.
	pub token: url::Url,
	/// The IdP's userinfo (or, for Azure, Microsoft Graph `/me`) endpoint.
	pub userinfo: url::Url,
}

/// The subset of an IdP token response this crate needs: an access token good
/// enough to call the userinfo endpoint. IdPs also return `id_token`/`expires_in`;
/// this crate does not need them since MCP access/refresh tokens are minted
/// independently once identity is known (§3 "Identity claims").
#[derive(Clone, Deserialize)]
pub struct IdpTokenResponse {
	/// The IdP's own access token, used once to call userinfo.
	pub access_token: String,
}
impl Debug for IdpTokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdpTokenResponse").field("access_token", &"<redacted>").finish()
	}
}

/// Builds the URL the browser is redirected to in order to authenticate with an
/// external IdP, carrying our own correlation token as `state` (§4.D step 1).
pub fn build_idp_authorize_url(
	endpoints: &IdpEndpoints,
	client_id: &str,
	our_callback_uri: &url::Url,
	scopes: &[&str],
	state: &str,
	extra_params: &[(&str, &str)],
) -> Result<url::Url, FederationError> {
	let auth_url = AuthUrl::new(endpoints.authorization.to_string())
		.map_err(|source| FederationError::Discovery { reason: source.to_string() })?;
	let token_url = TokenUrl::new(endpoints.token.to_string())
		.map_err(|source| FederationError::Discovery { reason: source.to_string() })?;
	let redirect_url = oauth2::RedirectUrl::new(our_callback_uri.to_string())
		.map_err(|source| FederationError::Discovery { reason: source.to_string() })?;
	let client = BasicClient::new(ClientId::new(client_id.to_owned()))
		.set_auth_uri(auth_url)
		.set_token_uri(token_url)
		.set_redirect_uri(redirect_url);
	let mut request = client.authorize_url(|| CsrfToken::new(state.to_owned()));

	for scope in scopes {
		request = request.add_scope(Scope::new((*scope).to_owned()));
	}
	for (key, value) in extra_params {
		request = request.add_extra_param(*key, *value);
	}

	let (url, _state) = request.url();

	Ok(url)
}

/// Exchanges the IdP's authorization code at its token endpoint, then calls its
/// userinfo (or Graph `/me`) endpoint, returning the identity to attach to the
/// MCP authorization code (§4.D step 3).
#[cfg(feature = "reqwest")]
pub async fn exchange_and_fetch_identity(
	http: &IdpHttpClient,
	endpoints: &IdpEndpoints,
	client_id: &str,
	client_secret: &str,
	our_callback_uri: &url::Url,
	code: &str,
	parse_identity: impl FnOnce(serde_json::Value) -> Result<IdentityClaims, FederationError>,
) -> Result<IdentityClaims, FederationError> {
	let form = [
		("grant_type", "authorization_code"),
		("code", code),
		("redirect_uri", our_callback_uri.as_str()),
		("client_id", client_id),
		("client_secret", client_secret),
	];
	let token: IdpTokenResponse =
		http.post_form(&endpoints.token, &form, Some((client_id, client_secret))).await?;
	let profile: serde_json::Value =
		http.get_json(&endpoints.userinfo, Some(&token.access_token)).await?;

	parse_identity(profile)
}

#[cfg(all(test, feature = "reqwest"))]
mod reqwest_tests {
	// crates.io
	use httpmock::prelude::*;
	use serde_json::json;
	// self
	use super::*;

	#[tokio::test]
	async fn exchange_and_fetch_identity_calls_token_then_userinfo() {
		let server = MockServer::start_async().await;
		let http = IdpHttpClient::new().expect("client should build");
		let token_mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/token").body_contains("code=idp-code");
				then.status(200).json_body(json!({ "access_token": "idp-access-token" }));
			})
			.await;
		let userinfo_mock = server
			.mock_async(|when, then| {
				when.method(GET).path("/userinfo").header("authorization", "Bearer idp-access-token");
				then.status(200).json_body(json!({ "sub": "u-1", "email": "a@example.com", "name": "A" }));
			})
			.await;
		let endpoints = IdpEndpoints {
			authorization: url::Url::parse(&server.url("/authorize")).unwrap(),
			token: url::Url::parse(&server.url("/token")).unwrap(),
			userinfo: url::Url::parse(&server.url("/userinfo")).unwrap(),
		};
		let callback = url::Url::parse("https://mcp.example/oauth/google/callback").unwrap();
		let identity = exchange_and_fetch_identity(
			&http,
			&endpoints,
			"client-1",
			"secret-1",
			&callback,
			"idp-code",
			|profile| {
				let subject = profile["sub"].as_str().unwrap().to_owned();
				let email = profile["email"].as_str().map(str::to_owned);

				Ok(IdentityClaims { subject, email, display_name: None })
			},
		)
		.await
		.expect("should exchange and fetch identity");

		assert_eq!(identity.subject, "u-1");
		assert_eq!(identity.email.as_deref(), Some("a@example.com"));

		token_mock.assert_async().await;
		userinfo_mock.assert_async().await;
	}

	#[tokio::test]
	async fn token_exchange_error_is_classified_as_token_exchange_failure() {
		let server = MockServer::start_async().await;
		let http = IdpHttpClient::new().expect("client should build");
		let token_mock = server
			.mock_async(|when, then| {
				when.method(POST).path("/token");
				then.status(400).json_body(json!({ "error": "invalid_grant" }));
			})
			.await;
		let endpoints = IdpEndpoints {
			authorization: url::Url::parse(&server.url("/authorize")).unwrap(),
			token: url::Url::parse(&server.url("/token")).unwrap(),
			userinfo: url::Url::parse(&server.url("/userinfo")).unwrap(),
		};
		let callback = url::Url::parse("https://mcp.example/oauth/google/callback").unwrap();
		let err = exchange_and_fetch_identity(
			&http,
			&endpoints,
			"client-1",
			"secret-1",
			&callback,
			"bad-code",
			|_| unreachable!("userinfo should not be reached when the token exchange fails"),
		)
		.await
		.expect_err("token endpoint rejected the exchange");

		assert!(matches!(err, FederationError::TokenExchange { .. }));

		token_mock.assert_async().await;
	}
}
