//! `GET /.well-known/oauth-authorization-server` (§6 "Metadata document").

// crates.io
use axum::{Json, extract::State};
// self
use crate::{_prelude::*, http::state::AppState};

/// Metadata document wire shape (§6). Every field is required by the spec;
/// `scopes_supported` reflects this deployment's configured valid scopes.
#[derive(Serialize)]
pub struct Metadata {
	issuer: String,
	authorization_endpoint: String,
	token_endpoint: String,
	registration_endpoint: String,
	revocation_endpoint: String,
	response_types_supported: &'static [&'static str],
	grant_types_supported: &'static [&'static str],
	code_challenge_methods_supported: &'static [&'static str],
	token_endpoint_auth_methods_supported: &'static [&'static str],
	scopes_supported: Vec<String>,
}

/// Serves the authorization server metadata document so MCP clients can
/// discover every other endpoint without hardcoding paths.
pub async fn metadata(State(state): State<AppState>) -> Json<Metadata> {
	let issuer = state.issuer_url.to_string();
	let join =
		|segment: &str| state.issuer_url.join(segment).map(|url| url.to_string()).unwrap_or_else(|_| issuer.clone());

	Json(Metadata {
		issuer,
		authorization_endpoint: join("authorize"),
		token_endpoint: join("token"),
		registration_endpoint: join("register"),
		revocation_endpoint: join("revoke"),
		response_types_supported: &["code"],
		grant_types_supported: &["authorization_code", "refresh_token"],
		code_challenge_methods_supported: &["S256"],
		token_endpoint_auth_methods_supported: &["client_secret_basic", "client_secret_post", "none"],
		scopes_supported: state.valid_scopes.iter().map(str::to_owned).collect(),
	})
}
