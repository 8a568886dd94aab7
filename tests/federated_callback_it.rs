//! Coverage for the IdP callback leg (`GET /oauth/google/callback`) that does not
//! depend on actually reaching an external identity provider: the `error`
//! branch and the unresolvable-`state` fallback both live entirely in
//! `http/handlers/callback.rs`, so they're exercised here against the router
//! wired with the local-consent provider.

// crates.io
use axum::{
	body::Body,
	http::{Request, StatusCode, header},
};
use tower::ServiceExt;
// self
use mcp_oauth_core::{
	auth::{PendingAuthorization, ScopeSet},
	http::{self, state::AppState},
	provider::CustomProvider,
	store::{CredentialStore, disk::Store},
	token::TokenPolicy,
};

fn test_state(dir_suffix: &str) -> AppState {
	let dir =
		std::env::temp_dir().join(format!("mcp_oauth_core_cb_it_{dir_suffix}_{}", std::process::id()));
	let store: std::sync::Arc<dyn CredentialStore> =
		std::sync::Arc::new(Store::open(dir).expect("store should open"));
	let valid_scopes = ScopeSet::new(["read"]);
	let provider =
		std::sync::Arc::new(CustomProvider::new(store.clone(), TokenPolicy::default(), valid_scopes.clone()));

	AppState {
		provider,
		store,
		issuer_url: url::Url::parse("https://auth.example.com").unwrap(),
		valid_scopes,
		default_scopes: ScopeSet::new(["read"]),
	}
}

fn pending_fixture() -> PendingAuthorization {
	PendingAuthorization {
		client_id: "client-1".into(),
		redirect_uri: "https://app.example/cb".into(),
		scope: ScopeSet::new(["read"]),
		code_challenge: "challenge".into(),
		code_challenge_method: "S256".into(),
		mcp_state: "original-mcp-state".into(),
		identity: None,
		created_at: 0,
		expires_at: 9_999_999_999,
	}
}

#[tokio::test]
async fn idp_error_with_resolvable_state_redirects_with_access_denied() {
	let state = test_state("resolvable");

	state.store.put_pending("correlation-1".into(), pending_fixture()).expect("pending should store");

	let router = http::router(state);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/oauth/google/callback?state=correlation-1&error=access_denied")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.expect("request should complete");

	assert_eq!(response.status(), StatusCode::SEE_OTHER);

	let location = response.headers().get(header::LOCATION).expect("should redirect").to_str().unwrap();
	let redirected = url::Url::parse(location).expect("Location should be a URL");
	let pairs: std::collections::HashMap<_, _> = redirected.query_pairs().into_owned().collect();

	assert_eq!(redirected.as_str().split('?').next(), Some("https://app.example/cb"));
	assert_eq!(pairs.get("error").map(String::as_str), Some("access_denied"));
	assert_eq!(pairs.get("state").map(String::as_str), Some("original-mcp-state"));
}

#[tokio::test]
async fn idp_error_with_unresolvable_state_renders_html_instead_of_guessing_a_redirect() {
	let state = test_state("unresolvable_error");
	let router = http::router(state);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/oauth/google/callback?state=never-seen&error=access_denied")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.expect("request should complete");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(
		response
			.headers()
			.get(header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.is_some_and(|v| v.contains("text/html"))
	);
}

#[tokio::test]
async fn successful_callback_with_unresolvable_state_renders_html() {
	// The custom provider has no IdP leg at all, so `handle_idp_callback` always
	// fails regardless of `state` — this exercises the same HTML fallback path a
	// federated provider hits when the correlation token can't be resolved.
	let state = test_state("unresolvable_success");
	let router = http::router(state);
	let response = router
		.oneshot(
			Request::builder()
				.uri("/oauth/google/callback?state=never-seen&code=idp-code-123")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.expect("request should complete");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_missing_code_and_error_renders_html() {
	let state = test_state("missing_code");
	let router = http::router(state);
	let response = router
		.oneshot(
			Request::builder().uri("/oauth/google/callback?state=whatever").body(Body::empty()).unwrap(),
		)
		.await
		.expect("request should complete");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
