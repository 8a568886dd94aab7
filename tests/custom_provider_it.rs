//! End-to-end coverage of the custom (local-consent) provider over the real
//! axum router, driven in-process via `tower::ServiceExt::oneshot`.

// crates.io
use axum::{
	body::Body,
	http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;
// self
use mcp_oauth_core::{
	auth::ScopeSet,
	http::{self, state::AppState},
	provider::CustomProvider,
	store::{CredentialStore, disk::Store},
	token::{TokenPolicy, compute_pkce_challenge},
};

fn test_state(dir_suffix: &str) -> AppState {
	let dir = std::env::temp_dir()
		.join(format!("mcp_oauth_core_it_{dir_suffix}_{}", std::process::id()));
	let store: std::sync::Arc<dyn CredentialStore> =
		std::sync::Arc::new(Store::open(dir).expect("store should open"));
	let valid_scopes = ScopeSet::new(["read", "write"]);
	let provider = std::sync::Arc::new(CustomProvider::new(
		store.clone(),
		TokenPolicy::default(),
		valid_scopes.clone(),
	));

	AppState {
		provider,
		store,
		issuer_url: url::Url::parse("https://auth.example.com").unwrap(),
		valid_scopes,
		default_scopes: ScopeSet::new(["read"]),
	}
}

async fn json_body(response: axum::response::Response) -> Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body should read");

	serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Builds a form-urlencoded `POST` request, matching what the `/token` and
/// `/revoke` endpoints actually require (RFC 6749 §3.2/§4.1.3, RFC 7009 §2.1).
fn form_request(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
	let body = pairs.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&");

	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(body))
		.unwrap()
}

async fn register_client(router: &axum::Router, redirect_uri: &str, confidential: bool) -> Value {
	let auth_method = if confidential { "client_secret_basic" } else { "none" };
	let body = json!({
		"redirect_uris": [redirect_uri],
		"scope": "read write",
		"token_endpoint_auth_method": auth_method,
	});
	let request = Request::builder()
		.method("POST")
		.uri("/register")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.unwrap();
	let response = router.clone().oneshot(request).await.expect("request should complete");

	assert_eq!(response.status(), StatusCode::OK);

	json_body(response).await
}

#[tokio::test]
async fn full_authorization_code_round_trip_with_pkce() {
	let state = test_state("happy_path");
	let router = http::router(state);
	let redirect_uri = "https://app.example/cb";
	let registration = register_client(&router, redirect_uri, false).await;
	let client_id = registration["client_id"].as_str().unwrap().to_owned();
	let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
	let challenge = compute_pkce_challenge(verifier);
	let authorize_uri = format!(
		"/authorize?client_id={client_id}&redirect_uri={redirect_uri}&response_type=code&scope=read&state=xyz&code_challenge={challenge}&code_challenge_method=S256",
	);
	let authorize_request = Request::builder().uri(&authorize_uri).body(Body::empty()).unwrap();
	let authorize_response = router.clone().oneshot(authorize_request).await.expect("should respond");

	assert_eq!(authorize_response.status(), StatusCode::OK);

	let bytes =
		axum::body::to_bytes(authorize_response.into_body(), usize::MAX).await.expect("body should read");
	let html = String::from_utf8(bytes.to_vec()).expect("consent page should be UTF-8");
	let ticket = extract_hidden_field(&html, "ticket").expect("consent page carries a ticket");
	let approve_request = Request::builder()
		.method("POST")
		.uri("/oauth/authorize/approve")
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(format!("ticket={ticket}&decision=approve")))
		.unwrap();
	let approve_response = router.clone().oneshot(approve_request).await.expect("should respond");

	assert_eq!(approve_response.status(), StatusCode::SEE_OTHER);

	let location = approve_response
		.headers()
		.get(header::LOCATION)
		.expect("redirect carries Location")
		.to_str()
		.unwrap()
		.to_owned();
	let redirected = url::Url::parse(&location).expect("Location should be a URL");
	let pairs: std::collections::HashMap<_, _> = redirected.query_pairs().into_owned().collect();
	let code = pairs.get("code").expect("redirect carries the code").clone();

	assert_eq!(pairs.get("state").map(String::as_str), Some("xyz"));

	let token_pairs = [
		("grant_type", "authorization_code"),
		("code", code.as_str()),
		("redirect_uri", redirect_uri),
		("code_verifier", verifier),
		("client_id", client_id.as_str()),
	];
	let token_response =
		router.clone().oneshot(form_request("/token", &token_pairs)).await.expect("should respond");

	assert_eq!(token_response.status(), StatusCode::OK);

	let tokens = json_body(token_response).await;
	let access_token = tokens["access_token"].as_str().unwrap().to_owned();
	let refresh_token = tokens["refresh_token"].as_str().unwrap().to_owned();

	assert_eq!(tokens["token_type"], "Bearer");
	assert_eq!(tokens["scope"], "read");
	assert!(access_token.len() > 0);

	// Reusing the same code a second time must fail (invariant 2) and must
	// invalidate the tokens minted from the first redemption.
	let replay_response =
		router.clone().oneshot(form_request("/token", &token_pairs)).await.expect("should respond");

	assert_eq!(replay_response.status(), StatusCode::BAD_REQUEST);

	// The replay must also invalidate the tokens minted from the first
	// redemption (§3 invariant 2), not just reject the second code use.
	let revoke_check_pairs =
		[("grant_type", "refresh_token"), ("refresh_token", refresh_token.as_str()), ("client_id", client_id.as_str())];
	let revoked_refresh_response =
		router.clone().oneshot(form_request("/token", &revoke_check_pairs)).await.expect("should respond");

	assert_eq!(revoked_refresh_response.status(), StatusCode::BAD_REQUEST);
	assert!(access_token.len() > 0);
}

#[tokio::test]
async fn mismatched_pkce_verifier_is_rejected_as_invalid_grant() {
	let state = test_state("pkce_mismatch");
	let router = http::router(state);
	let redirect_uri = "https://app.example/cb";
	let registration = register_client(&router, redirect_uri, false).await;
	let client_id = registration["client_id"].as_str().unwrap().to_owned();
	let challenge = compute_pkce_challenge("correct-verifier");
	let authorize_uri = format!(
		"/authorize?client_id={client_id}&redirect_uri={redirect_uri}&response_type=code&scope=read&state=xyz&code_challenge={challenge}&code_challenge_method=S256",
	);
	let authorize_response =
		router.clone().oneshot(Request::builder().uri(&authorize_uri).body(Body::empty()).unwrap()).await.unwrap();
	let bytes = axum::body::to_bytes(authorize_response.into_body(), usize::MAX).await.unwrap();
	let html = String::from_utf8(bytes.to_vec()).unwrap();
	let ticket = extract_hidden_field(&html, "ticket").unwrap();
	let approve_response = router
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/oauth/authorize/approve")
				.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
				.body(Body::from(format!("ticket={ticket}&decision=approve")))
				.unwrap(),
		)
		.await
		.unwrap();
	let location = approve_response.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_owned();
	let redirected = url::Url::parse(&location).unwrap();
	let pairs: std::collections::HashMap<_, _> = redirected.query_pairs().into_owned().collect();
	let code = pairs.get("code").unwrap().clone();
	let token_pairs = [
		("grant_type", "authorization_code"),
		("code", code.as_str()),
		("redirect_uri", redirect_uri),
		("code_verifier", "wrong-verifier"),
		("client_id", client_id.as_str()),
	];
	let token_response = router.oneshot(form_request("/token", &token_pairs)).await.unwrap();

	assert_eq!(token_response.status(), StatusCode::BAD_REQUEST);

	let body = json_body(token_response).await;

	assert_eq!(body["error"], "invalid_grant");
}

#[tokio::test]
async fn refresh_narrows_scope_and_rotates_the_token() {
	let state = test_state("scope_narrowing");
	let router = http::router(state);
	let redirect_uri = "https://app.example/cb";
	let registration = register_client(&router, redirect_uri, false).await;
	let client_id = registration["client_id"].as_str().unwrap().to_owned();
	let verifier = "verifier-for-scope-test-00000000000000000000000";
	let challenge = compute_pkce_challenge(verifier);
	let authorize_uri = format!(
		"/authorize?client_id={client_id}&redirect_uri={redirect_uri}&response_type=code&scope=read%20write&state=s1&code_challenge={challenge}&code_challenge_method=S256",
	);
	let authorize_response =
		router.clone().oneshot(Request::builder().uri(&authorize_uri).body(Body::empty()).unwrap()).await.unwrap();
	let bytes = axum::body::to_bytes(authorize_response.into_body(), usize::MAX).await.unwrap();
	let html = String::from_utf8(bytes.to_vec()).unwrap();
	let ticket = extract_hidden_field(&html, "ticket").unwrap();
	let approve_response = router
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/oauth/authorize/approve")
				.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
				.body(Body::from(format!("ticket={ticket}&decision=approve")))
				.unwrap(),
		)
		.await
		.unwrap();
	let location = approve_response.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_owned();
	let redirected = url::Url::parse(&location).unwrap();
	let pairs: std::collections::HashMap<_, _> = redirected.query_pairs().into_owned().collect();
	let code = pairs.get("code").unwrap().clone();
	let exchange_pairs = [
		("grant_type", "authorization_code"),
		("code", code.as_str()),
		("redirect_uri", redirect_uri),
		("code_verifier", verifier),
		("client_id", client_id.as_str()),
	];
	let exchange_response =
		router.clone().oneshot(form_request("/token", &exchange_pairs)).await.unwrap();
	let tokens = json_body(exchange_response).await;
	let refresh_token = tokens["refresh_token"].as_str().unwrap().to_owned();

	assert_eq!(tokens["scope"], "read write");

	let refresh_pairs = [
		("grant_type", "refresh_token"),
		("refresh_token", refresh_token.as_str()),
		("scope", "read"),
		("client_id", client_id.as_str()),
	];
	let refresh_response =
		router.clone().oneshot(form_request("/token", &refresh_pairs)).await.unwrap();
	let refreshed = json_body(refresh_response).await;

	assert_eq!(refreshed["scope"], "read");
	assert_ne!(refreshed["refresh_token"], refresh_token);

	// The old refresh token must no longer be usable (invariant 3: rotation
	// is all-or-nothing).
	let reuse_response = router.oneshot(form_request("/token", &refresh_pairs)).await.unwrap();

	assert_eq!(reuse_response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revoke_always_returns_200_even_for_unknown_tokens() {
	let state = test_state("revoke");
	let router = http::router(state);
	let response =
		router.oneshot(form_request("/revoke", &[("token", "never-issued")])).await.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn metadata_document_lists_every_endpoint() {
	let state = test_state("metadata");
	let router = http::router(state);
	let response = router
		.oneshot(
			Request::builder().uri("/.well-known/oauth-authorization-server").body(Body::empty()).unwrap(),
		)
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);

	let body = json_body(response).await;

	assert_eq!(body["issuer"], "https://auth.example.com/");
	assert_eq!(body["token_endpoint"], "https://auth.example.com/token");
	assert_eq!(body["registration_endpoint"], "https://auth.example.com/register");
}

/// Pulls a hidden `<input>`'s `value="..."` out of rendered consent HTML.
/// Good enough for this crate's own fixed template rather than a full parser.
fn extract_hidden_field(html: &str, name: &str) -> Option<String> {
	let marker = format!(r#"name="{name}" value=""#);
	let start = html.find(&marker)? + marker.len();
	let rest = &html[start..];
	let end = rest.find('"')?;

	Some(rest[..end].to_owned())
}
