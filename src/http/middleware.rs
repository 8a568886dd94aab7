//! Bearer-token validation middleware (§4.E "Bearer middleware").

// crates.io
use axum::{
	extract::{Request, State},
	http::header,
	middleware::Next,
	response::Response,
};
// self
use crate::{_prelude::*, auth::ScopeSet, http::error::unauthorized_bearer, http::state::AppState};

/// Identity attached to the request extensions on a successful bearer check,
/// available to downstream handlers via `Extension<Identity>`.
#[derive(Clone, Debug)]
pub struct Identity {
	/// The client the access token was issued to.
	pub client_id: String,
	/// The scopes the access token carries.
	pub scopes: ScopeSet,
	/// The federated subject, if the token was minted after an IdP round trip.
	pub subject: Option<String>,
}

/// Validates `Authorization: Bearer <token>` against `Provider::introspect`,
/// attaching an [`Identity`] extension on success or returning 401 with
/// `WWW-Authenticate: Bearer error="invalid_token"` on failure (§4.E).
pub async fn require_bearer_token(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Response {
	let Some(token) = request
		.headers()
		.get(header::AUTHORIZATION)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.strip_prefix("Bearer "))
	else {
		return unauthorized_bearer();
	};

	match state.provider.introspect(token) {
		Ok(access_token) => {
			request.extensions_mut().insert(Identity {
				client_id: access_token.client_id,
				scopes: access_token.scope,
				subject: access_token.subject,
			});

			next.run(request).await
		},
		Err(_) => unauthorized_bearer(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::{body::Body, http::Request, middleware::from_fn_with_state, routing::get};
	use tower::ServiceExt;
	// self
	use super::*;
	use crate::{auth::AccessToken, provider::CustomProvider, store::disk::Store, token::TokenPolicy};

	fn app_state(dir_suffix: &str) -> AppState {
		let dir = std::env::temp_dir()
			.join(format!("mcp_oauth_core_middleware_{dir_suffix}_{}", std::process::id()));
		let store: Arc<dyn crate::store::CredentialStore> =
			Arc::new(Store::open(dir).expect("store should open"));
		let valid_scopes = ScopeSet::new(["read"]);
		let provider =
			Arc::new(CustomProvider::new(store.clone(), TokenPolicy::default(), valid_scopes.clone()));

		AppState {
			provider,
			store,
			issuer_url: url::Url::parse("https://auth.example.com").unwrap(),
			valid_scopes,
			default_scopes: ScopeSet::default(),
		}
	}

	fn protected_router(state: AppState) -> axum::Router {
		axum::Router::new()
			.route("/protected", get(|| async { "ok" }))
			.layer(from_fn_with_state(state.clone(), require_bearer_token))
			.with_state(state)
	}

	#[tokio::test]
	async fn missing_authorization_header_is_rejected() {
		let router = protected_router(app_state("missing_header"));
		let response = router
			.oneshot(Request::builder().uri("/protected").body(Body::empty()).unwrap())
			.await
			.expect("request should complete");

		assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
		assert!(response.headers().get(header::WWW_AUTHENTICATE).is_some());
	}

	#[tokio::test]
	async fn unknown_bearer_token_is_rejected() {
		let router = protected_router(app_state("unknown_token"));
		let response = router
			.oneshot(
				Request::builder()
					.uri("/protected")
					.header(header::AUTHORIZATION, "Bearer not-a-real-token")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.expect("request should complete");

		assert_eq!(response.status(), axum::http::StatusCode::UNAUTHORIZED);
	}

	#[tokio::test]
	async fn valid_bearer_token_is_accepted() {
		let state = app_state("valid_token");
		let access_token = AccessToken {
			token: "tok-1".into(),
			client_id: "client-1".into(),
			scope: ScopeSet::new(["read"]),
			subject: None,
			issued_at: 0,
			expires_at: 9_999_999_999,
		};

		state.store.add_access_token(access_token).expect("token should store");

		let router = protected_router(state);
		let response = router
			.oneshot(
				Request::builder()
					.uri("/protected")
					.header(header::AUTHORIZATION, "Bearer tok-1")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.expect("request should complete");

		assert_eq!(response.status(), axum::http::StatusCode::OK);
	}
}
