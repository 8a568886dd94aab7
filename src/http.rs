//! Axum HTTP surface (§4.E): route table, shared state, and middleware.
//!
//! [`Router::new`] wires every route from the table in §4.E onto [`AppState`];
//! the bearer middleware only guards routes that need an authenticated
//! identity, which today is none of the handlers below — every route here is
//! either public or authenticates the caller itself (`/token`'s client
//! authentication, `/authorize`'s consent ticket). [`middleware::require_bearer_token`]
//! is exposed for resource-serving routes a deployment layers on top of this
//! crate.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;
pub mod templates;

// crates.io
use axum::{
	Router,
	routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
// self
use crate::http::state::AppState;

/// Builds the complete route table over `state` (§4.E).
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/.well-known/oauth-authorization-server", get(handlers::metadata::metadata))
		.route("/register", post(handlers::register::register))
		.route("/authorize", get(handlers::authorize::authorize))
		.route("/oauth/authorize/approve", post(handlers::authorize::approve))
		.route("/oauth/consent/approve", post(handlers::authorize::approve))
		.route("/oauth/google/callback", get(handlers::callback::callback))
		.route("/oauth/azure/callback", get(handlers::callback::callback))
		.route("/token", post(handlers::token::token))
		.route("/revoke", post(handlers::revoke::revoke))
		.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
		.with_state(state)
}
