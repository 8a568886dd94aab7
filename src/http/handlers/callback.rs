//! `GET /oauth/google/callback`, `GET /oauth/azure/callback` — the federated
//! IdP's return leg (§4.D steps 2-3).

// crates.io
use askama::Template;
use axum::{
	extract::{Query, State},
	response::{Html, IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	http::{error::ApiError, state::AppState, templates::ConsentTemplate},
	obs::{Operation, OperationOutcome, record_operation_outcome},
};

/// Query parameters an IdP redirects back with, whether it succeeded or not.
#[derive(Deserialize)]
pub struct CallbackQuery {
	#[serde(default)]
	code: Option<String>,
	state: String,
	#[serde(default)]
	error: Option<String>,
}

/// Resolves the IdP round trip: on `error`, recovers the original redirect_uri
/// from the pending authorization (if the correlation `state` is still known)
/// and redirects the MCP client with `access_denied`; on success, consumes the
/// pending authorization, exchanges the IdP code, and renders local consent.
///
/// An unknown or already-consumed correlation `state` has no recoverable
/// redirect destination, so it renders an HTML error page rather than
/// guessing at one (§4.D "fails with `invalid_state` if absent/expired").
pub async fn callback(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
	record_operation_outcome(Operation::Federation, OperationOutcome::Attempt);

	let result = callback_inner(state, query).await;

	record_operation_outcome(
		Operation::Federation,
		if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure },
	);

	result
}

async fn callback_inner(state: AppState, query: CallbackQuery) -> Result<Response, ApiError> {
	if let Some(idp_error) = query.error {
		let reason = format!("identity provider returned `{idp_error}`");

		return Err(match state.store.take_pending(&query.state) {
			Ok(pending) => ApiError::Redirect {
				error: Error::AccessDenied { reason },
				redirect_uri: pending.redirect_uri,
				state: pending.mcp_state,
			},
			Err(_) => ApiError::Html(Error::AccessDenied { reason }),
		});
	}

	let code = query
		.code
		.ok_or_else(|| ApiError::Html(Error::InvalidRequest { reason: "callback is missing `code`".into() }))?;
	let view = state
		.provider
		.handle_idp_callback(&code, &query.state)
		.await
		.map_err(ApiError::Html)?;
	let template = ConsentTemplate::from(view);

	match template.render() {
		Ok(body) => Ok(Html(body).into_response()),
		Err(_) => {
			Ok(ApiError::Html(Error::ServerError { reason: "failed to render consent page".into() })
				.into_response())
		},
	}
}
