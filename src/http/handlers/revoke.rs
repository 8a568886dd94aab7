//! `POST /revoke` — best-effort token revocation (§4.E, §4.C `revoke`).

// crates.io
use axum::{extract::{Form, State}, http::StatusCode};
// self
use crate::_prelude::*;
use crate::{
	http::state::AppState,
	obs::{Operation, OperationOutcome, record_operation_outcome},
};

/// Request body: either an access or a refresh token, indistinguishable by
/// shape, so the provider is asked to revoke whichever it is. Form-encoded per
/// RFC 7009 §2.1, not JSON.
#[derive(Deserialize)]
pub struct RevokeRequest {
	token: String,
}

/// Always returns 200, whether or not `token` existed (§4.E "always returns 200").
pub async fn revoke(State(state): State<AppState>, Form(request): Form<RevokeRequest>) -> StatusCode {
	record_operation_outcome(Operation::Revoke, OperationOutcome::Attempt);

	state.provider.revoke(&request.token);

	record_operation_outcome(Operation::Revoke, OperationOutcome::Success);

	StatusCode::OK
}
