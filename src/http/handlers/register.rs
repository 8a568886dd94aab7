//! `POST /register` — dynamic client registration (§4.E, §6).

// crates.io
use axum::{Json, extract::State};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{ClientRegistration, ScopeSet, TokenEndpointAuthMethod, generate_opaque_string},
	http::{error::ApiError, state::AppState},
	obs::{Operation, OperationOutcome, record_operation_outcome},
};

/// Request body (§6 "Dynamic client registration").
#[derive(Deserialize)]
pub struct RegisterRequest {
	redirect_uris: Vec<String>,
	client_name: Option<String>,
	scope: Option<String>,
	token_endpoint_auth_method: Option<TokenEndpointAuthMethod>,
	grant_types: Option<Vec<String>>,
	response_types: Option<Vec<String>>,
}

/// Response body: the stored registration plus the plaintext secret, returned
/// exactly once.
#[derive(Serialize)]
pub struct RegisterResponse {
	client_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	client_secret: Option<String>,
	client_id_issued_at: i64,
	redirect_uris: Vec<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	client_name: Option<String>,
	scope: String,
	token_endpoint_auth_method: TokenEndpointAuthMethod,
	grant_types: Vec<String>,
	response_types: Vec<String>,
}

/// Registers a new client, minting and hashing a secret for confidential
/// clients (§3 "Client registration").
pub async fn register(
	State(state): State<AppState>,
	Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
	record_operation_outcome(Operation::RegisterClient, OperationOutcome::Attempt);

	match register_inner(state, request) {
		Ok(response) => {
			tracing::info!(client_id = %response.client_id, "registered new OAuth client");
			record_operation_outcome(Operation::RegisterClient, OperationOutcome::Success);

			Ok(Json(response))
		},
		Err(error) => {
			record_operation_outcome(Operation::RegisterClient, OperationOutcome::Failure);

			Err(error.into())
		},
	}
}

fn register_inner(state: AppState, request: RegisterRequest) -> Result<RegisterResponse, Error> {
	if request.redirect_uris.is_empty() {
		return Err(Error::InvalidRequest { reason: "redirect_uris must not be empty".into() });
	}

	let auth_method = request.token_endpoint_auth_method.unwrap_or_default();
	let scope = match request.scope {
		Some(raw) => ScopeSet::new(raw.split_whitespace()),
		None => state.default_scopes.clone(),
	};
	let (client_secret, client_secret_hash) = if auth_method.is_confidential() {
		let secret = generate_opaque_string();
		let hash = hash_client_secret(&secret);

		(Some(secret), Some(hash))
	} else {
		(None, None)
	};
	let now = OffsetDateTime::now_utc().unix_timestamp();
	let record = ClientRegistration {
		client_id: generate_opaque_string(),
		client_secret_hash,
		redirect_uris: request.redirect_uris,
		scope,
		token_endpoint_auth_method: auth_method,
		grant_types: request.grant_types.unwrap_or_else(|| vec!["authorization_code".into(), "refresh_token".into()]),
		response_types: request.response_types.unwrap_or_else(|| vec!["code".into()]),
		client_name: request.client_name,
		issued_at: now,
	};

	state.store.register_client(record.clone())?;

	Ok(RegisterResponse {
		client_id: record.client_id,
		client_secret,
		client_id_issued_at: record.issued_at,
		redirect_uris: record.redirect_uris,
		client_name: record.client_name,
		scope: record.scope.normalized(),
		token_endpoint_auth_method: record.token_endpoint_auth_method,
		grant_types: record.grant_types,
		response_types: record.response_types,
	})
}

/// Hashes a freshly minted client secret for storage. Reuses the crate's
/// existing SHA-256/base64url primitives (§4.B) rather than pulling in a
/// dedicated password-hashing crate for a single-use, high-entropy secret;
/// see DESIGN.md for the tradeoff.
pub fn hash_client_secret(secret: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(secret.as_bytes());

	format!("sha256:{}", URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

/// Verifies a presented client secret against its stored hash (§4.E `/token`
/// client authentication).
pub fn verify_client_secret(secret: &str, stored_hash: &str) -> bool {
	hash_client_secret(secret) == stored_hash
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn hash_round_trips_through_verify() {
		let hash = hash_client_secret("s3cr3t");

		assert!(verify_client_secret("s3cr3t", &hash));
		assert!(!verify_client_secret("wrong", &hash));
	}
}
