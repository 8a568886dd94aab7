//! `POST /token` — the authorization_code and refresh_token grants (§4.B, §4.E).

// crates.io
use axum::{Json, extract::{Form, State}, http::HeaderMap};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	http::{error::ApiError, handlers::register::verify_client_secret, state::AppState},
	obs::{Operation, OperationOutcome, record_operation_outcome},
};

/// `POST /token` body. Fields are a union across both grant types (§6 "Token
/// request parameters"); which ones are required depends on `grant_type`.
#[derive(Deserialize)]
pub struct TokenRequest {
	grant_type: String,
	#[serde(default)]
	code: Option<String>,
	#[serde(default)]
	redirect_uri: Option<String>,
	#[serde(default)]
	code_verifier: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	scope: Option<String>,
	#[serde(default)]
	client_id: Option<String>,
	#[serde(default)]
	client_secret: Option<String>,
}

/// Token response wire shape (§6 "Token response").
#[derive(Serialize)]
pub struct TokenResponse {
	access_token: String,
	token_type: &'static str,
	expires_in: i64,
	refresh_token: String,
	scope: String,
}

/// Dispatches on `grant_type` after authenticating the client (§4.E client
/// authentication: HTTP Basic or body `client_id`/`client_secret` for
/// confidential clients, PKCE-only for public clients).
///
/// The request body is `application/x-www-form-urlencoded` (RFC 6749 §3.2/§4.1.3),
/// not JSON — matching the consent routes' `Form<...>` extractor and what a
/// standards-compliant MCP client actually sends.
pub async fn token(
	State(state): State<AppState>,
	headers: HeaderMap,
	Form(request): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
	record_operation_outcome(Operation::Token, OperationOutcome::Attempt);

	match token_inner(state, &headers, request).await {
		Ok(response) => {
			record_operation_outcome(Operation::Token, OperationOutcome::Success);

			Ok(Json(response))
		},
		Err(error) => {
			record_operation_outcome(Operation::Token, OperationOutcome::Failure);

			Err(error.into())
		},
	}
}

async fn token_inner(
	state: AppState,
	headers: &HeaderMap,
	request: TokenRequest,
) -> Result<TokenResponse, Error> {
	let client_id = client_id_from(headers, &request)
		.ok_or_else(|| Error::InvalidClient { reason: "client_id is required".into() })?;
	let client = state
		.store
		.get_client(&client_id)
		.map_err(|_| Error::InvalidClient { reason: "unknown client_id".into() })?;

	authenticate_client(headers, &request, &client)?;

	let tokens = match request.grant_type.as_str() {
		"authorization_code" => {
			let code = request
				.code
				.as_deref()
				.ok_or_else(|| Error::InvalidRequest { reason: "code is required".into() })?;
			let code_verifier = request
				.code_verifier
				.as_deref()
				.ok_or_else(|| Error::InvalidRequest { reason: "code_verifier is required".into() })?;
			let redirect_uri = request
				.redirect_uri
				.as_deref()
				.ok_or_else(|| Error::InvalidRequest { reason: "redirect_uri is required".into() })?;

			state.provider.exchange_code(code, code_verifier, redirect_uri, &client).await?
		},
		"refresh_token" => {
			let refresh_token = request
				.refresh_token
				.as_deref()
				.ok_or_else(|| Error::InvalidRequest { reason: "refresh_token is required".into() })?;
			let requested_scope = request
				.scope
				.as_deref()
				.map(|raw| ScopeSet::new(raw.split_whitespace()))
				.unwrap_or_default();

			state.provider.refresh(refresh_token, &client, requested_scope).await?
		},
		other => return Err(Error::UnsupportedGrantType { grant_type: other.to_owned() }),
	};

	Ok(TokenResponse {
		access_token: tokens.access_token.token,
		token_type: "Bearer",
		expires_in: tokens.access_token.expires_at - tokens.access_token.issued_at,
		refresh_token: tokens.refresh_token.token,
		scope: tokens.access_token.scope.normalized(),
	})
}

/// Recovers the claimed `client_id` from either the Basic auth header or the
/// body, without yet verifying the secret.
fn client_id_from(headers: &HeaderMap, request: &TokenRequest) -> Option<String> {
	basic_auth(headers).map(|(client_id, _)| client_id).or_else(|| request.client_id.clone())
}

/// Authenticates the client per its registered `token_endpoint_auth_method`
/// (§4.E): confidential clients must present a matching secret via Basic or
/// the body; public clients present none (PKCE carries the proof instead).
fn authenticate_client(
	headers: &HeaderMap,
	request: &TokenRequest,
	client: &crate::auth::ClientRegistration,
) -> Result<(), Error> {
	if !client.is_confidential() {
		return Ok(());
	}

	let secret = basic_auth(headers)
		.filter(|(id, _)| *id == client.client_id)
		.map(|(_, secret)| secret)
		.or_else(|| request.client_secret.clone())
		.ok_or_else(|| Error::InvalidClient { reason: "client_secret is required".into() })?;
	let hash = client
		.client_secret_hash
		.as_deref()
		.ok_or_else(|| Error::InvalidClient { reason: "client has no stored secret".into() })?;

	if verify_client_secret(&secret, hash) {
		Ok(())
	} else {
		Err(Error::InvalidClient { reason: "client_secret does not match".into() })
	}
}

/// Decodes an `Authorization: Basic <base64(client_id:client_secret)>` header.
fn basic_auth(headers: &HeaderMap) -> Option<(String, String)> {
	let raw = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
	let encoded = raw.strip_prefix("Basic ")?;
	let decoded = BASE64_STANDARD.decode(encoded).ok()?;
	let text = String::from_utf8(decoded).ok()?;
	let (client_id, secret) = text.split_once(':')?;

	Some((client_id.to_owned(), secret.to_owned()))
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::{HeaderValue, header};
	// self
	use super::*;

	fn empty_request() -> TokenRequest {
		TokenRequest {
			grant_type: "authorization_code".into(),
			code: None,
			redirect_uri: None,
			code_verifier: None,
			refresh_token: None,
			scope: None,
			client_id: None,
			client_secret: None,
		}
	}

	#[test]
	fn basic_auth_decodes_colon_separated_credentials() {
		let mut headers = HeaderMap::new();
		let encoded = BASE64_STANDARD.encode(b"client-1:s3cr3t");

		headers.insert(
			header::AUTHORIZATION,
			HeaderValue::from_str(&format!("Basic {encoded}")).unwrap(),
		);

		let (client_id, secret) = basic_auth(&headers).expect("should decode");

		assert_eq!(client_id, "client-1");
		assert_eq!(secret, "s3cr3t");
	}

	#[test]
	fn client_id_falls_back_to_body_when_no_basic_header() {
		let request = TokenRequest { client_id: Some("client-2".into()), ..empty_request() };

		assert_eq!(client_id_from(&HeaderMap::new(), &request).as_deref(), Some("client-2"));
	}
}
