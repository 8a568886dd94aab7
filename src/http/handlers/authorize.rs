//! `GET /authorize`, `POST /oauth/authorize/approve` (§4.D steps 1 and 4, §4.E).

// crates.io
use askama::Template;
use axum::{
	extract::{Form, Query, State},
	response::{Html, IntoResponse, Redirect, Response},
};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	http::{error::ApiError, state::AppState, templates::ConsentTemplate},
	obs::{Operation, OperationOutcome, record_operation_outcome},
	provider::{AuthorizeOutcome, AuthorizeRequest},
	token::PkceMethod,
};

/// Query parameters accepted by `GET /authorize` (§4.D step 1).
#[derive(Deserialize)]
pub struct AuthorizeQuery {
	client_id: String,
	redirect_uri: String,
	response_type: String,
	#[serde(default)]
	scope: Option<String>,
	state: String,
	code_challenge: String,
	code_challenge_method: String,
}

/// Validates the request, consults the client's registered redirect URIs, then
/// either renders local consent or 302s to an external IdP.
pub async fn authorize(
	State(state): State<AppState>,
	Query(query): Query<AuthorizeQuery>,
) -> Result<Response, ApiError> {
	record_operation_outcome(Operation::Authorize, OperationOutcome::Attempt);

	let result = authorize_inner(state, query).await;

	record_operation_outcome(
		Operation::Authorize,
		if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure },
	);

	result
}

async fn authorize_inner(state: AppState, query: AuthorizeQuery) -> Result<Response, ApiError> {
	let client = state
		.store
		.get_client(&query.client_id)
		.map_err(|_| ApiError::Html(Error::InvalidClient { reason: "unknown client_id".into() }))?;

	if !client.allows_redirect(&query.redirect_uri) {
		return Err(ApiError::Html(Error::InvalidRequest {
			reason: "redirect_uri is not registered for this client".into(),
		}));
	}

	// Past this point the redirect_uri is trusted, so every remaining failure
	// redirects back to the client with `error`/`state` instead of rendering HTML.
	let into_redirect = |error: Error| ApiError::Redirect {
		error,
		redirect_uri: query.redirect_uri.clone(),
		state: query.state.clone(),
	};

	if query.response_type != "code" {
		return Err(into_redirect(Error::UnsupportedGrantType { grant_type: query.response_type }));
	}

	if let Err(error) = PkceMethod::parse(&query.code_challenge_method) {
		return Err(into_redirect(error));
	}

	if !client.is_confidential() && query.code_challenge_method != "S256" {
		return Err(into_redirect(Error::InvalidRequest {
			reason: "public clients must use the S256 code_challenge_method".into(),
		}));
	}

	let requested = query
		.scope
		.as_deref()
		.map(|raw| ScopeSet::new(raw.split_whitespace()))
		.unwrap_or_else(|| client.scope.clone());

	if !requested.is_subset_of(&client.scope) {
		return Err(into_redirect(Error::InvalidScope {
			reason: "requested scope exceeds what was granted at registration".into(),
		}));
	}

	let request = AuthorizeRequest {
		client,
		redirect_uri: query.redirect_uri.clone(),
		scope: requested,
		state: query.state.clone(),
		code_challenge: query.code_challenge,
		code_challenge_method: query.code_challenge_method,
	};
	let outcome =
		state.provider.start_authorization(request).await.map_err(|error| into_redirect(error))?;

	Ok(match outcome {
		AuthorizeOutcome::Consent(view) => {
			let template = ConsentTemplate::from(view);

			match template.render() {
				Ok(body) => Html(body).into_response(),
				Err(_) => {
					into_redirect(Error::ServerError { reason: "failed to render consent page".into() })
						.into_response()
				},
			}
		},
		AuthorizeOutcome::ExternalRedirect(url) => Redirect::to(url.as_str()).into_response(),
	})
}

/// Decision posted from the consent form.
#[derive(Deserialize)]
pub struct ApproveRequest {
	ticket: String,
	decision: Decision,
}

/// The two outcomes a consent form can post.
#[derive(Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
	/// The resource owner approved the request.
	Approve,
	/// The resource owner denied the request.
	Deny,
}

/// Resolves a consent decision into a redirect back to the MCP client: `code`
/// and `state` on approval, `error=access_denied` and `state` on denial (§4.D
/// step 4).
pub async fn approve(
	State(state): State<AppState>,
	Form(request): Form<ApproveRequest>,
) -> Result<Response, ApiError> {
	record_operation_outcome(Operation::Consent, OperationOutcome::Attempt);

	let result = approve_inner(state, request);

	record_operation_outcome(
		Operation::Consent,
		if result.is_ok() { OperationOutcome::Success } else { OperationOutcome::Failure },
	);

	result
}

fn approve_inner(state: AppState, request: ApproveRequest) -> Result<Response, ApiError> {
	if request.decision == Decision::Deny {
		// The pending record is still keyed by the ticket; consume it purely to
		// recover the redirect_uri/state pair so the denial can be echoed back.
		let pending = state.store.take_pending(&request.ticket).map_err(|_| {
			ApiError::Html(Error::InvalidRequest { reason: "unknown or expired consent ticket".into() })
		})?;

		return Err(ApiError::Redirect {
			error: Error::AccessDenied { reason: "the resource owner denied the request".into() },
			redirect_uri: pending.redirect_uri,
			state: pending.mcp_state,
		});
	}

	let code = state
		.provider
		.complete_authorization(&request.ticket)
		.map_err(|error| ApiError::Html(error))?;
	let mut redirect_uri = url::Url::parse(&code.redirect_uri)
		.map_err(|_| ApiError::Html(Error::ServerError { reason: "stored redirect_uri is invalid".into() }))?;

	redirect_uri.query_pairs_mut().append_pair("code", &code.code).append_pair("state", &code.mcp_state);

	Ok(Redirect::to(redirect_uri.as_str()).into_response())
}
