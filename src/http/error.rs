//! Maps the server-wide [`Error`] taxonomy onto HTTP responses (§7): JSON for
//! the token/registration/revocation endpoints, a redirect back to the MCP
//! client when a safe `redirect_uri` is known, and a plain HTML page otherwise.

// crates.io
use askama::Template;
use axum::{
	Json,
	http::{HeaderValue, StatusCode, header},
	response::{Html, IntoResponse, Redirect, Response},
};
// self
use crate::{_prelude::*, http::templates::ErrorTemplate};

/// Wire shape of the JSON error body (§6 "Error response").
#[derive(Serialize)]
struct ErrorBody {
	error: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	error_description: Option<String>,
}

/// How an [`Error`] should be rendered at the edge of the HTTP surface.
pub enum ApiError {
	/// JSON error body (`/register`, `/token`, `/revoke`, bearer middleware).
	Json(Error),
	/// 302 back to the MCP client's `redirect_uri`, carrying `error` and the
	/// original `state` (§7 "Redirect URIs always carry state back unchanged").
	Redirect {
		/// Error to translate into `error`/`error_description`.
		error: Error,
		/// The MCP client's redirect URI.
		redirect_uri: String,
		/// The original MCP `state`, echoed back unchanged.
		state: String,
	},
	/// Plain HTML error page, used when no redirect URI can be trusted yet
	/// (`GET /authorize` failures before the client/redirect pair is validated).
	Html(Error),
}
impl ApiError {
	/// Maps the RFC 6749 §5.2 error code onto an HTTP status code.
	fn status(error: &Error) -> StatusCode {
		match error.oauth_error_code() {
			"server_error" => StatusCode::INTERNAL_SERVER_ERROR,
			"invalid_client" => StatusCode::UNAUTHORIZED,
			_ => StatusCode::BAD_REQUEST,
		}
	}
}
impl From<Error> for ApiError {
	fn from(error: Error) -> Self {
		ApiError::Json(error)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		match self {
			ApiError::Json(error) => {
				let status = Self::status(&error);
				let body =
					ErrorBody { error: error.oauth_error_code(), error_description: Some(error.to_string()) };

				tracing::warn!(%error, code = body.error, "request rejected");

				(status, Json(body)).into_response()
			},
			ApiError::Redirect { error, redirect_uri, state } => {
				tracing::warn!(%error, %redirect_uri, "redirecting client with error");

				let mut url = match url::Url::parse(&redirect_uri) {
					Ok(url) => url,
					Err(_) => return ApiError::Html(error).into_response(),
				};

				url.query_pairs_mut()
					.append_pair("error", error.oauth_error_code())
					.append_pair("state", &state);

				Redirect::to(url.as_str()).into_response()
			},
			ApiError::Html(error) => {
				let status = Self::status(&error);
				let template = ErrorTemplate { error: error.oauth_error_code(), description: Some(error.to_string()) };

				tracing::warn!(%error, code = template.error, "rendering HTML error page");

				match template.render() {
					Ok(body) => (status, Html(body)).into_response(),
					Err(_) => (status, Html("<h1>Authorization error</h1>")).into_response(),
				}
			},
		}
	}
}

/// `WWW-Authenticate` header value for a rejected bearer token (§4.E "Bearer
/// middleware").
pub fn invalid_token_challenge() -> HeaderValue {
	HeaderValue::from_static(r#"Bearer error="invalid_token""#)
}

/// 401 response for the bearer middleware, carrying the challenge header.
pub fn unauthorized_bearer() -> Response {
	let mut response = StatusCode::UNAUTHORIZED.into_response();

	response.headers_mut().insert(header::WWW_AUTHENTICATE, invalid_token_challenge());

	response
}
