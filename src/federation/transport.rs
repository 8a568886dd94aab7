//! Shared outbound HTTP client for calls to an external identity provider
//! (discovery, token exchange, userinfo/Graph), grounded on the teacher crate's
//! `http::ReqwestHttpClient` — trimmed to what the federation orchestrator needs
//! since this crate doesn't expose the transport as a pluggable facade to
//! downstream crates the way the teacher's broker does.

// std
use std::time::Duration as StdDuration;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::Client as ReqwestClient;
// self
use crate::{_prelude::*, error::FederationError};

/// Deadline applied to every outbound call to an identity provider (§5 "may
/// suspend for up to 10 seconds before timing out").
pub const IDP_CALL_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Shared, connection-pooled client used for every Google/Azure discovery, token,
/// and userinfo call (§5 "IdP HTTP client is shared... stateless, and safe for
/// concurrent use").
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct IdpHttpClient(ReqwestClient);
#[cfg(feature = "reqwest")]
impl IdpHttpClient {
	/// Builds a client with the crate's standard 10s IdP deadline.
	pub fn new() -> Result<Self, FederationError> {
		let client = ReqwestClient::builder().timeout(IDP_CALL_TIMEOUT).build().map_err(|source| {
			FederationError::Discovery { reason: format!("failed to build HTTP client: {source}") }
		})?;

		Ok(Self(client))
	}

	/// Fetches and JSON-decodes a GET endpoint (used for OIDC discovery documents
	/// and userinfo/Graph lookups), reporting structured path-aware parse errors.
	pub async fn get_json<T>(&self, url: &url::Url, bearer: Option<&str>) -> Result<T, FederationError>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut request = self.0.get(url.clone());

		if let Some(token) = bearer {
			request = request.bearer_auth(token);
		}

		let response = request.send().await.map_err(|source| FederationError::Userinfo {
			reason: format!("request to {url} failed: {source}"),
		})?;

		decode_json(response, |reason| FederationError::Userinfo { reason }).await
	}

	/// POSTs a form-encoded body (the token endpoint contract of every IdP this
	/// crate federates to) and JSON-decodes the response.
	pub async fn post_form<T>(
		&self,
		url: &url::Url,
		form: &[(&str, &str)],
		basic_auth: Option<(&str, &str)>,
	) -> Result<T, FederationError>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut request = self.0.post(url.clone()).form(form);

		if let Some((user, pass)) = basic_auth {
			request = request.basic_auth(user, Some(pass));
		}

		let response = request.send().await.map_err(|source| FederationError::TokenExchange {
			reason: format!("request to {url} failed: {source}"),
		})?;

		decode_json(response, |reason| FederationError::TokenExchange { reason }).await
	}
}

#[cfg(feature = "reqwest")]
async fn decode_json<T>(
	response: reqwest::Response,
	to_error: impl Fn(String) -> FederationError,
) -> Result<T, FederationError>
where
	T: serde::de::DeserializeOwned,
{
	let status = response.status();
	let bytes = response.bytes().await.map_err(|source| to_error(source.to_string()))?;

	if !status.is_success() {
		let body = String::from_utf8_lossy(&bytes);

		return Err(to_error(format!("HTTP {status}: {body}")));
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| to_error(format!("malformed response body: {source}")))
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;

	#[test]
	fn builds_client_with_standard_timeout() {
		IdpHttpClient::new().expect("client should build with a 10s timeout");
	}
}
