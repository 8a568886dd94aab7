//! Server-wide error taxonomy shared across the store, token, provider, and HTTP layers.

// self
use crate::_prelude::*;

/// Server-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical server error exposed by public APIs.
///
/// Variants map onto the OAuth 2.0/2.1 error codes from RFC 6749 §5.2 via
/// [`Error::oauth_error_code`], used by the HTTP surface to build the JSON error
/// body (`{error, error_description?}`) or to select a redirect-vs-HTML rendering.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Federation (IdP) call failed or could not be mapped.
	#[error(transparent)]
	Federation(#[from] FederationError),

	/// Request is missing a required field, references an unknown client, or is
	/// otherwise malformed. Maps to `invalid_request`.
	#[error("Invalid request: {reason}.")]
	InvalidRequest {
		/// Human-readable reason.
		reason: String,
	},
	/// Client authentication failed (bad secret, unknown client). Maps to `invalid_client`.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Human-readable reason.
		reason: String,
	},
	/// Code/refresh-token redemption failed (unknown, expired, reused, bad PKCE
	/// verifier, redirect URI mismatch). Maps to `invalid_grant`.
	#[error("Grant rejected: {reason}.")]
	InvalidGrant {
		/// Human-readable reason.
		reason: String,
	},
	/// Client is not allowed to use the requested grant type. Maps to `unauthorized_client`.
	#[error("Client is not authorized for this grant: {reason}.")]
	UnauthorizedClient {
		/// Human-readable reason.
		reason: String,
	},
	/// Grant type is not one the token endpoint supports. Maps to `unsupported_grant_type`.
	#[error("Unsupported grant type: {grant_type}.")]
	UnsupportedGrantType {
		/// The grant type value the caller requested.
		grant_type: String,
	},
	/// Requested scope exceeds what is configured or what was originally granted.
	/// Maps to `invalid_scope`.
	#[error("Invalid scope: {reason}.")]
	InvalidScope {
		/// Human-readable reason.
		reason: String,
	},
	/// The resource owner or the IdP denied the request. Maps to `access_denied`.
	#[error("Access denied: {reason}.")]
	AccessDenied {
		/// Human-readable reason.
		reason: String,
	},
	/// Unclassified internal failure. Maps to `server_error`.
	#[error("Internal server error: {reason}.")]
	ServerError {
		/// Human-readable reason.
		reason: String,
	},
}
impl Error {
	/// Returns the RFC 6749 §5.2 error code used in the JSON error body and as the
	/// redirect `error` query parameter.
	pub fn oauth_error_code(&self) -> &'static str {
		match self {
			Error::Storage(_) | Error::ServerError { .. } => "server_error",
			Error::Config(_) => "server_error",
			Error::Federation(err) => err.oauth_error_code(),
			Error::InvalidRequest { .. } => "invalid_request",
			Error::InvalidClient { .. } => "invalid_client",
			Error::InvalidGrant { .. } => "invalid_grant",
			Error::UnauthorizedClient { .. } => "unauthorized_client",
			Error::UnsupportedGrantType { .. } => "unsupported_grant_type",
			Error::InvalidScope { .. } => "invalid_scope",
			Error::AccessDenied { .. } => "access_denied",
		}
	}
}

/// Configuration and validation failures raised at startup or descriptor construction.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required environment variable was absent.
	#[error("Missing required environment variable: {key}.")]
	MissingEnv {
		/// The environment variable name.
		key: &'static str,
	},
	/// An environment variable could not be parsed into the expected type.
	#[error("Failed to parse environment variable {key}: {reason}.")]
	InvalidEnv {
		/// The environment variable name.
		key: &'static str,
		/// Human-readable parse failure.
		reason: String,
	},
	/// `OAUTH_PROVIDER` named a provider this build does not implement.
	#[error("Unknown OAuth provider: {provider}.")]
	UnknownProvider {
		/// The unrecognized provider string.
		provider: String,
	},
	/// A federated provider is missing `OAUTH_CLIENT_ID`/`OAUTH_CLIENT_SECRET`.
	#[error("Federated provider {provider} requires client id and secret.")]
	MissingFederatedCredentials {
		/// The provider identifier.
		provider: &'static str,
	},
	/// The issuer URL must use HTTPS outside of development.
	#[error("Issuer URL must be HTTPS: {url}.")]
	InsecureIssuer {
		/// The offending URL.
		url: String,
	},
	/// A URL could not be parsed.
	#[error("Invalid URL for {field}: {source}.")]
	InvalidUrl {
		/// Which config field failed to parse.
		field: &'static str,
		/// Underlying parse failure.
		#[source]
		source: url::ParseError,
	},
}

/// Failures specific to the federated-auth round trip with an external IdP.
#[derive(Debug, ThisError)]
pub enum FederationError {
	/// OIDC discovery document could not be fetched or parsed.
	#[error("IdP discovery failed: {reason}.")]
	Discovery {
		/// Human-readable reason.
		reason: String,
	},
	/// The IdP token endpoint rejected the exchange or returned malformed JSON.
	#[error("IdP token exchange failed: {reason}.")]
	TokenExchange {
		/// Human-readable reason.
		reason: String,
	},
	/// The IdP userinfo/Graph endpoint could not be reached or parsed.
	#[error("IdP userinfo lookup failed: {reason}.")]
	Userinfo {
		/// Human-readable reason.
		reason: String,
	},
	/// No pending authorization matched the `state` returned by the IdP.
	#[error("No pending authorization matches the returned state.")]
	UnknownState,
	/// The user denied consent at the IdP.
	#[error("The user denied consent at the identity provider.")]
	UserDenied,
}
impl FederationError {
	/// Maps a federation failure onto the broker-wide error taxonomy (§7: federation
	/// failures translate to `access_denied` or `server_error`).
	pub fn oauth_error_code(&self) -> &'static str {
		match self {
			FederationError::UnknownState | FederationError::UserDenied => "access_denied",
			FederationError::Discovery { .. }
			| FederationError::TokenExchange { .. }
			| FederationError::Userinfo { .. } => "server_error",
		}
	}
}
