//! Shared application state handed to every axum handler (§4.E).

// self
use crate::{_prelude::*, auth::ScopeSet, provider::Provider, store::CredentialStore};

/// Immutable-after-startup state cloned (cheaply, via `Arc`) into every request
/// (§4.F "Configuration and provider instance are immutable after startup").
#[derive(Clone)]
pub struct AppState {
	/// The single active provider variant for this deployment.
	pub provider: Arc<dyn Provider>,
	/// The shared credential store.
	pub store: Arc<dyn CredentialStore>,
	/// Absolute URL identifying this server, used to build the metadata document.
	pub issuer_url: url::Url,
	/// Complete set of scopes this deployment is willing to grant.
	pub valid_scopes: ScopeSet,
	/// Scopes granted when a registration or request omits `scope` entirely.
	pub default_scopes: ScopeSet,
}
