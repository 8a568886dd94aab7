//! OIDC discovery document fetch + cache, used by the Google provider variant
//! (§4.C "fetches (and caches) the Google OIDC discovery document on first use").

// self
use crate::{_prelude::*, error::FederationError, federation::transport::IdpHttpClient};

/// Well-known discovery document URL for Google's OIDC issuer.
pub const GOOGLE_DISCOVERY_URL: &str = "https://accounts.google.com/.well-known/openid-configuration";

/// The subset of an OIDC discovery document this crate needs to drive the
/// authorization-code round trip and fetch the user's profile.
#[derive(Clone, Debug, Deserialize)]
pub struct DiscoveryDocument {
	/// Authorization endpoint advertised by the issuer.
	pub authorization_endpoint: url::Url,
	/// Token endpoint advertised by the issuer.
	pub token_endpoint: url::Url,
	/// Userinfo endpoint advertised by the issuer.
	pub userinfo_endpoint: url::Url,
}

/// Lazily fetches and caches a provider's discovery document for the lifetime of
/// the process. Concurrent callers during the first fetch share one in-flight
/// request rather than issuing duplicates, via the same `async-lock` primitives
/// the teacher crate reaches for whenever a lock must be held across an `.await`
/// (see its `AsyncMutex` alias in `_prelude`).
pub struct DiscoveryCache {
	url: &'static str,
	cached: async_lock::OnceCell<DiscoveryDocument>,
}
impl DiscoveryCache {
	/// Builds an unpopulated cache for the discovery document at `url`.
	pub fn new(url: &'static str) -> Self {
		Self { url, cached: async_lock::OnceCell::new() }
	}

	/// Returns the cached document, fetching it via `http` on first use.
	pub async fn get(&self, http: &IdpHttpClient) -> Result<&DiscoveryDocument, FederationError> {
		self
			.cached
			.get_or_try_init(|| async {
				let url = url::Url::parse(self.url).expect("discovery URL constant must be valid");

				http.get_json(&url, None).await
			})
			.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn google_discovery_url_is_well_formed() {
		url::Url::parse(GOOGLE_DISCOVERY_URL).expect("constant must be a valid URL");
	}
}
