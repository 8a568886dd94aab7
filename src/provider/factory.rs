//! Selects exactly one [`Provider`] variant from [`crate::config::Config`] (§4.C,
//! §4.F), mirroring the teacher's pattern of building its broker's `oauth2::Client`
//! once at startup from validated configuration.

// self
use crate::{
	_prelude::*,
	config::{Config, ProviderKind},
	error::ConfigError,
	provider::{CustomProvider, Provider},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::provider::{AzureProvider, GoogleProvider};

/// Builds the single active [`Provider`] for this deployment.
pub struct ProviderFactory;
impl ProviderFactory {
	/// Constructs the provider named by `config.provider`, wiring in the shared
	/// store and token policy. Federated variants additionally require
	/// `config.federated_credentials` (already enforced by [`Config::from_env`]).
	pub fn build(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Arc<dyn Provider>, Error> {
		match config.provider {
			ProviderKind::Custom => Ok(Arc::new(CustomProvider::new(
				store,
				config.token_policy,
				config.valid_scopes.clone(),
			))),
			#[cfg(feature = "reqwest")]
			ProviderKind::Google => {
				let credentials = config.federated_credentials.as_ref().ok_or(ConfigError::MissingFederatedCredentials {
					provider: "google",
				})?;
				let callback_uri = config
					.issuer_url
					.join("oauth/google/callback")
					.map_err(|source| ConfigError::InvalidUrl { field: "OAUTH_ISSUER_URL", source })?;
				let provider = GoogleProvider::new(
					store,
					config.token_policy,
					config.valid_scopes.clone(),
					credentials.client_id.clone(),
					credentials.client_secret.clone(),
					callback_uri,
				)?;

				Ok(Arc::new(provider))
			},
			#[cfg(feature = "reqwest")]
			ProviderKind::Azure => {
				let credentials = config.federated_credentials.as_ref().ok_or(ConfigError::MissingFederatedCredentials {
					provider: "azure",
				})?;
				let callback_uri = config
					.issuer_url
					.join("oauth/azure/callback")
					.map_err(|source| ConfigError::InvalidUrl { field: "OAUTH_ISSUER_URL", source })?;
				let tenant_id = credentials.tenant_id.as_deref().unwrap_or("common");
				let provider = AzureProvider::new(
					store,
					config.token_policy,
					config.valid_scopes.clone(),
					credentials.client_id.clone(),
					credentials.client_secret.clone(),
					callback_uri,
					tenant_id,
				)?;

				Ok(Arc::new(provider))
			},
			#[cfg(not(feature = "reqwest"))]
			ProviderKind::Google | ProviderKind::Azure => {
				Err(Error::Config(ConfigError::UnknownProvider {
					provider: "federated providers require the `reqwest` feature".into(),
				}))
			},
		}
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{auth::ScopeSet, config::Config, store::disk::Store, token::TokenPolicy};

	fn base_config(provider: ProviderKind) -> Config {
		Config {
			enabled: true,
			provider,
			issuer_url: url::Url::parse("https://auth.example.com").unwrap(),
			valid_scopes: ScopeSet::new(["read", "write"]),
			default_scopes: ScopeSet::new(["read"]),
			token_policy: TokenPolicy::default(),
			federated_credentials: None,
			bind_addr: "127.0.0.1:8089".into(),
			store_dir: "./unused".into(),
		}
	}

	#[test]
	fn builds_custom_provider_without_federated_credentials() {
		let store: Arc<dyn CredentialStore> =
			Arc::new(Store::open(std::env::temp_dir().join("mcp_oauth_core_factory_custom")).unwrap());
		let provider =
			ProviderFactory::build(&base_config(ProviderKind::Custom), store).expect("should build");

		assert_eq!(provider.info().kind, "custom");
	}

	#[test]
	fn rejects_federated_provider_without_credentials() {
		let store: Arc<dyn CredentialStore> =
			Arc::new(Store::open(std::env::temp_dir().join("mcp_oauth_core_factory_missing_creds")).unwrap());

		let err = ProviderFactory::build(&base_config(ProviderKind::Google), store)
			.expect_err("google requires federated credentials");

		assert!(matches!(err, Error::Config(ConfigError::MissingFederatedCredentials { .. })));
	}
}
