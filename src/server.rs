//! Process lifecycle (§4.F): startup order is parse env → validate → build
//! provider → hydrate store from disk → spawn sweeper → serve. Shutdown stops
//! accepting new connections, cancels the sweeper, and flushes the store once
//! more before exiting.

// std
use std::time::Duration;
// crates.io
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	config::Config,
	http::{self, state::AppState},
	obs::{Operation, OperationOutcome, record_operation_outcome},
	provider::ProviderFactory,
	store::{CredentialStore, disk::Store},
};

/// How often the sweeper pass runs (§5 "The sweeper runs on its own periodic
/// task").
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Reads and validates configuration, builds every component, and serves the
/// HTTP surface until `tokio::signal::ctrl_c()` fires. Returns once shutdown
/// has completed (sweeper stopped, store flushed).
pub async fn run() -> Result<()> {
	let config = Config::from_env().map_err(Error::Config)?;

	if !config.enabled {
		tracing::info!("OAUTH_ENABLED is false, refusing to start the HTTP surface");

		return Ok(());
	}

	let store: Arc<dyn CredentialStore> = Arc::new(Store::open(&config.store_dir)?);
	let provider = ProviderFactory::build(&config, store.clone())?;

	tracing::info!(
		provider = provider.info().kind,
		issuer = %config.issuer_url,
		bind_addr = %config.bind_addr,
		"starting mcp-oauth-core"
	);

	let sweeper_token = CancellationToken::new();
	let sweeper = tokio::spawn(sweep_loop(store.clone(), sweeper_token.clone()));

	let state = AppState {
		provider,
		store: store.clone(),
		issuer_url: config.issuer_url.clone(),
		valid_scopes: config.valid_scopes.clone(),
		default_scopes: config.default_scopes.clone(),
	};
	let router = http::router(state);
	let listener = TcpListener::bind(&config.bind_addr)
		.await
		.map_err(|source| Error::ServerError { reason: format!("failed to bind {}: {source}", config.bind_addr) })?;

	axum::serve(listener, router)
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(|source| Error::ServerError { reason: format!("HTTP server failure: {source}") })?;

	sweeper_token.cancel();

	if let Err(error) = sweeper.await {
		tracing::warn!(%error, "sweeper task panicked");
	}

	store.flush()?;

	tracing::info!("shutdown complete");

	Ok(())
}

/// Resolves once `ctrl_c` is received, used as axum's graceful-shutdown future.
async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("received shutdown signal"),
		Err(error) => tracing::warn!(%error, "failed to install ctrl_c handler"),
	}
}

/// Runs [`CredentialStore::sweep`] on [`SWEEP_INTERVAL`] until `token` is
/// cancelled.
async fn sweep_loop(store: Arc<dyn CredentialStore>, token: CancellationToken) {
	let mut interval = tokio::time::interval(SWEEP_INTERVAL);

	loop {
		tokio::select! {
			_ = token.cancelled() => break,
			_ = interval.tick() => {
				let span = crate::obs::OperationSpan::new(Operation::Sweep, "tick");
				let _guard = span.entered();
				let now = OffsetDateTime::now_utc().unix_timestamp();
				let report = store.sweep(now);

				record_operation_outcome(Operation::Sweep, OperationOutcome::Success);

				if !report.is_empty() {
					tracing::debug!(
						refresh_tokens = report.refresh_tokens,
						access_tokens = report.access_tokens,
						codes = report.codes,
						pending = report.pending,
						redeemed_codes = report.redeemed_codes,
						"sweep removed expired entries"
					);
				}
			},
		}
	}
}
