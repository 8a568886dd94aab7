//! Standalone binary entrypoint: installs the tracing subscriber, then runs
//! the authorization server until `ctrl_c` (§4.F).

use mcp_oauth_core::{obs::tracing::init_subscriber, server};

#[tokio::main]
async fn main() -> std::process::ExitCode {
	init_subscriber();

	match server::run().await {
		Ok(()) => std::process::ExitCode::SUCCESS,
		Err(error) => {
			tracing::error!(%error, "mcp-oauth-core exited with an error");

			std::process::ExitCode::FAILURE
		},
	}
}
