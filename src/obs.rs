//! Observability helpers threaded through the store, token, and HTTP layers.
//!
//! Structured logging (via `tracing`) is always on, matching the rest of the crate's
//! ambient stack. Enable the `metrics` feature to additionally increment the
//! `mcp_oauth_core_operation_total` counter for every attempt/success/failure,
//! labeled by `operation` + `outcome`.

pub mod metrics;
pub mod tracing;

pub use metrics::record_operation_outcome;
pub use tracing::OperationSpan;

// self
use crate::_prelude::*;

/// Authorization-server operations observed across §4.A-§4.D.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Dynamic client registration (`POST /register`).
	RegisterClient,
	/// `GET /authorize`.
	Authorize,
	/// Consent approval (custom provider or post-federation confirmation).
	Consent,
	/// `POST /token`, any grant type.
	Token,
	/// `POST /revoke`.
	Revoke,
	/// A federated-auth round trip leg (discovery, exchange, or userinfo).
	Federation,
	/// One sweeper pass.
	Sweep,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::RegisterClient => "register_client",
			Operation::Authorize => "authorize",
			Operation::Consent => "consent",
			Operation::Token => "token",
			Operation::Revoke => "revoke",
			Operation::Federation => "federation",
			Operation::Sweep => "sweep",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to the operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn operation_labels_are_stable() {
		assert_eq!(Operation::Token.as_str(), "token");
		assert_eq!(OperationOutcome::Failure.as_str(), "failure");
	}
}
