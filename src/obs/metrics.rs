// self
use crate::obs::{Operation, OperationOutcome};

/// Records an operation outcome via the global metrics recorder (when the `metrics`
/// feature is enabled; a no-op otherwise).
pub fn record_operation_outcome(operation: Operation, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"mcp_oauth_core_operation_total",
			"operation" => operation.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (operation, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_operation_outcome_noop_without_metrics() {
		record_operation_outcome(Operation::RegisterClient, OperationOutcome::Failure);
	}
}
