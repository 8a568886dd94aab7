// crates.io
use tracing_subscriber::EnvFilter;
// self
use crate::{_prelude::*, obs::Operation};

/// Installs the process-wide `tracing` subscriber, honoring `RUST_LOG`
/// (defaulting to `info`) the way every handler and store operation in this
/// crate expects to be observed (§4.F ambient logging). Call once from the
/// binary entrypoint; library consumers that already run their own
/// subscriber should not call this.
pub fn init_subscriber() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// A span builder wrapping the authorization server's operations, named
/// `mcp_oauth_core.operation` with `operation` and `stage` fields — the same shape
/// the teacher crate's flow spans use, minus the `tracing` feature gate, since this
/// crate's server surface always logs.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the given operation + call site.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		let span =
			tracing::info_span!("mcp_oauth_core.operation", operation = operation.as_str(), stage);

		Self { span }
	}

	/// Enters the span for synchronous sections.
	pub fn entered(self) -> OperationSpanGuard {
		OperationSpanGuard { guard: self.span.entered() }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> tracing::instrument::Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}

/// RAII guard returned by [`OperationSpan::entered`].
pub struct OperationSpanGuard {
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for OperationSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OperationSpanGuard(..)")
	}
}
