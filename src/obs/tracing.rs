// self
use crate::{_prelude::*, obs::FlowKind};

#[cfg(feature = "tracing")]
type Traced<F> = tracing::instrument::Instrumented<F>;
#[cfg(not(feature = "tracing"))]
type Traced<F> = F;

/// Span covering one exchange, refresh, or request flow.
///
/// Without the `tracing` feature this is a zero-sized marker and every method is a no-op.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens an `oauth2_requester.flow` span for `kind` at the call site named `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("oauth2_requester.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Attaches the span to `fut` so it is entered on every poll.
	pub(crate) fn attach<F>(&self, fut: F) -> Traced<F>
	where
		F: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Emits a warning event inside the span describing why the flow failed.
	pub(crate) fn failed(&self, err: &Error) {
		#[cfg(feature = "tracing")]
		{
			let _entered = self.span.enter();

			tracing::warn!(error = %err, exchange = err.is_exchange(), "flow failed");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = err;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn attached_futures_keep_their_output() {
		let span = FlowSpan::new(FlowKind::Exchange, "attached_futures_keep_their_output");

		assert_eq!(span.attach(async { "token" }).await, "token");

		span.failed(&Error::MissingAuthCode);
	}
}
