//! Cancellation and deadline context threaded through every network step.
//!
//! A single [`Context`] flows through the store lookup, the authorization-code exchange, any
//! refresh performed by a token source, and the final HTTP request. Cancelling it (or letting
//! its deadline pass) aborts whichever step is in flight with [`Error::Cancelled`] or
//! [`Error::DeadlineExceeded`]. Dropping a returned future cancels as usual for Rust futures.

// crates.io
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
// self
use crate::_prelude::*;

/// Request-scoped cancellation handle with an optional deadline.
#[derive(Clone, Debug, Default)]
pub struct Context {
	cancellation: CancellationToken,
	deadline: Option<Instant>,
}
impl Context {
	/// Creates a context that never cancels on its own.
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps an existing cancellation token (e.g., an application shutdown token).
	pub fn with_cancellation(token: CancellationToken) -> Self {
		Self { cancellation: token, deadline: None }
	}

	/// Sets a deadline `timeout` from now, keeping any earlier deadline.
	pub fn with_timeout(self, timeout: StdDuration) -> Self {
		self.with_deadline(Instant::now() + timeout)
	}

	/// Sets an absolute deadline, keeping any earlier deadline.
	pub fn with_deadline(mut self, deadline: Instant) -> Self {
		self.deadline = Some(match self.deadline {
			Some(current) if current <= deadline => current,
			_ => deadline,
		});

		self
	}

	/// Derives a context that is cancelled with `self` but can also be cancelled on its own.
	pub fn child(&self) -> Self {
		Self { cancellation: self.cancellation.child_token(), deadline: self.deadline }
	}

	/// Cancels this context and every child derived from it.
	pub fn cancel(&self) {
		self.cancellation.cancel();
	}

	/// Returns `true` once the context has been cancelled.
	pub fn is_cancelled(&self) -> bool {
		self.cancellation.is_cancelled()
	}

	/// Deadline applied to in-flight steps, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Underlying cancellation token.
	pub fn cancellation_token(&self) -> &CancellationToken {
		&self.cancellation
	}

	/// Drives `fut` to completion unless the context is cancelled or its deadline passes first.
	pub async fn run<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		if self.is_cancelled() {
			return Err(Error::Cancelled);
		}

		let guarded = async {
			tokio::select! {
				biased;

				() = self.cancellation.cancelled() => Err(Error::Cancelled),
				result = fut => result,
			}
		};

		match self.deadline {
			Some(deadline) =>
				time::timeout_at(deadline, guarded).await.unwrap_or(Err(Error::DeadlineExceeded)),
			None => guarded.await,
		}
	}
}
