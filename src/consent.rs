//! Consent window lifecycle: presentation plus closure polling.
//!
//! The externally hosted consent page offers no completion callback or message
//! channel (cross-origin), so closure polling is the only observable completion
//! signal. The fixed interval trades a bounded detection delay for simplicity; the
//! wait is keyed to the attempt's cancellation token so a discarded attempt never
//! leaves a free-running timer behind.

// self
use crate::{_prelude::*, identity::ProviderKey};

/// Opaque reference to an externally presented consent window.
///
/// Only the open/closed status is observable; the window's URL, content, and
/// navigation stay opaque to this crate.
pub trait ConsentHandle: Send + Sync {
	/// Whether the user has closed the window.
	fn is_closed(&self) -> bool;
}

/// Parameters for presenting a consent window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PresentationRequest {
	/// Authorize URL the window navigates to.
	pub url: Url,
	/// Window title shown by the environment.
	pub title: String,
	/// Fixed window width in pixels.
	pub width: u32,
	/// Fixed window height in pixels.
	pub height: u32,
}
impl PresentationRequest {
	/// Builds the standard fixed-size request for a provider's authorize URL.
	pub fn for_provider(key: &ProviderKey, url: Url) -> Self {
		Self {
			url,
			title: format!("{key} Authorization"),
			width: ConsentController::WINDOW_WIDTH,
			height: ConsentController::WINDOW_HEIGHT,
		}
	}
}

/// Environment refused to open the consent window (e.g., popup blocked).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{reason}")]
pub struct PresentationDenied {
	/// Environment-supplied reason string.
	pub reason: String,
}
impl PresentationDenied {
	/// Creates a denial with the provided reason.
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}
}
impl From<PresentationDenied> for Error {
	fn from(denied: PresentationDenied) -> Self {
		Error::PresentationBlocked { reason: denied.reason }
	}
}

/// Environment capability that opens externally navigable consent windows.
pub trait ConsentSurface: Send + Sync {
	/// Opens a new presentation surface for `request`.
	fn present(&self, request: &PresentationRequest)
	-> Result<Box<dyn ConsentHandle>, PresentationDenied>;
}

/// Signal produced when a closure wait ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosureSignal {
	/// The handle reported closed.
	Closed,
	/// The owning attempt was discarded before closure was detected.
	Discarded,
}

/// Owns the closure-poll loop for one consent window at a time.
#[derive(Clone, Debug)]
pub struct ConsentController {
	interval: Duration,
}
impl ConsentController {
	/// Fixed polling interval between closed-status checks.
	pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);
	/// Fixed height of the consent window in pixels.
	pub const WINDOW_HEIGHT: u32 = 600;
	/// Fixed width of the consent window in pixels.
	pub const WINDOW_WIDTH: u32 = 600;

	/// Creates a controller polling at [`Self::DEFAULT_POLL_INTERVAL`].
	pub fn new() -> Self {
		Self { interval: Self::DEFAULT_POLL_INTERVAL }
	}

	/// Overrides the polling interval (tests shorten it).
	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval;

		self
	}

	/// Configured polling interval.
	pub fn interval(&self) -> Duration {
		self.interval
	}

	/// Polls `handle` until it reports closed or `cancel` fires.
	///
	/// Resolves exactly once: the first closed observation wins and the loop stops
	/// immediately afterwards, so no timer outlives the wait. Cancellation takes
	/// priority over an elapsed tick so a discarded attempt observes no further polls.
	pub async fn await_closure(
		&self,
		handle: &dyn ConsentHandle,
		cancel: &CancellationToken,
	) -> ClosureSignal {
		loop {
			if cancel.is_cancelled() {
				return ClosureSignal::Discarded;
			}
			if handle.is_closed() {
				return ClosureSignal::Closed;
			}

			tokio::select! {
				biased;
				_ = cancel.cancelled() => return ClosureSignal::Discarded,
				_ = tokio::time::sleep(self.interval) => {},
			}
		}
	}
}
impl Default for ConsentController {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
	// self
	use super::*;

	struct CountingHandle {
		polls: Arc<AtomicUsize>,
		closed_after: usize,
	}
	impl ConsentHandle for CountingHandle {
		fn is_closed(&self) -> bool {
			self.polls.fetch_add(1, Ordering::SeqCst) + 1 >= self.closed_after
		}
	}

	struct NeverClosedHandle {
		polls: Arc<AtomicUsize>,
	}
	impl ConsentHandle for NeverClosedHandle {
		fn is_closed(&self) -> bool {
			self.polls.fetch_add(1, Ordering::SeqCst);

			false
		}
	}

	#[tokio::test(start_paused = true)]
	async fn closure_resolves_on_first_closed_observation() {
		let polls = Arc::new(AtomicUsize::new(0));
		let handle = CountingHandle { polls: polls.clone(), closed_after: 3 };
		let controller = ConsentController::new();
		let cancel = CancellationToken::new();
		let signal = controller.await_closure(&handle, &cancel).await;

		assert_eq!(signal, ClosureSignal::Closed);
		assert_eq!(polls.load(Ordering::SeqCst), 3, "Polling must stop once closure is seen.");
	}

	#[tokio::test(start_paused = true)]
	async fn already_closed_windows_resolve_without_sleeping() {
		let polls = Arc::new(AtomicUsize::new(0));
		let handle = CountingHandle { polls: polls.clone(), closed_after: 1 };
		let controller = ConsentController::new();
		let cancel = CancellationToken::new();
		let before = tokio::time::Instant::now();
		let signal = controller.await_closure(&handle, &cancel).await;

		assert_eq!(signal, ClosureSignal::Closed);
		assert_eq!(tokio::time::Instant::now(), before, "No tick should elapse.");
		assert_eq!(polls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test(start_paused = true)]
	async fn cancellation_stops_the_poll_loop() {
		let polls = Arc::new(AtomicUsize::new(0));
		let handle = NeverClosedHandle { polls: polls.clone() };
		let cancel = CancellationToken::new();
		let wait_cancel = cancel.clone();
		let observed = Arc::new(AtomicBool::new(false));
		let observed_inner = observed.clone();
		let wait = tokio::spawn(async move {
			let controller = ConsentController::new();
			let signal = controller.await_closure(&handle, &wait_cancel).await;

			observed_inner.store(true, Ordering::SeqCst);

			signal
		});

		// Let a few ticks elapse, then discard.
		tokio::time::sleep(ConsentController::DEFAULT_POLL_INTERVAL * 3).await;

		let seen = polls.load(Ordering::SeqCst);

		assert!(seen >= 1, "Loop should have polled before cancellation.");
		assert!(!observed.load(Ordering::SeqCst), "Wait must not resolve on its own.");

		cancel.cancel();

		let signal = wait.await.expect("Wait task should join cleanly.");

		assert_eq!(signal, ClosureSignal::Discarded);

		let after_cancel = polls.load(Ordering::SeqCst);

		tokio::time::sleep(ConsentController::DEFAULT_POLL_INTERVAL * 3).await;

		assert_eq!(
			polls.load(Ordering::SeqCst),
			after_cancel,
			"No further ticks may fire after cancellation."
		);
	}
}
