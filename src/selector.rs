//! Integration selector: one chosen provider, at most one live attempt.

// self
use crate::{
	_prelude::*,
	attempt::{AttemptOutcome, ConnectionAttempt, ConnectionStatus, StatusWatch},
	consent::{ConsentController, ConsentSurface},
	error::ConfigError,
	identity::{AttemptId, ProviderKey, SessionIdentity},
	provider::{ProviderConnector, ProviderDescriptor, ProviderRegistry},
};

/// Holds the currently chosen provider and owns the lifecycle of its attempts.
///
/// At most one live connection attempt exists per selector at any time. Selecting a
/// different provider invalidates any in-flight attempt, including its consent-window
/// polling; selecting the same provider again leaves a live attempt untouched.
pub struct IntegrationSelector {
	registry: ProviderRegistry,
	connector: Arc<dyn ProviderConnector>,
	surface: Arc<dyn ConsentSurface>,
	controller: ConsentController,
	state: Mutex<SelectorState>,
}

#[derive(Default)]
struct SelectorState {
	selected: Option<ProviderKey>,
	live: Option<LiveAttempt>,
}

struct LiveAttempt {
	id: AttemptId,
	cancel: CancellationToken,
	watch: StatusWatch,
}
impl LiveAttempt {
	fn discard(&self) {
		self.cancel.cancel();
	}
}

impl IntegrationSelector {
	/// Creates a selector with the default consent controller.
	pub fn new(
		registry: ProviderRegistry,
		connector: Arc<dyn ProviderConnector>,
		surface: Arc<dyn ConsentSurface>,
	) -> Self {
		Self {
			registry,
			connector,
			surface,
			controller: ConsentController::new(),
			state: Mutex::new(SelectorState::default()),
		}
	}

	/// Overrides the consent controller (tests shorten the poll interval).
	pub fn with_controller(mut self, controller: ConsentController) -> Self {
		self.controller = controller;

		self
	}

	/// Registry serving this selector.
	pub fn registry(&self) -> &ProviderRegistry {
		&self.registry
	}

	/// Currently selected provider key, if any.
	pub fn selected(&self) -> Option<ProviderKey> {
		self.state.lock().selected.clone()
	}

	/// Chooses `key` as the active provider.
	///
	/// Looks up the descriptor first (an unregistered key changes nothing), then
	/// discards any in-flight attempt for a previously selected provider and resets
	/// the exposed connection flags. Re-selecting the current provider is a no-op
	/// with respect to the live attempt.
	pub fn select_provider(&self, key: &str) -> Result<ProviderDescriptor> {
		let descriptor = self.registry.lookup(key)?.clone();
		let mut state = self.state.lock();

		if state.selected.as_deref() == Some(key) {
			return Ok(descriptor);
		}
		if let Some(live) = state.live.take() {
			live.discard();
		}

		state.selected = Some(descriptor.key.clone());

		Ok(descriptor)
	}

	/// Discards the live attempt, if any, without changing the selection.
	pub fn discard(&self) {
		if let Some(live) = self.state.lock().live.take() {
			live.discard();
		}
	}

	/// Snapshot of the live attempt's status, `Disconnected` when none is running.
	pub fn status(&self) -> ConnectionStatus {
		self.state
			.lock()
			.live
			.as_ref()
			.map(|live| live.watch.current())
			.unwrap_or(ConnectionStatus::Disconnected)
	}

	/// Read-only status watch of the live attempt.
	pub fn watch(&self) -> StatusWatch {
		self.state
			.lock()
			.live
			.as_ref()
			.map(|live| live.watch.clone())
			.unwrap_or_else(StatusWatch::disconnected)
	}

	/// Whether the live attempt has settled to `Connected`.
	pub fn is_connected(&self) -> bool {
		self.state.lock().live.as_ref().is_some_and(|live| live.watch.is_connected())
	}

	/// Tag of the live attempt, when one exists.
	pub fn live_attempt(&self) -> Option<AttemptId> {
		self.state.lock().live.as_ref().map(|live| live.id)
	}

	/// Starts and drives a fresh connection attempt for the selected provider.
	///
	/// Any previous attempt is discarded first, so its in-flight responses become
	/// stale. Errors are returned synchronously with the backend `detail` message and
	/// leave the attempt in the `Failed` state.
	pub async fn connect(&self, identity: SessionIdentity) -> Result<AttemptOutcome> {
		let attempt = {
			let mut state = self.state.lock();
			let key = state.selected.clone().ok_or(ConfigError::NoProviderSelected)?;
			let descriptor = self.registry.lookup(&key)?.clone();

			if let Some(live) = state.live.take() {
				live.discard();
			}

			let attempt = ConnectionAttempt::new(
				descriptor,
				identity,
				self.connector.clone(),
				self.surface.clone(),
				self.controller.clone(),
			);

			state.live = Some(LiveAttempt {
				id: attempt.id(),
				cancel: attempt.cancellation(),
				watch: attempt.watch(),
			});

			attempt
		};

		attempt.run().await
	}
}
impl Debug for IntegrationSelector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("IntegrationSelector")
			.field("selected", &state.selected)
			.field("live", &state.live.as_ref().map(|live| live.id))
			.finish()
	}
}
