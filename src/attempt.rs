//! Connection state machine driving one attempt end to end.
//!
//! `Disconnected -> Authorizing -> AwaitingConsent -> ExchangingCredentials ->
//! Connected`, with a terminal `Failed` reachable from the three intermediate states.
//! Each attempt owns its window handle, poll wait, and status channel exclusively; a
//! fresh attempt always means a fresh machine instance.

// self
use crate::{
	_prelude::*,
	consent::{ClosureSignal, ConsentController, ConsentSurface, PresentationRequest},
	identity::{AttemptId, SessionIdentity},
	obs::{AttemptStage, StageOutcome, StageSpan, record_stage_outcome},
	provider::{ProviderConnector, ProviderDescriptor},
};

/// Externally observable status of a connection attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum ConnectionStatus {
	/// No attempt is running.
	Disconnected,
	/// Authorize target URL requested from the backend.
	Authorizing,
	/// Consent window presented; polling for closure.
	AwaitingConsent,
	/// Closure detected; credential confirmation requested from the backend.
	ExchangingCredentials,
	/// Backend confirmed the connection. Terminal.
	Connected,
	/// The attempt ended in an error. Terminal.
	Failed {
		/// User-facing failure message (backend `detail` when available).
		reason: String,
	},
}
impl ConnectionStatus {
	/// Whether this is the only status that flips the "integration connected" flag.
	pub fn is_connected(&self) -> bool {
		matches!(self, Self::Connected)
	}

	/// Whether the attempt has settled and a fresh machine instance is required.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Connected | Self::Failed { .. })
	}
}
impl Display for ConnectionStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Disconnected => f.write_str("disconnected"),
			Self::Authorizing => f.write_str("authorizing"),
			Self::AwaitingConsent => f.write_str("awaiting_consent"),
			Self::ExchangingCredentials => f.write_str("exchanging_credentials"),
			Self::Connected => f.write_str("connected"),
			Self::Failed { reason } => write!(f, "failed: {reason}"),
		}
	}
}

/// How a driven attempt ended, for callers that distinguish discard from success.
///
/// Failures are returned as errors instead so the backend `detail` message reaches
/// the user synchronously.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
	/// The backend confirmed the connection.
	Connected,
	/// The attempt was discarded mid-flight; any late responses were dropped as stale.
	Discarded,
}

/// Read-only view of an attempt's status for collaborating display logic.
#[derive(Clone, Debug)]
pub struct StatusWatch(watch::Receiver<ConnectionStatus>);
impl StatusWatch {
	/// Returns a watch that always reports [`ConnectionStatus::Disconnected`].
	pub(crate) fn disconnected() -> Self {
		let (_, rx) = watch::channel(ConnectionStatus::Disconnected);

		Self(rx)
	}

	/// Snapshot of the current status.
	pub fn current(&self) -> ConnectionStatus {
		self.0.borrow().clone()
	}

	/// Whether the attempt has reached [`ConnectionStatus::Connected`].
	pub fn is_connected(&self) -> bool {
		self.0.borrow().is_connected()
	}

	/// Waits for the next status change, returning the new snapshot.
	///
	/// Returns `None` once the owning attempt is gone and no change is pending.
	pub async fn changed(&mut self) -> Option<ConnectionStatus> {
		self.0.changed().await.ok()?;

		Some(self.0.borrow_and_update().clone())
	}
}

/// One run of the connection state machine for a provider and session identity.
pub struct ConnectionAttempt {
	id: AttemptId,
	descriptor: ProviderDescriptor,
	identity: SessionIdentity,
	connector: Arc<dyn ProviderConnector>,
	surface: Arc<dyn ConsentSurface>,
	controller: ConsentController,
	status: watch::Sender<ConnectionStatus>,
	cancel: CancellationToken,
}
impl ConnectionAttempt {
	/// Creates a machine instance in the `Disconnected` state.
	pub fn new(
		descriptor: ProviderDescriptor,
		identity: SessionIdentity,
		connector: Arc<dyn ProviderConnector>,
		surface: Arc<dyn ConsentSurface>,
		controller: ConsentController,
	) -> Self {
		let (status, _) = watch::channel(ConnectionStatus::Disconnected);

		Self {
			id: AttemptId::generate(),
			descriptor,
			identity,
			connector,
			surface,
			controller,
			status,
			cancel: CancellationToken::new(),
		}
	}

	/// Tag identifying this attempt for stale-response rejection.
	pub fn id(&self) -> AttemptId {
		self.id
	}

	/// Read-only status view for observers.
	pub fn watch(&self) -> StatusWatch {
		StatusWatch(self.status.subscribe())
	}

	/// Token that discards the attempt when cancelled.
	pub fn cancellation(&self) -> CancellationToken {
		self.cancel.clone()
	}

	/// Drives the attempt through its transitions until it settles.
	///
	/// Exactly one authorize request, at most one presentation, one poll loop, and at
	/// most one credential exchange are issued, in that order. A discard at any
	/// suspension point stops the machine; responses landing afterwards are dropped
	/// as stale rather than surfaced.
	pub async fn run(self) -> Result<AttemptOutcome> {
		let span = StageSpan::new(AttemptStage::Authorize, &self.descriptor.key);

		record_stage_outcome(AttemptStage::Authorize, StageOutcome::Attempt);
		self.transition(ConnectionStatus::Authorizing);

		let url = match self
			.guarded(span.instrument(
				self.connector.request_authorization_url(&self.descriptor, &self.identity),
			))
			.await
		{
			Some(Ok(url)) => url,
			Some(Err(e)) => return self.fail(AttemptStage::Authorize, e),
			None => return Ok(AttemptOutcome::Discarded),
		};

		record_stage_outcome(AttemptStage::Authorize, StageOutcome::Success);

		let request = PresentationRequest::for_provider(&self.descriptor.key, url);
		let handle = match self.surface.present(&request) {
			Ok(handle) => handle,
			Err(denied) => return self.fail(AttemptStage::Consent, denied.into()),
		};

		record_stage_outcome(AttemptStage::Consent, StageOutcome::Attempt);
		self.transition(ConnectionStatus::AwaitingConsent);

		let consent_span = StageSpan::new(AttemptStage::Consent, &self.descriptor.key);

		match consent_span
			.instrument(self.controller.await_closure(handle.as_ref(), &self.cancel))
			.await
		{
			ClosureSignal::Closed => record_stage_outcome(AttemptStage::Consent, StageOutcome::Success),
			ClosureSignal::Discarded => return Ok(AttemptOutcome::Discarded),
		}

		record_stage_outcome(AttemptStage::CredentialExchange, StageOutcome::Attempt);
		self.transition(ConnectionStatus::ExchangingCredentials);

		let exchange_span = StageSpan::new(AttemptStage::CredentialExchange, &self.descriptor.key);
		let connected = match self
			.guarded(exchange_span.instrument(
				self.connector.exchange_credentials(&self.descriptor, &self.identity),
			))
			.await
		{
			Some(Ok(connected)) => connected,
			Some(Err(e)) => return self.fail(AttemptStage::CredentialExchange, e),
			None => return Ok(AttemptOutcome::Discarded),
		};

		if !connected {
			// The backend answered but declined to mark the integration connected.
			return self.fail(AttemptStage::CredentialExchange, Error::NotConnected);
		}

		record_stage_outcome(AttemptStage::CredentialExchange, StageOutcome::Success);
		self.transition(ConnectionStatus::Connected);

		Ok(AttemptOutcome::Connected)
	}

	/// Races `fut` against the discard token; `None` means the response is stale.
	async fn guarded<F, T>(&self, fut: F) -> Option<Result<T>>
	where
		F: Future<Output = Result<T>>,
	{
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => None,
			out = fut => Some(out),
		}
	}

	fn fail(&self, stage: AttemptStage, e: Error) -> Result<AttemptOutcome> {
		record_stage_outcome(stage, StageOutcome::Failure);
		self.transition(ConnectionStatus::Failed { reason: e.to_string() });

		Err(e)
	}

	fn transition(&self, next: ConnectionStatus) {
		// A discarded attempt must not publish further transitions.
		if self.cancel.is_cancelled() {
			return;
		}

		#[cfg(feature = "tracing")]
		tracing::debug!(
			attempt = %self.id,
			provider = %self.descriptor.key,
			status = %next,
			"connection attempt transition",
		);

		let _ = self.status.send(next);
	}
}
impl Debug for ConnectionAttempt {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConnectionAttempt")
			.field("id", &self.id)
			.field("descriptor", &self.descriptor)
			.field("identity", &self.identity)
			.field("status", &*self.status.borrow())
			.finish()
	}
}
