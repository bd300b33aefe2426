//! Optional observability helpers for connection attempts.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth_connect.attempt` with the
//!   `stage` (lifecycle step) and `provider` fields.
//! - Enable `metrics` to increment the `oauth_connect_attempt_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Lifecycle stages observed per connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttemptStage {
	/// Authorize target URL request.
	Authorize,
	/// Consent window presentation and closure polling.
	Consent,
	/// Credential confirmation request.
	CredentialExchange,
}
impl AttemptStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AttemptStage::Authorize => "authorize",
			AttemptStage::Consent => "consent",
			AttemptStage::CredentialExchange => "credential_exchange",
		}
	}
}
impl Display for AttemptStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageOutcome {
	/// Entry to a lifecycle stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl StageOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			StageOutcome::Attempt => "attempt",
			StageOutcome::Success => "success",
			StageOutcome::Failure => "failure",
		}
	}
}
impl Display for StageOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
