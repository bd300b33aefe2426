//! Crate-level error types shared across the connection lifecycle.
//!
//! Stale responses are deliberately absent from the taxonomy: a network reply that
//! arrives after its attempt was discarded is dropped locally and reported as the
//! [`Discarded`](crate::attempt::AttemptOutcome::Discarded) outcome, never as an error.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Backend rejected or mangled an authorize/credential-exchange request.
	#[error("{0}")]
	Backend(
		#[from]
		#[source]
		BackendError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Consent window could not be opened by the environment.
	#[error("Consent window could not be presented: {reason}.")]
	PresentationBlocked {
		/// Environment-supplied reason string (e.g., popup blocked).
		reason: String,
	},
	/// Selector was given a provider key that is not registered.
	#[error("Provider `{key}` is not registered.")]
	UnknownProvider {
		/// The unregistered key as supplied by the caller.
		key: String,
	},
	/// Backend confirmed the credential exchange but reported no connection.
	#[error("Provider reported the connection as not established.")]
	NotConnected,
}

/// Failures reported by the backend during authorize or credential exchange.
#[derive(Debug, ThisError)]
pub enum BackendError {
	/// Backend returned an HTTP error with a human-readable `detail` field.
	#[error("{detail}")]
	Rejected {
		/// User-facing message extracted from the response `detail` field.
		detail: String,
		/// HTTP status code of the rejection.
		status: u16,
	},
	/// Backend returned a success status with a payload that could not be parsed.
	#[error("Backend returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Backend base URL cannot be joined with a provider path.
	#[error("Backend endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Backend returned an authorize target that is not a valid URL.
	#[error("Authorize response is not a valid URL.")]
	InvalidAuthorizeUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Session or provider identifier failed validation.
	#[error("Requested identifier is invalid.")]
	Identifier(#[from] crate::identity::IdentifierError),
	/// `connect()` was invoked before any provider was selected.
	#[error("No provider is selected.")]
	NoProviderSelected,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
