//! Client-side OAuth connection lifecycle—drive third-party provider linking from
//! authorize request to durable credentials with cancellable consent-window polling
//! and a uniform provider contract.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod attempt;
pub mod backend;
pub mod chat;
pub mod consent;
pub mod error;
pub mod identity;
pub mod obs;
pub mod provider;
pub mod selector;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Scriptable stand-ins and helpers for tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use crate::{
		consent::{ConsentHandle, ConsentSurface, PresentationDenied, PresentationRequest},
		error::BackendError,
		provider::{ConnectorFuture, ProviderConnector, ProviderDescriptor},
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		backend::ReqwestBackendClient,
		consent::ConsentController,
		provider::{BackendConnector, ProviderRegistry},
		selector::IntegrationSelector,
	};

	/// In-process consent surface whose windows close on a script.
	pub struct TestConsentSurface {
		inner: Mutex<SurfaceInner>,
		polls: Arc<AtomicUsize>,
	}

	struct SurfaceInner {
		mode: SurfaceMode,
		presented: Vec<PresentationRequest>,
	}

	#[derive(Clone)]
	enum SurfaceMode {
		ClosesAfter(usize),
		NeverCloses,
		Blocked(String),
	}

	impl TestConsentSurface {
		fn with_mode(mode: SurfaceMode) -> Self {
			Self {
				inner: Mutex::new(SurfaceInner { mode, presented: Vec::new() }),
				polls: Arc::new(AtomicUsize::new(0)),
			}
		}

		/// Every presented window reports closed on the `polls`-th status check.
		pub fn closing_after(polls: usize) -> Self {
			Self::with_mode(SurfaceMode::ClosesAfter(polls))
		}

		/// Every presented window reports closed on the first status check.
		pub fn closing_immediately() -> Self {
			Self::closing_after(1)
		}

		/// Presented windows never report closed.
		pub fn never_closing() -> Self {
			Self::with_mode(SurfaceMode::NeverCloses)
		}

		/// Presentation always fails, as with a popup blocker.
		pub fn blocked(reason: impl Into<String>) -> Self {
			Self::with_mode(SurfaceMode::Blocked(reason.into()))
		}

		/// Requests presented so far.
		pub fn presented(&self) -> Vec<PresentationRequest> {
			self.inner.lock().presented.clone()
		}

		/// Number of windows presented so far.
		pub fn presentation_count(&self) -> usize {
			self.inner.lock().presented.len()
		}

		/// Total closed-status checks across all presented windows.
		pub fn poll_count(&self) -> usize {
			self.polls.load(Ordering::SeqCst)
		}
	}
	impl ConsentSurface for TestConsentSurface {
		fn present(
			&self,
			request: &PresentationRequest,
		) -> Result<Box<dyn ConsentHandle>, PresentationDenied> {
			let mut inner = self.inner.lock();
			let closes_after = match &inner.mode {
				SurfaceMode::ClosesAfter(polls) => Some(*polls),
				SurfaceMode::NeverCloses => None,
				SurfaceMode::Blocked(reason) =>
					return Err(PresentationDenied::new(reason.clone())),
			};

			inner.presented.push(request.clone());

			Ok(Box::new(TestConsentHandle { polls: self.polls.clone(), closes_after }))
		}
	}

	struct TestConsentHandle {
		polls: Arc<AtomicUsize>,
		closes_after: Option<usize>,
	}
	impl ConsentHandle for TestConsentHandle {
		fn is_closed(&self) -> bool {
			let seen = self.polls.fetch_add(1, Ordering::SeqCst) + 1;

			self.closes_after.is_some_and(|limit| seen >= limit)
		}
	}

	/// Scripted connector that answers without any transport.
	pub struct StaticConnector {
		authorize: AuthorizeScript,
		exchange: ExchangeScript,
		authorize_calls: AtomicUsize,
		exchange_calls: AtomicUsize,
	}

	#[derive(Clone)]
	enum AuthorizeScript {
		Target(Url),
		Reject(String),
		Hang,
	}

	#[derive(Clone)]
	enum ExchangeScript {
		Connected,
		Declined,
		Reject(String),
	}

	impl StaticConnector {
		fn with_scripts(authorize: AuthorizeScript, exchange: ExchangeScript) -> Self {
			Self {
				authorize,
				exchange,
				authorize_calls: AtomicUsize::new(0),
				exchange_calls: AtomicUsize::new(0),
			}
		}

		/// Authorize succeeds with `target`; the exchange confirms the connection.
		pub fn connecting(target: Url) -> Self {
			Self::with_scripts(AuthorizeScript::Target(target), ExchangeScript::Connected)
		}

		/// Authorize succeeds with `target`; the exchange reports not connected.
		pub fn declining(target: Url) -> Self {
			Self::with_scripts(AuthorizeScript::Target(target), ExchangeScript::Declined)
		}

		/// Authorize fails with a backend rejection carrying `detail`.
		pub fn authorize_rejected(detail: impl Into<String>) -> Self {
			Self::with_scripts(
				AuthorizeScript::Reject(detail.into()),
				ExchangeScript::Connected,
			)
		}

		/// Authorize succeeds with `target`; the exchange fails with `detail`.
		pub fn exchange_rejected(target: Url, detail: impl Into<String>) -> Self {
			Self::with_scripts(
				AuthorizeScript::Target(target),
				ExchangeScript::Reject(detail.into()),
			)
		}

		/// Authorize never resolves, pinning the attempt in `Authorizing`.
		pub fn hanging() -> Self {
			Self::with_scripts(AuthorizeScript::Hang, ExchangeScript::Connected)
		}

		/// Number of authorize requests issued.
		pub fn authorize_calls(&self) -> usize {
			self.authorize_calls.load(Ordering::SeqCst)
		}

		/// Number of credential exchanges issued.
		pub fn exchange_calls(&self) -> usize {
			self.exchange_calls.load(Ordering::SeqCst)
		}
	}
	impl ProviderConnector for StaticConnector {
		fn request_authorization_url<'a>(
			&'a self,
			_descriptor: &'a ProviderDescriptor,
			_identity: &'a crate::identity::SessionIdentity,
		) -> ConnectorFuture<'a, Url> {
			self.authorize_calls.fetch_add(1, Ordering::SeqCst);

			let script = self.authorize.clone();

			Box::pin(async move {
				match script {
					AuthorizeScript::Target(url) => Ok(url),
					AuthorizeScript::Reject(detail) =>
						Err(BackendError::Rejected { detail, status: 422 }.into()),
					AuthorizeScript::Hang => std::future::pending().await,
				}
			})
		}

		fn exchange_credentials<'a>(
			&'a self,
			_descriptor: &'a ProviderDescriptor,
			_identity: &'a crate::identity::SessionIdentity,
		) -> ConnectorFuture<'a, bool> {
			self.exchange_calls.fetch_add(1, Ordering::SeqCst);

			let script = self.exchange.clone();

			Box::pin(async move {
				match script {
					ExchangeScript::Connected => Ok(true),
					ExchangeScript::Declined => Ok(false),
					ExchangeScript::Reject(detail) =>
						Err(BackendError::Rejected { detail, status: 400 }.into()),
				}
			})
		}
	}

	/// Builds a selector over the built-in registry and the reqwest transport, with a
	/// shortened poll interval suitable for tests.
	#[cfg(feature = "reqwest")]
	pub fn build_reqwest_test_selector(
		base: &Url,
		surface: Arc<dyn ConsentSurface>,
	) -> IntegrationSelector {
		let registry =
			ProviderRegistry::builtin(base).expect("Built-in registry should construct.");
		let connector: Arc<dyn ProviderConnector> =
			Arc::new(BackendConnector::new(ReqwestBackendClient::default()));

		IntegrationSelector::new(registry, connector, surface)
			.with_controller(ConsentController::new().with_interval(Duration::from_millis(10)))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use tokio::sync::watch;
	pub use tokio_util::sync::CancellationToken;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
