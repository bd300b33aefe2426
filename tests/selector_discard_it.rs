#![cfg(feature = "reqwest")]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use oauth_connect::{
	attempt::{AttemptOutcome, ConnectionStatus},
	backend::ReqwestBackendClient,
	consent::{
		ConsentController, ConsentHandle, ConsentSurface, PresentationDenied, PresentationRequest,
	},
	provider::{BackendConnector, ProviderConnector, ProviderRegistry},
	selector::IntegrationSelector,
};

/// Consent surface whose windows never report closed.
struct OpenForeverSurface {
	polls: Arc<AtomicUsize>,
}
impl OpenForeverSurface {
	fn new() -> Self {
		Self { polls: Arc::new(AtomicUsize::new(0)) }
	}

	fn poll_count(&self) -> usize {
		self.polls.load(Ordering::SeqCst)
	}
}
impl ConsentSurface for OpenForeverSurface {
	fn present(
		&self,
		_request: &PresentationRequest,
	) -> Result<Box<dyn ConsentHandle>, PresentationDenied> {
		Ok(Box::new(OpenForeverHandle { polls: self.polls.clone() }))
	}
}

struct OpenForeverHandle {
	polls: Arc<AtomicUsize>,
}
impl ConsentHandle for OpenForeverHandle {
	fn is_closed(&self) -> bool {
		self.polls.fetch_add(1, Ordering::SeqCst);

		false
	}
}

async fn wait_for(mut probe: impl FnMut() -> bool) {
	for _ in 0..500 {
		if probe() {
			return;
		}

		tokio::time::sleep(Duration::from_millis(5)).await;
	}

	panic!("Probe did not become true in time.");
}

#[tokio::test]
async fn switching_provider_stops_polling_and_skips_the_exchange() {
	let server = MockServer::start_async().await;
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/integrations/notion/authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body("\"https://provider/auth\"");
		})
		.await;
	let credentials_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/integrations/notion/credentials");
			then.status(200).header("content-type", "application/json").body("true");
		})
		.await;
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.");
	let registry = ProviderRegistry::builtin(&base).expect("Built-in registry should construct.");
	let connector: Arc<dyn ProviderConnector> =
		Arc::new(BackendConnector::new(ReqwestBackendClient::default()));
	let surface = Arc::new(OpenForeverSurface::new());
	let selector = Arc::new(
		IntegrationSelector::new(registry, connector, surface.clone())
			.with_controller(ConsentController::new().with_interval(Duration::from_millis(10))),
	);
	let identity = oauth_connect::identity::SessionIdentity::parse("TestUser", "TestOrg")
		.expect("Identity fixture should be considered valid.");

	selector.select_provider("Notion").expect("Known provider should be selectable.");

	let run = {
		let selector = selector.clone();

		tokio::spawn(async move { selector.connect(identity).await })
	};

	wait_for(|| selector.status() == ConnectionStatus::AwaitingConsent).await;
	wait_for(|| surface.poll_count() >= 2).await;

	selector.select_provider("Airtable").expect("Known provider should be selectable.");

	let outcome = run
		.await
		.expect("Run task should join cleanly.")
		.expect("A discarded attempt is not an error.");

	assert_eq!(outcome, AttemptOutcome::Discarded);
	assert_eq!(selector.status(), ConnectionStatus::Disconnected);
	assert!(!selector.is_connected());

	let frozen = surface.poll_count();

	tokio::time::sleep(Duration::from_millis(100)).await;

	assert_eq!(surface.poll_count(), frozen, "Notion's poll loop must stop.");

	authorize_mock.assert_async().await;
	credentials_mock.assert_calls_async(0).await;
}
