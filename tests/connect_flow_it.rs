#![cfg(feature = "reqwest")]

// std
use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use oauth_connect::{
	attempt::{AttemptOutcome, ConnectionStatus},
	backend::ReqwestBackendClient,
	chat::ChatRelay,
	consent::{
		ConsentController, ConsentHandle, ConsentSurface, PresentationDenied, PresentationRequest,
	},
	error::{BackendError, Error},
	identity::{ChatSessionId, SessionIdentity},
	provider::{BackendConnector, ProviderConnector, ProviderRegistry},
	selector::IntegrationSelector,
};

/// Consent surface whose windows report closed after a fixed number of status checks.
struct ScriptedSurface {
	closes_after: Option<usize>,
	presented: Mutex<Vec<PresentationRequest>>,
	polls: Arc<AtomicUsize>,
}
impl ScriptedSurface {
	fn closing_after(polls: usize) -> Self {
		Self {
			closes_after: Some(polls),
			presented: Mutex::new(Vec::new()),
			polls: Arc::new(AtomicUsize::new(0)),
		}
	}

	fn presentation_count(&self) -> usize {
		self.presented.lock().expect("Presented log should not be poisoned.").len()
	}

	fn presented(&self) -> Vec<PresentationRequest> {
		self.presented.lock().expect("Presented log should not be poisoned.").clone()
	}
}
impl ConsentSurface for ScriptedSurface {
	fn present(
		&self,
		request: &PresentationRequest,
	) -> Result<Box<dyn ConsentHandle>, PresentationDenied> {
		self.presented.lock().expect("Presented log should not be poisoned.").push(request.clone());

		Ok(Box::new(ScriptedHandle { closes_after: self.closes_after, polls: self.polls.clone() }))
	}
}

struct ScriptedHandle {
	closes_after: Option<usize>,
	polls: Arc<AtomicUsize>,
}
impl ConsentHandle for ScriptedHandle {
	fn is_closed(&self) -> bool {
		let seen = self.polls.fetch_add(1, Ordering::SeqCst) + 1;

		self.closes_after.is_some_and(|limit| seen >= limit)
	}
}

fn build_selector(server: &MockServer, surface: Arc<dyn ConsentSurface>) -> IntegrationSelector {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.");
	let registry = ProviderRegistry::builtin(&base).expect("Built-in registry should construct.");
	let connector: Arc<dyn ProviderConnector> =
		Arc::new(BackendConnector::new(ReqwestBackendClient::default()));

	IntegrationSelector::new(registry, connector, surface)
		.with_controller(ConsentController::new().with_interval(std::time::Duration::from_millis(10)))
}

fn identity() -> SessionIdentity {
	SessionIdentity::parse("TestUser", "TestOrg")
		.expect("Identity fixture should be considered valid.")
}

#[tokio::test]
async fn connect_settles_to_connected_after_consent_closure() {
	let server = MockServer::start_async().await;
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/integrations/notion/authorize")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("\"https://provider/auth\"");
		})
		.await;
	let credentials_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/integrations/notion/credentials")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body("true");
		})
		.await;
	let surface = Arc::new(ScriptedSurface::closing_after(2));
	let selector = build_selector(&server, surface.clone());

	selector.select_provider("Notion").expect("Known provider should be selectable.");

	let outcome =
		selector.connect(identity()).await.expect("Attempt should settle to Connected.");

	assert_eq!(outcome, AttemptOutcome::Connected);
	assert!(selector.is_connected());
	assert_eq!(selector.status(), ConnectionStatus::Connected);

	authorize_mock.assert_async().await;
	credentials_mock.assert_async().await;

	assert_eq!(surface.presentation_count(), 1, "Exactly one consent window.");

	let presented = surface.presented();

	assert_eq!(presented[0].url.as_str(), "https://provider/auth");
	assert_eq!(presented[0].title, "Notion Authorization");
	assert_eq!((presented[0].width, presented[0].height), (600, 600));
}

#[tokio::test]
async fn authorize_rejection_surfaces_the_detail_and_presents_nothing() {
	let server = MockServer::start_async().await;
	let authorize_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/integrations/notion/authorize");
			then.status(422)
				.header("content-type", "application/json")
				.body("{\"detail\":\"invalid org\"}");
		})
		.await;
	let credentials_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/integrations/notion/credentials");
			then.status(200).header("content-type", "application/json").body("true");
		})
		.await;
	let surface = Arc::new(ScriptedSurface::closing_after(1));
	let selector = build_selector(&server, surface.clone());

	selector.select_provider("Notion").expect("Known provider should be selectable.");

	let err = selector
		.connect(identity())
		.await
		.expect_err("Backend rejection should fail the attempt.");

	assert!(matches!(
		err,
		Error::Backend(BackendError::Rejected { ref detail, status: 422 })
			if detail == "invalid org"
	));
	assert_eq!(err.to_string(), "invalid org");
	assert!(!selector.is_connected());
	assert_eq!(
		selector.status(),
		ConnectionStatus::Failed { reason: "invalid org".into() }
	);

	authorize_mock.assert_async().await;
	credentials_mock.assert_calls_async(0).await;

	assert_eq!(surface.presentation_count(), 0, "No window is ever presented.");
}

#[tokio::test]
async fn negative_confirmation_is_an_explicit_failed_outcome() {
	let server = MockServer::start_async().await;
	let _authorize_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/integrations/airtable/authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body("\"https://provider/auth\"");
		})
		.await;
	let credentials_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/integrations/airtable/credentials");
			then.status(200).header("content-type", "application/json").body("false");
		})
		.await;
	let surface = Arc::new(ScriptedSurface::closing_after(1));
	let selector = build_selector(&server, surface.clone());

	selector.select_provider("Airtable").expect("Known provider should be selectable.");

	let err = selector
		.connect(identity())
		.await
		.expect_err("A negative confirmation is a failed outcome.");

	assert!(matches!(err, Error::NotConnected));
	assert!(!selector.is_connected(), "The connected flag must remain unset.");

	credentials_mock.assert_async().await;
}

#[tokio::test]
async fn chat_relay_passes_messages_through() {
	let server = MockServer::start_async().await;
	let chat_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/chat")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"message\":\"42 rows match.\"}");
		})
		.await;
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse successfully.");
	let relay = ChatRelay::new(&base, ReqwestBackendClient::default())
		.expect("Relay should construct from the backend base URL.");
	let session =
		ChatSessionId::new("session-1").expect("Chat session fixture should be considered valid.");
	let reply = relay
		.send(&identity(), &session, "how many rows?")
		.await
		.expect("Relay should return the backend reply.");

	assert_eq!(reply, "42 rows match.");

	chat_mock.assert_async().await;
}
