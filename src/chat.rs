//! Stateless chat relay over the linked data.
//!
//! Pure request/response pass-through: no connection state, no history. The backend
//! answers with a `{"message": ...}` envelope.

// self
use crate::{
	_prelude::*,
	backend::BackendHttpClient,
	identity::{ChatSessionId, SessionIdentity},
	provider::connector::decode_payload,
};

#[derive(Debug, Deserialize)]
struct ChatReply {
	message: String,
}

/// Relays chat messages to the backend `/chat` endpoint.
#[derive(Clone)]
pub struct ChatRelay<C>
where
	C: ?Sized + BackendHttpClient,
{
	endpoint: Url,
	http_client: Arc<C>,
}
impl<C> ChatRelay<C>
where
	C: ?Sized + BackendHttpClient,
{
	/// Creates a relay targeting `chat` relative to the backend base URL.
	pub fn new(base: &Url, http_client: impl Into<Arc<C>>) -> Result<Self> {
		let endpoint = base
			.join("chat")
			.map_err(|source| crate::error::ConfigError::InvalidEndpoint { source })?;

		Ok(Self { endpoint, http_client: http_client.into() })
	}

	/// Sends one message and returns the backend's reply.
	pub async fn send(
		&self,
		identity: &SessionIdentity,
		session: &ChatSessionId,
		message: impl Into<String>,
	) -> Result<String> {
		let fields = vec![
			("message", message.into()),
			("user_id", identity.user.to_string()),
			("org_id", identity.org.to_string()),
			("chat_session_id", session.to_string()),
		];
		let response = self.http_client.post_form(&self.endpoint, fields).await?;
		let reply: ChatReply = decode_payload(response)?;

		Ok(reply.message)
	}
}
impl<C> Debug for ChatRelay<C>
where
	C: ?Sized + BackendHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ChatRelay").field("endpoint", &self.endpoint).finish()
	}
}
