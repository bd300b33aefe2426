//! Uniform connector capability implemented once for every registered provider.
//!
//! The state machine only ever talks to [`ProviderConnector`], so adding a provider
//! means registering a descriptor, never teaching the flow new branches.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	backend::{BackendHttpClient, FormFields, RawResponse},
	error::{BackendError, ConfigError},
	identity::SessionIdentity,
	provider::ProviderDescriptor,
};

/// Boxed future returned by [`ProviderConnector`] implementations.
pub type ConnectorFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Provider capability contract used by the connection state machine.
///
/// Implementors are required to be `Send + Sync` so a single connector can serve
/// every attempt a selector spawns.
pub trait ProviderConnector: Send + Sync {
	/// Requests the authorize target URL for `(descriptor, identity)`.
	fn request_authorization_url<'a>(
		&'a self,
		descriptor: &'a ProviderDescriptor,
		identity: &'a SessionIdentity,
	) -> ConnectorFuture<'a, Url>;

	/// Asks the backend to confirm the credential exchange for `(descriptor, identity)`.
	///
	/// Returns whether the backend now considers the integration connected.
	fn exchange_credentials<'a>(
		&'a self,
		descriptor: &'a ProviderDescriptor,
		identity: &'a SessionIdentity,
	) -> ConnectorFuture<'a, bool>;
}

/// HTTP-backed connector speaking the backend contract for all providers.
#[derive(Clone)]
pub struct BackendConnector<C>
where
	C: ?Sized + BackendHttpClient,
{
	http_client: Arc<C>,
}
impl<C> BackendConnector<C>
where
	C: ?Sized + BackendHttpClient,
{
	/// Creates a connector over the provided transport.
	pub fn new(http_client: impl Into<Arc<C>>) -> Self {
		Self { http_client: http_client.into() }
	}
}
impl<C> Debug for BackendConnector<C>
where
	C: ?Sized + BackendHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("BackendConnector(..)")
	}
}
impl<C> ProviderConnector for BackendConnector<C>
where
	C: ?Sized + BackendHttpClient,
{
	fn request_authorization_url<'a>(
		&'a self,
		descriptor: &'a ProviderDescriptor,
		identity: &'a SessionIdentity,
	) -> ConnectorFuture<'a, Url> {
		Box::pin(async move {
			let response = self
				.http_client
				.post_form(&descriptor.authorize_endpoint, identity_fields(identity))
				.await?;
			let raw: String = decode_payload(response)?;

			Url::parse(&raw)
				.map_err(|source| ConfigError::InvalidAuthorizeUrl { source }.into())
		})
	}

	fn exchange_credentials<'a>(
		&'a self,
		descriptor: &'a ProviderDescriptor,
		identity: &'a SessionIdentity,
	) -> ConnectorFuture<'a, bool> {
		Box::pin(async move {
			let response = self
				.http_client
				.post_form(&descriptor.credential_endpoint, identity_fields(identity))
				.await?;

			decode_payload(response)
		})
	}
}

fn identity_fields(identity: &SessionIdentity) -> FormFields {
	vec![("user_id", identity.user.to_string()), ("org_id", identity.org.to_string())]
}

/// Decodes a backend reply, extracting the `detail` message from error statuses.
pub(crate) fn decode_payload<T>(response: RawResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	if !response.is_success() {
		return Err(extract_detail(&response).into());
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		BackendError::ResponseParse { source, status: Some(response.status) }.into()
	})
}

fn extract_detail(response: &RawResponse) -> BackendError {
	#[derive(Deserialize)]
	struct Detail {
		detail: String,
	}

	let detail = match serde_json::from_slice::<Detail>(&response.body) {
		Ok(payload) => payload.detail,
		Err(_) => format!("Backend request failed with status {}.", response.status),
	};

	BackendError::Rejected { detail, status: response.status }
}
