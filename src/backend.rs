//! Transport primitives for backend form posts.
//!
//! The module exposes [`BackendHttpClient`] so downstream crates can integrate custom
//! HTTP stacks. The backend contract is uniform: every call is a form-encoded `POST`
//! and every response is a JSON payload, so the trait only needs to move raw bytes
//! plus the HTTP status; decoding stays with the callers in
//! [`provider::connector`](crate::provider::connector) and [`chat`](crate::chat).

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`BackendHttpClient`] implementations.
pub type BackendFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TransportError>> + 'a + Send>>;

/// Form field pairs submitted with a backend request.
pub type FormFields = Vec<(&'static str, String)>;

/// Raw backend reply prior to JSON decoding.
#[derive(Clone, Debug)]
pub struct RawResponse {
	/// HTTP status code of the reply.
	pub status: u16,
	/// Undecoded response body.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Whether the status code falls in the HTTP success range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Abstraction over HTTP transports capable of executing backend form posts.
///
/// The trait acts as the crate's only dependency on an HTTP stack. Implementations
/// must be `Send + Sync + 'static` so they can be shared across selector instances
/// behind `Arc<dyn BackendHttpClient>`, and the futures they return must own whatever
/// state they need so they remain `Send` while in flight.
pub trait BackendHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Submits `fields` as a form-encoded `POST` to `endpoint`.
	///
	/// Implementations report only transport-level failures here; non-success HTTP
	/// statuses are returned inside [`RawResponse`] so callers can extract the
	/// backend's `detail` message.
	fn post_form<'a>(&'a self, endpoint: &'a Url, fields: FormFields)
	-> BackendFuture<'a, RawResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestBackendClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestBackendClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestBackendClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestBackendClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl BackendHttpClient for ReqwestBackendClient {
	fn post_form<'a>(
		&'a self,
		endpoint: &'a Url,
		fields: FormFields,
	) -> BackendFuture<'a, RawResponse> {
		let client = self.0.clone();
		let endpoint = endpoint.clone();

		Box::pin(async move {
			let response = client.post(endpoint).form(&fields).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, body })
		})
	}
}
