//! Provider descriptor data structures shared by registry and connectors.

// self
use crate::{_prelude::*, error::ConfigError, identity::ProviderKey};

/// Immutable provider descriptor consumed by the connection state machine.
///
/// One exists per supported provider and is never mutated after registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Registry key identifying the provider (e.g. `Notion`).
	pub key: ProviderKey,
	/// Endpoint that returns the user-consent authorize URL.
	pub authorize_endpoint: Url,
	/// Endpoint that confirms the credential exchange.
	pub credential_endpoint: Url,
}
impl ProviderDescriptor {
	/// Creates a descriptor from explicit endpoints.
	pub fn new(key: ProviderKey, authorize_endpoint: Url, credential_endpoint: Url) -> Self {
		Self { key, authorize_endpoint, credential_endpoint }
	}

	/// Derives a descriptor from the backend contract.
	///
	/// The lowercased provider key is substituted literally into
	/// `integrations/{key}/authorize` and `integrations/{key}/credentials` relative to
	/// `base`.
	pub fn for_backend(key: ProviderKey, base: &Url) -> Result<Self, ConfigError> {
		let slug = key.to_ascii_lowercase();
		let authorize_endpoint = base
			.join(&format!("integrations/{slug}/authorize"))
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let credential_endpoint = base
			.join(&format!("integrations/{slug}/credentials"))
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		Ok(Self { key, authorize_endpoint, credential_endpoint })
	}
}
impl Display for ProviderDescriptor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.key, f)
	}
}
