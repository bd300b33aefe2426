//! Static provider registry: key to descriptor lookup with no runtime mutation.

// self
use crate::{_prelude::*, identity::ProviderKey, provider::ProviderDescriptor};

/// Built-in provider keys registered by [`ProviderRegistry::builtin`].
pub const BUILTIN_PROVIDERS: [&str; 3] = ["Notion", "Airtable", "HubSpot"];

/// Process-wide mapping from provider keys to descriptors.
///
/// Registration happens once at construction; the registry exposes pure lookups only.
#[derive(Clone, Debug, Default)]
pub struct ProviderRegistry {
	descriptors: BTreeMap<ProviderKey, ProviderDescriptor>,
}
impl ProviderRegistry {
	/// Builds a registry over the given descriptors.
	pub fn from_descriptors<I>(descriptors: I) -> Self
	where
		I: IntoIterator<Item = ProviderDescriptor>,
	{
		Self {
			descriptors: descriptors
				.into_iter()
				.map(|descriptor| (descriptor.key.clone(), descriptor))
				.collect(),
		}
	}

	/// Builds a registry with the built-in providers derived from a backend base URL.
	pub fn builtin(base: &Url) -> Result<Self> {
		let mut descriptors = Vec::with_capacity(BUILTIN_PROVIDERS.len());

		for key in BUILTIN_PROVIDERS {
			let key = ProviderKey::new(key).map_err(crate::error::ConfigError::Identifier)?;

			descriptors.push(ProviderDescriptor::for_backend(key, base)?);
		}

		Ok(Self::from_descriptors(descriptors))
	}

	/// Returns the descriptor registered under `key`.
	///
	/// An unregistered key is a configuration error, not a retryable condition.
	pub fn lookup(&self, key: &str) -> Result<&ProviderDescriptor> {
		self.descriptors.get(key).ok_or_else(|| Error::UnknownProvider { key: key.to_owned() })
	}

	/// Iterates registered provider keys in sorted order.
	pub fn keys(&self) -> impl Iterator<Item = &ProviderKey> {
		self.descriptors.keys()
	}

	/// Number of registered providers.
	pub fn len(&self) -> usize {
		self.descriptors.len()
	}

	/// Whether the registry holds no descriptors.
	pub fn is_empty(&self) -> bool {
		self.descriptors.is_empty()
	}
}
