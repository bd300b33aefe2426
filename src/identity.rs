//! Strongly typed identifiers enforced across the connection domain.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty or whitespace.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (user, org, provider, chat session).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (user, org, provider, chat session).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (user, org, provider, chat session).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { UserId, "Unique identifier for an end user requesting a connection.", "User" }
def_id! { OrgId, "Unique identifier for the organization a connection belongs to.", "Org" }
def_id! { ProviderKey, "Registry key identifying a third-party data provider.", "Provider" }
def_id! { ChatSessionId, "Identifier grouping messages of one chat relay session.", "ChatSession" }

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

/// The `(user, org)` pair on whose behalf authorization is requested.
///
/// Supplied externally and immutable for the lifetime of one connection attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity {
	/// End-user identifier.
	pub user: UserId,
	/// Organization identifier.
	pub org: OrgId,
}
impl SessionIdentity {
	/// Bundles a validated user/org pair.
	pub fn new(user: UserId, org: OrgId) -> Self {
		Self { user, org }
	}

	/// Validates raw string inputs and bundles them into an identity.
	pub fn parse(user: impl AsRef<str>, org: impl AsRef<str>) -> Result<Self, IdentifierError> {
		Ok(Self { user: UserId::new(user)?, org: OrgId::new(org)? })
	}
}
impl Display for SessionIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}@{}", self.user, self.org)
	}
}

/// Random tag identifying one connection attempt.
///
/// Responses arriving for an attempt whose tag no longer matches the live attempt are
/// stale and must be dropped.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(u64);
impl AttemptId {
	/// Generates a fresh random tag.
	pub fn generate() -> Self {
		Self(rand::rng().random())
	}
}
impl Debug for AttemptId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Attempt({:016x})", self.0)
	}
}
impl Display for AttemptId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{:016x}", self.0)
	}
}
