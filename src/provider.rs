//! Provider-facing descriptors (data) and connectors (behavior).
//!
//! `descriptor` exposes the immutable per-provider metadata (`ProviderDescriptor`)
//! covering the backend authorize and credential endpoints. `registry` maps provider
//! keys to descriptors with no runtime mutation API. `connector` defines
//! [`ProviderConnector`], the uniform capability contract every registered provider
//! is served through, so the state machine never branches on the provider.

pub mod connector;
pub mod descriptor;
pub mod registry;

pub use connector::*;
pub use descriptor::*;
pub use registry::*;
