//! Connection manager for the remote store: transport resolution, the
//! authenticated HTTP client, collection discovery, and search execution
//! behind the core `SearchBackend` trait.

pub mod client;
pub mod endpoint;
pub mod graphql;

pub use client::StoreClient;
pub use endpoint::{resolve_endpoints, EndpointDescriptor, Endpoints};
