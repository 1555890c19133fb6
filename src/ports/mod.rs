//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by UI/adapter into the application
//! - Outbound: Called by application into infrastructure

pub mod document_store;
pub mod inbound;
pub mod outbound;

pub use document_store::{
    Document, DocumentStore, Fields, Query, SortDirection, TIMESTAMP_FIELD, to_fields,
};
pub use inbound::InputPort;
pub use outbound::{IdentityPort, LocationPort, LocationRequest};
