//! `nodes` crate — the node-kind registry and the node/edge factories.
//!
//! The registry maps a kind key to a capability record (display name,
//! default port counts, typed-ports flag); the factories consume those
//! records to construct nodes and edges that conform to the graph model.

pub mod factory;
pub mod registry;
pub mod sample;

pub use registry::{KindDescriptor, KindRegistry};
