//! # Scene Graph
//!
//! Typed, timestamped tree of nodes mirroring the objects of a render
//! device. Nodes are created by subtype through the [`factory`], edited
//! through their values and children, and pushed to the device by visitors
//! that only touch what changed since the last commit.
//!
//! ## Key Components
//!
//! - [`node`] - [`Node`], builder, hints and modification tracking
//! - [`value`] - Dynamically typed [`Value`]s and data arrays
//! - [`factory`] - Subtype registry and node creation
//! - [`visitors`] - Commit, scene assembly and utility traversals
//! - [`objects`] - Built-in node subtypes and typed wrappers

pub mod factory;
pub mod node;
pub mod objects;
pub mod timestamp;
pub mod value;
pub mod visitors;

pub use factory::{create_node, create_node_with_value, register_node_factory, NodeConstructor};
pub use node::{Node, NodeBehavior, NodeBuilder, NodePtr, NodeType};
pub use timestamp::TimeStamp;
pub use value::{DataArray, DataKind, FromValue, Value, ValueKind};
pub use visitors::{TraversalContext, Visitor};
