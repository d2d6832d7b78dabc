// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Schema-typed configuration trees.
//!
//! Types generated from the device YANG models implement [`Node`], an explicit descriptor of
//! their children: scalar leaves, nested containers and keyed lists. Generic algorithms (diffing,
//! validation) walk trees through this descriptor; serialization goes through serde.

#![deny(
    unsafe_code,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
#![allow(clippy::missing_errors_doc)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod errors;
pub mod list;
pub mod node;
pub mod tree;
pub mod value;

pub use errors::SchemaError;
pub use list::{keyed, keyed_list};
pub use node::{Child, Entry, Field, ListEntry, Node, validate};
pub use tree::Tree;
pub use value::{UNSET_MARKER, Value};
