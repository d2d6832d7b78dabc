// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Type-erased trees.
//!
//! Code that handles subtrees of arbitrary schema types (e.g. reading back whatever a desired
//! subtree is made of) works with `dyn Tree`. Every serde-capable [`Node`] with a default
//! value is a [`Tree`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::SchemaError;
use crate::node::Node;

pub trait Tree: Node {
    fn as_node(&self) -> &dyn Node;

    /// Serialize as schema-compliant JSON.
    fn to_json(&self) -> Result<Vec<u8>, SchemaError>;

    /// Decode JSON into a new tree of the same type as `self`.
    fn decode_like(&self, json: &[u8]) -> Result<Box<dyn Tree>, SchemaError>;

    /// A tree of the same type as `self` with nothing set.
    fn empty_like(&self) -> Box<dyn Tree>;
}

impl<T> Tree for T
where
    T: Node + Serialize + DeserializeOwned + Default + 'static,
{
    fn as_node(&self) -> &dyn Node {
        self
    }

    fn to_json(&self) -> Result<Vec<u8>, SchemaError> {
        serde_json::to_vec(self).map_err(|source| SchemaError::Json {
            node: self.type_name(),
            source,
        })
    }

    fn decode_like(&self, json: &[u8]) -> Result<Box<dyn Tree>, SchemaError> {
        let tree: T = serde_json::from_slice(json).map_err(|source| SchemaError::Json {
            node: self.type_name(),
            source,
        })?;
        Ok(Box::new(tree))
    }

    fn empty_like(&self) -> Box<dyn Tree> {
        Box::new(T::default())
    }
}
