// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Diff engine.
//!
//! Computes the [`Delta`] that turns an observed subtree into a desired one. Both trees are
//! walked together, child by child, through their [`Node`] descriptors:
//!
//! * a list entry present only in the observed tree is deleted whole, with a single path, and
//!   nothing under it is visited;
//! * a leaf set only in the observed tree is deleted;
//! * a leaf whose desired value differs from the observed one is updated.
//!
//! Key leaves of list entries are never updated: they are implied by the entry path. Leaf deletes
//! whose path is also updated are dropped, and so is anything under an ignored path. Deletes
//! come first in the result, then updates, each in tree order, so that equal inputs always
//! produce the same delta.
//!
//! The device convention for unsetting a property is the [`UNSET_MARKER`] value. An observed
//! marker means unset. A desired marker means "make it unset", which only takes a write if the
//! device currently holds a value.
//!
//! [`UNSET_MARKER`]: schema::UNSET_MARKER

use std::collections::{BTreeMap, BTreeSet};

use gnmi::{Encoding, Path};
use schema::{Entry, Field, Node, Value};
#[allow(unused)]
use tracing::{debug, trace};

use crate::codec::scalar_to_wire;
use crate::delta::{Delta, PathUpdate};
use crate::errors::SyncError;

type Key = BTreeMap<String, String>;

#[derive(Default)]
struct Walk {
    deletes: Vec<Path>,
    updates: Vec<(Path, Value)>,
}

fn mismatch(path: &Path, reason: impl Into<String>) -> SyncError {
    SyncError::DiffComputationFailed {
        path: path.to_string(),
        reason: reason.into(),
    }
}

impl Walk {
    /// Walk `observed` and `desired`, the node at `path`. `key` holds the key leaves of the node
    /// if it is a list entry.
    fn node(
        &mut self,
        path: &Path,
        observed: Option<&dyn Node>,
        desired: Option<&dyn Node>,
        key: Option<&Key>,
    ) -> Result<(), SyncError> {
        if let (Some(o), Some(d)) = (observed, desired) {
            if o.type_name() != d.type_name() {
                return Err(mismatch(
                    path,
                    format!("cannot compare {} with {}", o.type_name(), d.type_name()),
                ));
            }
        }
        let observed = observed.map(|n| n.children());
        let desired = desired.map(|n| n.children());
        match (observed, desired) {
            (Some(observed), Some(desired)) => {
                if observed.len() != desired.len() {
                    return Err(mismatch(path, "nodes of the same type differ in children"));
                }
                for (o, d) in observed.into_iter().zip(desired) {
                    if o.name != d.name {
                        return Err(mismatch(
                            path,
                            format!("child '{}' faces child '{}'", o.name, d.name),
                        ));
                    }
                    self.child(path, o.name, Some(o.field), Some(d.field), key)?;
                }
            }
            (Some(observed), None) => {
                for o in observed {
                    self.child(path, o.name, Some(o.field), None, key)?;
                }
            }
            (None, Some(desired)) => {
                for d in desired {
                    self.child(path, d.name, None, Some(d.field), key)?;
                }
            }
            (None, None) => {}
        }
        Ok(())
    }

    fn child(
        &mut self,
        parent: &Path,
        name: &str,
        observed: Option<Field<'_>>,
        desired: Option<Field<'_>>,
        key: Option<&Key>,
    ) -> Result<(), SyncError> {
        match (observed, desired) {
            (o @ (Some(Field::Leaf(_)) | None), d @ (Some(Field::Leaf(_)) | None)) => {
                if key.is_some_and(|k| k.contains_key(name)) {
                    return Ok(());
                }
                let o = match o {
                    Some(Field::Leaf(v)) => v,
                    _ => None,
                };
                let d = match d {
                    Some(Field::Leaf(v)) => v,
                    _ => None,
                };
                self.leaf(parent.child(name), o, d);
            }
            (
                o @ (Some(Field::Container(_)) | None),
                d @ (Some(Field::Container(_)) | None),
            ) => {
                let o = match o {
                    Some(Field::Container(n)) => n,
                    _ => None,
                };
                let d = match d {
                    Some(Field::Container(n)) => n,
                    _ => None,
                };
                if o.is_some() || d.is_some() {
                    self.node(&parent.child(name), o, d, None)?;
                }
            }
            (o @ (Some(Field::List(_)) | None), d @ (Some(Field::List(_)) | None)) => {
                let o = match o {
                    Some(Field::List(entries)) => entries,
                    _ => vec![],
                };
                let d = match d {
                    Some(Field::List(entries)) => entries,
                    _ => vec![],
                };
                self.list(parent, name, o, d)?;
            }
            (Some(o), Some(d)) => {
                return Err(mismatch(
                    &parent.child(name),
                    format!("{} faces {}", o.kind(), d.kind()),
                ));
            }
        }
        Ok(())
    }

    fn leaf(&mut self, path: Path, observed: Option<Value>, desired: Option<Value>) {
        let observed = observed.filter(|v| !v.is_unset_marker());
        match (observed, desired) {
            (Some(_), Some(d)) if d.is_unset_marker() => self.updates.push((path, d)),
            (None, Some(d)) if d.is_unset_marker() => {}
            (Some(o), Some(d)) if o == d => {}
            (_, Some(d)) => self.updates.push((path, d)),
            (Some(_), None) => self.deletes.push(path),
            (None, None) => {}
        }
    }

    fn list(
        &mut self,
        parent: &Path,
        name: &str,
        observed: Vec<Entry<'_>>,
        desired: Vec<Entry<'_>>,
    ) -> Result<(), SyncError> {
        let mut observed: BTreeMap<Key, &dyn Node> =
            observed.into_iter().map(|e| (e.key, e.node)).collect();
        for entry in desired {
            let path = parent.entry(name, entry.key.clone());
            let o = observed.remove(&entry.key);
            self.node(&path, o, Some(entry.node), Some(&entry.key))?;
        }
        for key in observed.into_keys() {
            self.deletes.push(parent.entry(name, key));
        }
        Ok(())
    }
}

/// Compute the writes turning `observed` into `desired`, both rooted at `root`.
///
/// The trees must be of the same schema type. Paths in the result are absolute (prefixed with
/// `root`), and any under one of the `ignore` paths are left out. Update values are encoded as
/// JSON scalars in `encoding`.
pub fn diff(
    root: &Path,
    observed: &dyn Node,
    desired: &dyn Node,
    ignore: &[Path],
    encoding: Encoding,
) -> Result<Delta, SyncError> {
    let root_key = root.elems().last().map(|e| &e.keys).filter(|k| !k.is_empty());
    let mut walk = Walk::default();
    walk.node(root, Some(observed), Some(desired), root_key)?;

    let updated: BTreeSet<&Path> = walk.updates.iter().map(|(p, _)| p).collect();
    let ignored = |path: &Path| ignore.iter().any(|i| path.matches_prefix(i));

    let deletes: Vec<Path> = walk
        .deletes
        .iter()
        .filter(|p| !updated.contains(p) && !ignored(p))
        .cloned()
        .collect();

    let mut updates = Vec::with_capacity(walk.updates.len());
    for (path, value) in &walk.updates {
        if ignored(path) {
            trace!("Ignoring update of {path}");
            continue;
        }
        let value = scalar_to_wire(path, value, encoding)?;
        updates.push(PathUpdate {
            path: path.clone(),
            value,
        });
    }

    let delta = Delta { deletes, updates };
    debug!(
        "Diff at {root}: {} deletes, {} updates",
        delta.deletes.len(),
        delta.updates.len()
    );
    Ok(delta)
}
