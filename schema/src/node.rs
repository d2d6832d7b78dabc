// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Schema descriptor of tree nodes

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use crate::errors::SchemaError;
use crate::value::Value;

/// A struct-like node of a configuration tree.
///
/// Implemented once per generated schema type. [`Node::children`] must list the same children,
/// in the same order, for every instance of a type: absent children are reported as such rather
/// than omitted.
pub trait Node: Debug + Send + Sync {
    /// Schema name of the type, used in errors and to check that two trees are comparable.
    fn type_name(&self) -> &'static str;

    /// All children of this node, named as in the schema.
    fn children(&self) -> Vec<Child<'_>>;

    /// Type-specific constraints beyond what [`validate`] checks generically.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// An entry of a keyed list
pub trait ListEntry: Node {
    /// The key leaves of this entry and their values.
    fn key(&self) -> BTreeMap<String, String>;

    /// Composite key identifying this entry within its list, in path predicate form
    /// (`[k1=v1][k2=v2]`, with `]` and `\` escaped in values).
    fn key_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.key() {
            out.push('[');
            out.push_str(&key);
            out.push('=');
            for c in value.chars() {
                if c == ']' || c == '\\' {
                    out.push('\\');
                }
                out.push(c);
            }
            out.push(']');
        }
        out
    }
}

/// A list entry as seen through the descriptor
#[derive(Debug)]
pub struct Entry<'a> {
    pub key: BTreeMap<String, String>,
    pub node: &'a dyn Node,
}

#[derive(Debug)]
pub enum Field<'a> {
    /// A scalar leaf; `None` when unset
    Leaf(Option<Value>),
    /// A nested container; `None` when absent
    Container(Option<&'a dyn Node>),
    /// A keyed list, entries ordered by key
    List(Vec<Entry<'a>>),
}

impl Field<'_> {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Field::Leaf(_) => "leaf",
            Field::Container(_) => "container",
            Field::List(_) => "list",
        }
    }
}

#[derive(Debug)]
pub struct Child<'a> {
    pub name: &'static str,
    pub field: Field<'a>,
}

impl<'a> Child<'a> {
    pub fn leaf<V: Into<Value>>(name: &'static str, value: Option<V>) -> Self {
        Self {
            name,
            field: Field::Leaf(value.map(Into::into)),
        }
    }

    pub fn container<N: Node>(name: &'static str, node: Option<&'a N>) -> Self {
        Self {
            name,
            field: Field::Container(node.map(|n| n as &dyn Node)),
        }
    }

    pub fn list<E: ListEntry + 'a>(name: &'static str, entries: impl IntoIterator<Item = &'a E>) -> Self {
        let mut entries: Vec<Entry<'a>> = entries
            .into_iter()
            .map(|e| Entry {
                key: e.key(),
                node: e as &dyn Node,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            name,
            field: Field::List(entries),
        }
    }
}

fn invalid(node: &dyn Node, path: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::Validation {
        node: node.type_name(),
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Validate a tree against its own schema constraints: list entries must have a non-empty key
/// whose leaves are set to the key values, keys must be unique within a list, and every node
/// must pass its [`Node::check`].
pub fn validate(root: &dyn Node) -> Result<(), SchemaError> {
    validate_at(root, root.type_name())
}

fn validate_at(node: &dyn Node, path: &str) -> Result<(), SchemaError> {
    node.check().map_err(|reason| invalid(node, path, reason))?;
    for child in node.children() {
        let child_path = format!("{path}/{}", child.name);
        match child.field {
            Field::Leaf(_) => {}
            Field::Container(None) => {}
            Field::Container(Some(inner)) => validate_at(inner, &child_path)?,
            Field::List(entries) => {
                let mut seen = BTreeSet::new();
                for entry in entries {
                    let entry_path = format!("{child_path}{:?}", entry.key);
                    check_entry_key(&entry, &entry_path)?;
                    if !seen.insert(entry.key.clone()) {
                        return Err(invalid(entry.node, &entry_path, "duplicate list key"));
                    }
                    validate_at(entry.node, &entry_path)?;
                }
            }
        }
    }
    Ok(())
}

fn check_entry_key(entry: &Entry<'_>, path: &str) -> Result<(), SchemaError> {
    if entry.key.is_empty() {
        return Err(invalid(entry.node, path, "list entry has an empty key"));
    }
    let leaves: BTreeMap<&str, Option<Value>> = entry
        .node
        .children()
        .into_iter()
        .filter_map(|c| match c.field {
            Field::Leaf(v) => Some((c.name, v)),
            _ => None,
        })
        .collect();
    for (name, expected) in &entry.key {
        match leaves.get(name.as_str()) {
            None => {
                return Err(invalid(
                    entry.node,
                    path,
                    format!("key '{name}' is not a leaf of the entry"),
                ));
            }
            Some(None) => {
                return Err(invalid(entry.node, path, format!("key leaf '{name}' is unset")));
            }
            Some(Some(v)) if v.to_key_string() != *expected => {
                return Err(invalid(
                    entry.node,
                    path,
                    format!("key leaf '{name}' is '{v}' but the entry key says '{expected}'"),
                ));
            }
            Some(Some(_)) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Child, ListEntry, Node, validate};
    use crate::errors::SchemaError;
    use std::collections::BTreeMap;

    #[derive(Debug)]
    struct Server {
        host: Option<String>,
        port: Option<u16>,
    }
    impl Node for Server {
        fn type_name(&self) -> &'static str {
            "Server"
        }
        fn children(&self) -> Vec<Child<'_>> {
            vec![
                Child::leaf("host", self.host.as_deref()),
                Child::leaf("port", self.port),
            ]
        }
        fn check(&self) -> Result<(), String> {
            match self.port {
                Some(0) => Err("port must not be zero".to_string()),
                _ => Ok(()),
            }
        }
    }
    impl ListEntry for Server {
        fn key(&self) -> BTreeMap<String, String> {
            BTreeMap::from([("host".to_string(), self.host.clone().unwrap_or_default())])
        }
    }

    #[derive(Debug)]
    struct Servers(Vec<Server>);
    impl Node for Servers {
        fn type_name(&self) -> &'static str {
            "Servers"
        }
        fn children(&self) -> Vec<Child<'_>> {
            vec![Child::list("Server-list", &self.0)]
        }
    }

    fn server(host: &str, port: u16) -> Server {
        Server {
            host: Some(host.to_string()),
            port: Some(port),
        }
    }

    #[test]
    fn valid_tree() {
        let tree = Servers(vec![server("b", 2), server("a", 1)]);
        validate(&tree).unwrap();

        /* entries come out ordered by key */
        let children = tree.children();
        let super::Field::List(entries) = &children[0].field else {
            panic!("expected a list");
        };
        assert_eq!(entries[0].key["host"], "a");
        assert_eq!(entries[1].key["host"], "b");
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let tree = Servers(vec![server("a", 1), server("a", 2)]);
        let err = validate(&tree).unwrap_err();
        assert!(err.to_string().contains("duplicate list key"), "{err}");
    }

    #[test]
    fn unset_key_leaf_is_rejected() {
        let tree = Servers(vec![Server {
            host: None,
            port: Some(1),
        }]);
        assert!(matches!(
            validate(&tree),
            Err(SchemaError::Validation { node: "Server", .. })
        ));
    }

    #[test]
    fn type_check_hook_runs() {
        let tree = Servers(vec![server("a", 0)]);
        let err = validate(&tree).unwrap_err();
        assert!(err.to_string().contains("port must not be zero"), "{err}");
    }
}
