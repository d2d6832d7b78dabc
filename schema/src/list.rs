// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Keyed lists.
//!
//! Generated types hold keyed lists as a `BTreeMap` from composite key to entry. On the wire a
//! list is a JSON array of entries, so list fields use [`keyed_list`] as their serde adapter:
//!
//! ```ignore
//! #[serde(default, with = "swcfg_schema::keyed_list", skip_serializing_if = "BTreeMap::is_empty")]
//! pub servers: BTreeMap<String, Server>,
//! ```

use std::collections::BTreeMap;

use crate::node::ListEntry;

/// Build a keyed list from entries. Later entries replace earlier ones with the same key.
pub fn keyed<E: ListEntry>(entries: impl IntoIterator<Item = E>) -> BTreeMap<String, E> {
    entries.into_iter().map(|e| (e.key_string(), e)).collect()
}

/// Serde adapter between a keyed list and a JSON array of entries
pub mod keyed_list {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    use crate::node::ListEntry;

    pub fn serialize<S, E>(list: &BTreeMap<String, E>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        E: Serialize,
    {
        serializer.collect_seq(list.values())
    }

    pub fn deserialize<'de, D, E>(deserializer: D) -> Result<BTreeMap<String, E>, D::Error>
    where
        D: Deserializer<'de>,
        E: Deserialize<'de> + ListEntry,
    {
        let entries = Vec::<E>::deserialize(deserializer)?;
        let mut list = BTreeMap::new();
        for entry in entries {
            let key = entry.key_string();
            if list.insert(key.clone(), entry).is_some() {
                return Err(D::Error::custom(format!("duplicate list entry '{key}'")));
            }
        }
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use crate::list::keyed;
    use crate::node::{Child, ListEntry, Node};
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Peer {
        addr: String,
        asn: Option<u32>,
    }
    impl Node for Peer {
        fn type_name(&self) -> &'static str {
            "Peer"
        }
        fn children(&self) -> Vec<Child<'_>> {
            vec![
                Child::leaf("addr", Some(self.addr.as_str())),
                Child::leaf("asn", self.asn),
            ]
        }
    }
    impl ListEntry for Peer {
        fn key(&self) -> BTreeMap<String, String> {
            BTreeMap::from([("addr".to_string(), self.addr.clone())])
        }
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Peers {
        #[serde(
            rename = "Peer-list",
            default,
            with = "crate::keyed_list",
            skip_serializing_if = "BTreeMap::is_empty"
        )]
        peers: BTreeMap<String, Peer>,
    }

    fn peer(addr: &str) -> Peer {
        Peer {
            addr: addr.to_string(),
            asn: Some(65000),
        }
    }

    #[test]
    fn list_is_a_json_array() {
        let peers = Peers {
            peers: keyed([peer("10.0.0.2"), peer("10.0.0.1")]),
        };
        let json = serde_json::to_string(&peers).unwrap();
        assert_eq!(
            json,
            r#"{"Peer-list":[{"addr":"10.0.0.1","asn":65000},{"addr":"10.0.0.2","asn":65000}]}"#
        );
        let back: Peers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, peers);

        let empty: Peers = serde_json::from_str("{}").unwrap();
        assert!(empty.peers.is_empty());
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let json = r#"{"Peer-list":[{"addr":"10.0.0.1"},{"addr":"10.0.0.1"}]}"#;
        let err = serde_json::from_str::<Peers>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate list entry"), "{err}");
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Route {
        prefix: String,
        nexthop: String,
    }
    impl Node for Route {
        fn type_name(&self) -> &'static str {
            "Route"
        }
        fn children(&self) -> Vec<Child<'_>> {
            vec![
                Child::leaf("prefix", Some(self.prefix.as_str())),
                Child::leaf("nexthop", Some(self.nexthop.as_str())),
            ]
        }
    }
    impl ListEntry for Route {
        fn key(&self) -> BTreeMap<String, String> {
            BTreeMap::from([
                ("prefix".to_string(), self.prefix.clone()),
                ("nexthop".to_string(), self.nexthop.clone()),
            ])
        }
    }

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Routes {
        #[serde(rename = "Route-list", default, with = "crate::keyed_list")]
        routes: BTreeMap<String, Route>,
    }

    #[test]
    fn composite_keys_with_separators_stay_distinct() {
        let json = r#"{"Route-list":[{"prefix":"x,y","nexthop":"z"},{"prefix":"x","nexthop":"y,z"}]}"#;
        let routes: Routes = serde_json::from_str(json).unwrap();
        assert_eq!(routes.routes.len(), 2);

        let route = |prefix: &str, nexthop: &str| Route {
            prefix: prefix.to_string(),
            nexthop: nexthop.to_string(),
        };
        let list = keyed([
            route("x,y", "z"),
            route("x", "y,z"),
            route("a]", "b"),
            route("a", "]b"),
        ]);
        assert_eq!(list.len(), 4);
        assert!(list.contains_key(r"[nexthop=b][prefix=a\]]"));
    }
}
