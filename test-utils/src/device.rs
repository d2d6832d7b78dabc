// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! An in-memory gNMI device.
//!
//! The configuration is a single JSON document. Keyed lists are JSON arrays of objects, and a
//! path element with keys selects the array entry whose members match them. Writes follow the
//! device conventions the engine relies on: deletes first, then replaces, then updates, with the
//! unset marker removing the leaf it is written to.

use async_trait::async_trait;
use gnmi::proto::{
    CapabilityRequest, CapabilityResponse, GetRequest, GetResponse, ModelData, Notification,
    SetRequest, SetResponse, Update,
};
use gnmi::{Encoding, Path, PathElem, proto};
use schema::UNSET_MARKER;
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tonic::Status;
use tracing::{debug, warn};

/// What the device answers when reading a path with nothing configured
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Missing {
    /// A response with a single notification holding no update (NX-OS behaviour)
    #[default]
    EmptyNotification,
    /// A response with no notification at all
    NoNotification,
    /// A `NOT_FOUND` status
    NotFoundStatus,
}

pub struct FakeDevice {
    capabilities: CapabilityResponse,
    missing: Missing,
    config: Mutex<Json>,
    sets: Mutex<Vec<SetRequest>>,
    gets: Mutex<Vec<GetRequest>>,
    canned_get: Mutex<Option<Result<GetResponse, Status>>>,
    failing_set: Mutex<Option<(usize, Status)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FakeDevice {
    /// A device reporting the NX-OS device model, speaking both JSON encodings, with an empty
    /// configuration.
    #[must_use]
    pub fn nxos() -> Self {
        Self {
            capabilities: CapabilityResponse {
                supported_models: vec![ModelData {
                    name: "Cisco-NX-OS-device".to_string(),
                    organization: "Cisco Systems, Inc.".to_string(),
                    version: "2024-03-26".to_string(),
                }],
                supported_encodings: vec![
                    proto::Encoding::Json as i32,
                    proto::Encoding::JsonIetf as i32,
                ],
                g_nmi_version: "0.5.0".to_string(),
            },
            missing: Missing::default(),
            config: Mutex::new(Json::Object(Map::new())),
            sets: Mutex::default(),
            gets: Mutex::default(),
            canned_get: Mutex::default(),
            failing_set: Mutex::default(),
        }
    }

    #[must_use]
    pub fn with_encodings(mut self, encodings: &[proto::Encoding]) -> Self {
        self.capabilities.supported_encodings = encodings.iter().map(|e| *e as i32).collect();
        self
    }

    #[must_use]
    pub fn with_model_version(mut self, version: &str) -> Self {
        for model in &mut self.capabilities.supported_models {
            model.version = version.to_string();
        }
        self
    }

    #[must_use]
    pub fn with_missing(mut self, missing: Missing) -> Self {
        self.missing = missing;
        self
    }

    /// Store `value` at `path`, creating what leads to it.
    #[must_use]
    pub fn with_config_at(self, path: &str, value: Json) -> Self {
        self.store(&parse(path), value);
        self
    }

    /// Answer every Get with this, whatever the path.
    pub fn answer_gets_with(&self, answer: Result<GetResponse, Status>) {
        *lock(&self.canned_get) = Some(answer);
    }

    /// Make the `nth` Set (counting from 1) fail with `status`, leaving the config untouched.
    pub fn fail_set(&self, nth: usize, status: Status) {
        *lock(&self.failing_set) = Some((nth, status));
    }

    /// The whole configuration document
    #[must_use]
    pub fn config(&self) -> Json {
        lock(&self.config).clone()
    }

    /// The configuration at `path`, if any
    #[must_use]
    pub fn config_at(&self, path: &str) -> Option<Json> {
        let config = lock(&self.config);
        find(&config, &parse(path)).cloned()
    }

    pub fn store(&self, path: &Path, value: Json) {
        let mut config = lock(&self.config);
        let slot = slot(&mut config, path);
        *slot = value;
        restore_keys(slot, path);
    }

    /// The Set requests received so far, failed ones included
    #[must_use]
    pub fn sets(&self) -> Vec<SetRequest> {
        lock(&self.sets).clone()
    }

    #[must_use]
    pub fn gets(&self) -> Vec<GetRequest> {
        lock(&self.gets).clone()
    }

    /// Every path deleted so far, in order
    #[must_use]
    pub fn deleted_paths(&self) -> Vec<String> {
        self.sets()
            .iter()
            .flat_map(|s| s.delete.iter())
            .map(|p| to_path(p).to_string())
            .collect()
    }

    /// Every path updated so far, in order
    #[must_use]
    pub fn updated_paths(&self) -> Vec<String> {
        self.sets()
            .iter()
            .flat_map(|s| s.update.iter())
            .filter_map(|u| u.path.as_ref())
            .map(|p| to_path(p).to_string())
            .collect()
    }

    fn apply_set(&self, request: &SetRequest) -> Result<(), Status> {
        let prefix = request.prefix.as_ref().map(to_path).unwrap_or_default();
        let absolute = |path: Option<&proto::Path>| -> Result<Path, Status> {
            let path = path.map(to_path).unwrap_or_default();
            prefix
                .join(&path)
                .map_err(|e| Status::invalid_argument(e.to_string()))
        };

        let mut config = lock(&self.config);
        for path in &request.delete {
            remove(&mut config, &absolute(Some(path))?);
        }
        for update in &request.replace {
            let path = absolute(update.path.as_ref())?;
            let value = json_value(update)?;
            let slot = slot(&mut config, &path);
            *slot = value;
            restore_keys(slot, &path);
        }
        for update in &request.update {
            let path = absolute(update.path.as_ref())?;
            let value = json_value(update)?;
            if value.as_str() == Some(UNSET_MARKER) {
                remove(&mut config, &path);
                continue;
            }
            let slot = slot(&mut config, &path);
            merge(slot, value);
            restore_keys(slot, &path);
        }
        Ok(())
    }
}

#[async_trait]
impl gnmi::GnmiTransport for FakeDevice {
    async fn capabilities(
        &self,
        _request: CapabilityRequest,
    ) -> Result<CapabilityResponse, Status> {
        Ok(self.capabilities.clone())
    }

    async fn get(&self, request: GetRequest) -> Result<GetResponse, Status> {
        lock(&self.gets).push(request.clone());
        if let Some(answer) = lock(&self.canned_get).clone() {
            return answer;
        }
        let encoding = proto::Encoding::try_from(request.encoding)
            .ok()
            .and_then(|e| Encoding::try_from(e).ok())
            .ok_or_else(|| Status::invalid_argument("unsupported encoding"))?;
        let prefix = request.prefix.as_ref().map(to_path).unwrap_or_default();

        let mut notifications = Vec::with_capacity(request.path.len());
        for requested in &request.path {
            let path = prefix
                .join(&to_path(requested))
                .map_err(|e| Status::invalid_argument(e.to_string()))?;
            let value = find(&lock(&self.config), &path).cloned();
            let Some(value) = value else {
                match self.missing {
                    Missing::EmptyNotification => notifications.push(Notification::default()),
                    Missing::NoNotification => {}
                    Missing::NotFoundStatus => {
                        return Err(Status::not_found(format!("{path} not found")));
                    }
                }
                continue;
            };
            let json =
                serde_json::to_vec(&value).map_err(|e| Status::internal(e.to_string()))?;
            notifications.push(Notification {
                update: vec![Update {
                    path: Some(proto::Path::from(&path)),
                    val: Some(encoding.encode(json)),
                    duplicates: 0,
                }],
                ..Default::default()
            });
        }
        Ok(GetResponse {
            notification: notifications,
        })
    }

    async fn set(&self, request: SetRequest) -> Result<SetResponse, Status> {
        let count = {
            let mut sets = lock(&self.sets);
            sets.push(request.clone());
            sets.len()
        };
        if let Some((nth, status)) = lock(&self.failing_set).clone() {
            if nth == count {
                warn!("Failing Set #{count}: {status}");
                return Err(status);
            }
        }
        debug!(
            "Set #{count}: {} deletes, {} replaces, {} updates",
            request.delete.len(),
            request.replace.len(),
            request.update.len()
        );
        self.apply_set(&request)?;
        Ok(SetResponse::default())
    }
}

fn parse(path: &str) -> Path {
    Path::parse(path).unwrap_or_else(|e| panic!("bad fixture path '{path}': {e}"))
}

fn to_path(path: &proto::Path) -> Path {
    Path::try_from(path).unwrap_or_else(|e| panic!("device received a bad path: {e}"))
}

fn json_value(update: &Update) -> Result<Json, Status> {
    use proto::typed_value::Value;
    match update.val.as_ref().and_then(|v| v.value.as_ref()) {
        Some(Value::JsonIetfVal(bytes) | Value::JsonVal(bytes)) => serde_json::from_slice(bytes)
            .map_err(|e| Status::invalid_argument(format!("bad JSON value: {e}"))),
        Some(other) => Err(Status::invalid_argument(format!(
            "unsupported value type {}",
            other.kind()
        ))),
        None => Err(Status::invalid_argument("update without a value")),
    }
}

fn key_text(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches_keys(entry: &Json, keys: &BTreeMap<String, String>) -> bool {
    keys.iter()
        .all(|(k, v)| entry.get(k).is_some_and(|x| key_text(x) == *v))
}

fn find_elem<'a>(node: &'a Json, elem: &PathElem) -> Option<&'a Json> {
    let child = node.get(&elem.name)?;
    if elem.keys.is_empty() {
        return Some(child);
    }
    child.as_array()?.iter().find(|e| matches_keys(e, &elem.keys))
}

fn find<'a>(root: &'a Json, path: &Path) -> Option<&'a Json> {
    path.elems()
        .iter()
        .try_fold(root, |node, elem| find_elem(node, elem))
}

fn find_elem_mut<'a>(node: &'a mut Json, elem: &PathElem) -> Option<&'a mut Json> {
    let child = node.get_mut(&elem.name)?;
    if elem.keys.is_empty() {
        return Some(child);
    }
    child
        .as_array_mut()?
        .iter_mut()
        .find(|e| matches_keys(e, &elem.keys))
}

fn object(node: &mut Json) -> &mut Map<String, Json> {
    if !node.is_object() {
        *node = Json::Object(Map::new());
    }
    match node {
        Json::Object(map) => map,
        _ => unreachable!(),
    }
}

/// The value at `path`, created (as null, or as a list entry holding its keys) if missing.
fn slot<'a>(root: &'a mut Json, path: &Path) -> &'a mut Json {
    let mut node = root;
    for elem in path.elems() {
        let member = object(node).entry(elem.name.clone()).or_insert(Json::Null);
        if elem.keys.is_empty() {
            node = member;
            continue;
        }
        if !member.is_array() {
            *member = Json::Array(vec![]);
        }
        let Json::Array(entries) = member else {
            unreachable!()
        };
        let position = match entries.iter().position(|e| matches_keys(e, &elem.keys)) {
            Some(position) => position,
            None => {
                entries.push(Json::Null);
                entries.len() - 1
            }
        };
        node = &mut entries[position];
        restore_keys_of(node, &elem.keys);
    }
    node
}

fn restore_keys_of(entry: &mut Json, keys: &BTreeMap<String, String>) {
    let entry = object(entry);
    for (k, v) in keys {
        entry
            .entry(k.clone())
            .or_insert_with(|| Json::String(v.clone()));
    }
}

/// A list entry written whole keeps its key members.
fn restore_keys(slot: &mut Json, path: &Path) {
    if let Some(last) = path.elems().last() {
        if !last.keys.is_empty() {
            restore_keys_of(slot, &last.keys);
        }
    }
}

fn merge(slot: &mut Json, value: Json) {
    match (slot, value) {
        (Json::Object(into), Json::Object(from)) => {
            for (k, v) in from {
                merge(into.entry(k).or_insert(Json::Null), v);
            }
        }
        (slot, value) => *slot = value,
    }
}

fn remove(root: &mut Json, path: &Path) {
    let Some((last, parents)) = path.elems().split_last() else {
        *root = Json::Object(Map::new());
        return;
    };
    let mut node = root;
    for elem in parents {
        match find_elem_mut(node, elem) {
            Some(child) => node = child,
            None => return,
        }
    }
    let Some(map) = node.as_object_mut() else {
        return;
    };
    if last.keys.is_empty() {
        map.remove(&last.name);
        return;
    }
    if let Some(Json::Array(entries)) = map.get_mut(&last.name) {
        entries.retain(|e| !matches_keys(e, &last.keys));
        if entries.is_empty() {
            map.remove(&last.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FakeDevice;
    use gnmi::{Encoding, GnmiTransport, Path, proto};
    use serde_json::json;
    use tonic::Status;
    use tracing_test::traced_test;

    fn path(p: &str) -> proto::Path {
        proto::Path::from(&Path::parse(p).unwrap())
    }

    #[tokio::test]
    async fn writes_and_reads() {
        let device = FakeDevice::nxos().with_config_at(
            "System/time-items/prov-items/NtpProvider-list[name=10.0.0.1]",
            json!({"vrf": "default"}),
        );
        assert_eq!(
            device.config_at("System/time-items/prov-items"),
            Some(json!({"NtpProvider-list": [{"name": "10.0.0.1", "vrf": "default"}]}))
        );

        let request = proto::SetRequest {
            delete: vec![path(
                "System/time-items/prov-items/NtpProvider-list[name=10.0.0.1]",
            )],
            update: vec![proto::Update {
                path: Some(path("System/time-items/srcIf-items/srcIf")),
                val: Some(Encoding::Json.encode(br#""mgmt0""#.to_vec())),
                duplicates: 0,
            }],
            ..Default::default()
        };
        device.set(request).await.unwrap();
        assert_eq!(
            device.config(),
            json!({"System": {"time-items": {
                "prov-items": {},
                "srcIf-items": {"srcIf": "mgmt0"}
            }}})
        );
        assert_eq!(
            device.deleted_paths(),
            vec!["System/time-items/prov-items/NtpProvider-list[name=10.0.0.1]"]
        );
    }

    #[tokio::test]
    async fn unset_marker_removes_the_leaf() {
        let device = FakeDevice::nxos()
            .with_config_at("System/time-items/srcIf-items", json!({"srcIf": "mgmt0"}));
        let request = proto::SetRequest {
            update: vec![proto::Update {
                path: Some(path("System/time-items/srcIf-items/srcIf")),
                val: Some(
                    Encoding::JsonIetf.encode(br#""DME_UNSET_PROPERTY_MARKER""#.to_vec()),
                ),
                duplicates: 0,
            }],
            ..Default::default()
        };
        device.set(request).await.unwrap();
        assert_eq!(device.config_at("System/time-items/srcIf-items"), Some(json!({})));
    }

    #[tokio::test]
    #[traced_test]
    async fn sets_are_logged_and_can_fail() {
        let device = FakeDevice::nxos();
        device.fail_set(2, Status::failed_precondition("in use"));
        let request = proto::SetRequest {
            delete: vec![path("System/time-items")],
            ..Default::default()
        };
        device.set(request.clone()).await.unwrap();
        assert!(logs_contain("Set #1: 1 deletes, 0 replaces, 0 updates"));

        let err = device.set(request).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::FailedPrecondition);
        assert!(logs_contain("Failing Set #2"));
        assert_eq!(device.sets().len(), 2);
    }
}
