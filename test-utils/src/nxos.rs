// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A slice of the NX-OS device model: the NTP settings under `System/time-items`.

use bolero::{Driver, TypeGenerator};
use schema::{Child, ListEntry, Node, Value, keyed, keyed_list};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TIME_ITEMS: &str = "System/time-items";
pub const SRC_IF_ITEMS: &str = "System/time-items/srcIf-items";
pub const PROV_ITEMS: &str = "System/time-items/prov-items";
pub const PROVIDER_LIST: &str = "NtpProvider-list";

/// `datetime-ClkPol`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeItems {
    #[serde(rename = "adminSt", skip_serializing_if = "Option::is_none")]
    pub admin_st: Option<String>,
    #[serde(rename = "logging", skip_serializing_if = "Option::is_none")]
    pub logging: Option<String>,
    #[serde(rename = "loggingLevel", skip_serializing_if = "Option::is_none")]
    pub logging_level: Option<u8>,
    #[serde(rename = "srcIf-items", skip_serializing_if = "Option::is_none")]
    pub src_if_items: Option<SrcIfItems>,
    #[serde(rename = "prov-items", skip_serializing_if = "Option::is_none")]
    pub prov_items: Option<ProvItems>,
}

impl Node for TimeItems {
    fn type_name(&self) -> &'static str {
        "System_TimeItems"
    }
    fn children(&self) -> Vec<Child<'_>> {
        vec![
            Child::leaf("adminSt", self.admin_st.clone().map(Value::Enum)),
            Child::leaf("logging", self.logging.clone().map(Value::Enum)),
            Child::leaf("loggingLevel", self.logging_level),
            Child::container("srcIf-items", self.src_if_items.as_ref()),
            Child::container("prov-items", self.prov_items.as_ref()),
        ]
    }
}

/// `datetime-SrcIf`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SrcIfItems {
    #[serde(rename = "srcIf", skip_serializing_if = "Option::is_none")]
    pub src_if: Option<String>,
}

impl Node for SrcIfItems {
    fn type_name(&self) -> &'static str {
        "System_TimeItems_SrcIfItems"
    }
    fn children(&self) -> Vec<Child<'_>> {
        vec![Child::leaf("srcIf", self.src_if.as_deref())]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvItems {
    #[serde(
        rename = "NtpProvider-list",
        with = "keyed_list",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub providers: BTreeMap<String, NtpProvider>,
}

impl Node for ProvItems {
    fn type_name(&self) -> &'static str {
        "System_TimeItems_ProvItems"
    }
    fn children(&self) -> Vec<Child<'_>> {
        vec![Child::list(PROVIDER_LIST, self.providers.values())]
    }
}

/// `datetime-NtpProvider`, keyed by `name`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NtpProvider {
    pub name: String,
    #[serde(rename = "keyId", skip_serializing_if = "Option::is_none")]
    pub key_id: Option<u32>,
    #[serde(rename = "preferred", skip_serializing_if = "Option::is_none")]
    pub preferred: Option<bool>,
    #[serde(rename = "provT", skip_serializing_if = "Option::is_none")]
    pub prov_t: Option<String>,
    #[serde(rename = "vrf", skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(rename = "minPoll", skip_serializing_if = "Option::is_none")]
    pub min_poll: Option<u8>,
    #[serde(rename = "maxPoll", skip_serializing_if = "Option::is_none")]
    pub max_poll: Option<u8>,
}

impl Node for NtpProvider {
    fn type_name(&self) -> &'static str {
        "System_TimeItems_ProvItems_NtpProviderList"
    }
    fn children(&self) -> Vec<Child<'_>> {
        vec![
            Child::leaf("name", Some(&self.name)),
            Child::leaf("keyId", self.key_id),
            Child::leaf("preferred", self.preferred),
            Child::leaf("provT", self.prov_t.clone().map(Value::Enum)),
            Child::leaf("vrf", self.vrf.as_deref()),
            Child::leaf("minPoll", self.min_poll),
            Child::leaf("maxPoll", self.max_poll),
        ]
    }
    fn check(&self) -> Result<(), String> {
        match (self.min_poll, self.max_poll) {
            (Some(min), Some(max)) if min > max => {
                Err(format!("minPoll {min} is above maxPoll {max}"))
            }
            _ => Ok(()),
        }
    }
}

impl ListEntry for NtpProvider {
    fn key(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("name".to_string(), self.name.clone())])
    }
}

/// An NTP server in the management VRF, as typically configured
#[must_use]
pub fn ntp_server(name: &str) -> NtpProvider {
    NtpProvider {
        name: name.to_string(),
        key_id: None,
        preferred: Some(false),
        prov_t: Some("server".to_string()),
        vrf: Some("management".to_string()),
        min_poll: Some(4),
        max_poll: Some(6),
    }
}

impl TimeItems {
    /// NTP enabled with the given servers and nothing else set
    #[must_use]
    pub fn with_servers(servers: impl IntoIterator<Item = NtpProvider>) -> Self {
        Self {
            admin_st: Some("enabled".to_string()),
            prov_items: Some(ProvItems {
                providers: keyed(servers),
            }),
            ..Default::default()
        }
    }
}

const ADDRESSES: [&str; 5] = [
    "147.204.9.202",
    "147.204.9.203",
    "10.0.0.1",
    "10.0.0.2",
    "ntp.example.com",
];

fn pick<D: Driver>(d: &mut D, choices: &[&str]) -> Option<String> {
    let n = usize::from(d.produce::<u8>()?) % choices.len();
    Some(choices[n].to_string())
}

fn maybe<D: Driver, T>(
    d: &mut D,
    f: impl FnOnce(&mut D) -> Option<T>,
) -> Option<Option<T>> {
    if d.produce::<bool>()? {
        f(d).map(Some)
    } else {
        Some(None)
    }
}

impl TypeGenerator for NtpProvider {
    fn generate<D: Driver>(d: &mut D) -> Option<Self> {
        Some(NtpProvider {
            name: pick(d, &ADDRESSES)?,
            key_id: maybe(d, |d| Some(u32::from(d.produce::<u8>()? % 4 + 1)))?,
            preferred: maybe(d, |d| d.produce::<bool>())?,
            prov_t: maybe(d, |d| pick(d, &["server", "peer"]))?,
            vrf: maybe(d, |d| pick(d, &["default", "management"]))?,
            min_poll: maybe(d, |d| Some(d.produce::<u8>()? % 3 + 4))?,
            max_poll: maybe(d, |d| Some(d.produce::<u8>()? % 5 + 6))?,
        })
    }
}

impl TypeGenerator for TimeItems {
    fn generate<D: Driver>(d: &mut D) -> Option<Self> {
        let admin_st = maybe(d, |d| pick(d, &["enabled", "disabled"]))?;
        let logging = maybe(d, |d| pick(d, &["enabled", "disabled"]))?;
        let logging_level = maybe(d, |d| Some(d.produce::<u8>()? % 8))?;
        let src_if_items = maybe(d, |d| {
            Some(SrcIfItems {
                src_if: maybe(d, |d| pick(d, &["mgmt0", "lo0", "eth1/1"]))?,
            })
        })?;
        let prov_items = maybe(d, |d| {
            let count = d.produce::<u8>()? % 5;
            let mut providers = Vec::new();
            for _ in 0..count {
                providers.push(NtpProvider::generate(d)?);
            }
            Some(ProvItems {
                providers: keyed(providers),
            })
        })?;
        Some(TimeItems {
            admin_st,
            logging,
            logging_level,
            src_if_items,
            prov_items,
        })
    }
}
