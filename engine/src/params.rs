// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Connection and write parameters

use derive_builder::Builder;
use gnmi::RequiredModel;
use std::time::Duration;

/// Name of the NX-OS device model checked at connection time
pub const NXOS_DEVICE_MODEL: &str = "Cisco-NX-OS-device";
/// Release of [`NXOS_DEVICE_MODEL`] the engine is validated against
pub const NXOS_DEVICE_MODEL_VERSION: &str = "2024-03-26";

/// Default bound on the number of paths per Set request
pub const DEFAULT_MAX_PATHS_PER_REQUEST: usize = 20;

/// How deltas are written to a device
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct ApplyParams {
    /// Max number of paths carried by a single Set request
    #[builder(default = "DEFAULT_MAX_PATHS_PER_REQUEST")]
    pub max_paths_per_request: usize,

    /// Log writes instead of issuing them
    #[builder(default)]
    pub dry_run: bool,
}

impl ApplyParamsBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.max_paths_per_request {
            Some(0) => Err("max_paths_per_request must be at least 1".to_string()),
            _ => Ok(()),
        }
    }
}

impl Default for ApplyParams {
    fn default() -> Self {
        Self {
            max_paths_per_request: DEFAULT_MAX_PATHS_PER_REQUEST,
            dry_run: false,
        }
    }
}

/// How to reach and vet a device
#[derive(Builder, Clone, Debug)]
pub struct ConnectParams {
    /// gRPC target URI, e.g. `http://192.0.2.1:50051`
    #[builder(setter(into))]
    pub target: String,

    /// Bound on connection setup and on each RPC
    #[builder(default = "Duration::from_secs(30)")]
    pub timeout: Duration,

    #[builder(default, setter(into, strip_option))]
    pub username: Option<String>,

    #[builder(default, setter(into, strip_option))]
    pub password: Option<String>,

    /// Accept devices whatever model release they report
    #[builder(default)]
    pub skip_version_check: bool,

    #[builder(default = "RequiredModel::new(NXOS_DEVICE_MODEL, NXOS_DEVICE_MODEL_VERSION)")]
    pub required_model: RequiredModel,

    #[builder(default)]
    pub apply: ApplyParams,
}

impl ConnectParams {
    /// The model to check during negotiation, if any.
    #[must_use]
    pub fn required_model(&self) -> Option<&RequiredModel> {
        (!self.skip_version_check).then_some(&self.required_model)
    }
}
