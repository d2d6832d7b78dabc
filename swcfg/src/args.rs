// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use clap::Subcommand;
pub(crate) use clap::Parser;
use engine::{ApplyParamsBuilder, ConnectParams, ConnectParamsBuilder};
use std::time::Duration;

/// Environment variable read for the password when none is given on the command line
const PASSWORD_ENV: &str = "SWCFG_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "swcfg")]
#[command(version)]
#[command(about = "Configure NX-OS switches over gNMI", long_about = None)]
pub(crate) struct CmdArgs {
    #[arg(long, value_name = "gRPC target, e.g. http://192.0.2.1:50051")]
    target: String,
    #[arg(long, short)]
    username: Option<String>,
    #[arg(long, value_name = "password (or set SWCFG_PASSWORD)")]
    password: Option<String>,
    #[arg(long, value_name = "seconds", default_value_t = 30)]
    timeout: u64,
    #[arg(long, default_value_t = false)]
    skip_version_check: bool,
    #[arg(long, value_name = "max paths per Set request", default_value_t = 20)]
    max_paths_per_request: usize,
    #[arg(long, value_name = "tracing config, e.g. default=warn,engine=debug")]
    tracing: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Show the encodings and models the device supports
    Capabilities,
    /// Print the configuration at a path
    Get { path: String },
    /// Delete the configuration at a path
    Delete {
        path: String,
        /// Log the write instead of issuing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

impl CmdArgs {
    pub fn tracing(&self) -> Option<&str> {
        self.tracing.as_deref()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    fn dry_run(&self) -> bool {
        matches!(self.command, Command::Delete { dry_run: true, .. })
    }

    pub fn connect_params(&self) -> Result<ConnectParams, String> {
        let apply = ApplyParamsBuilder::default()
            .max_paths_per_request(self.max_paths_per_request)
            .dry_run(self.dry_run())
            .build()
            .map_err(|e| e.to_string())?;

        let mut builder = ConnectParamsBuilder::default();
        builder
            .target(self.target.clone())
            .timeout(Duration::from_secs(self.timeout))
            .skip_version_check(self.skip_version_check)
            .apply(apply);
        if let Some(username) = &self.username {
            builder.username(username.clone());
        }
        if let Some(password) = self
            .password
            .clone()
            .or_else(|| std::env::var(PASSWORD_ENV).ok())
        {
            builder.password(password);
        }
        builder.build().map_err(|e| e.to_string())
    }
}
