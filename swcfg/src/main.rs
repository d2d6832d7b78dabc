// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

#![deny(clippy::all, clippy::pedantic)]

mod args;

use crate::args::{CmdArgs, Command, Parser};

use engine::{Client, SyncError};
use gnmi::Path;
use std::process::ExitCode;
use tracectl::{custom_target, get_trace_ctl, trace_target};
use tracing::{error, info, level_filters::LevelFilter};

trace_target!("swcfg", LevelFilter::INFO, &[]);
fn init_logging() {
    let tctl = get_trace_ctl();
    tctl.set_default_level(LevelFilter::WARN);
    custom_target!("tonic", LevelFilter::ERROR, &[]);
    custom_target!("h2", LevelFilter::ERROR, &[]);
}

async fn run(args: &CmdArgs) -> Result<(), SyncError> {
    let params = args.connect_params().map_err(SyncError::Params)?;
    let client = Client::connect(&params).await?;

    match args.command() {
        Command::Capabilities => {
            let caps = client.capabilities();
            println!("gNMI version: {}", caps.gnmi_version());
            println!("negotiated encoding: {}", client.encoding());
            let encodings: Vec<String> = caps.encodings().map(|e| format!("{e:?}")).collect();
            println!("encodings: {}", encodings.join(", "));
            println!("models:");
            for model in caps.models() {
                println!("  {} {} ({})", model.name, model.version, model.organization);
            }
        }
        Command::Get { path } => {
            let path = Path::parse(path)?;
            match client.get_json(&path).await {
                Ok(json) => match serde_json::from_slice::<serde_json::Value>(&json) {
                    Ok(value) => println!("{value:#}"),
                    Err(_) => println!("{}", String::from_utf8_lossy(&json)),
                },
                Err(SyncError::ValueNil { .. }) => println!("nothing configured at {path}"),
                Err(e) => return Err(e),
            }
        }
        Command::Delete { path, .. } => {
            let path = Path::parse(path)?;
            client.delete_subtree(&path).await?;
            info!("Deleted {path}");
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    /* parse cmd line args */
    let args = CmdArgs::parse();

    /* initialize logging */
    init_logging();
    if let Some(tracing) = args.tracing()
        && let Err(e) = get_trace_ctl().setup_from_string(tracing)
    {
        error!("Invalid tracing configuration: {e}");
        return ExitCode::FAILURE;
    }
    get_trace_ctl().dump();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
