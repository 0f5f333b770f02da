// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Indoorsense — indoor geofencing bridge
//
// Desktop harness. Drives the plugin over the stub SDK from JSON fixtures and
// prints the payloads a mobile host would receive.

mod services;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use indoorsense_bridge::StubSdk;
use indoorsense_core::BridgeConfig;
use indoorsense_core::error::Result;
use indoorsense_core::types::Coordinate;

use services::data_dir;
use services::session::{self, Streams};

#[derive(Parser, Debug)]
#[command(name = "indoorsense", version, about = "Indoor geofencing bridge harness")]
struct Cli {
    /// Bridge config file (defaults to the data directory's config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch a building's geofences and test one point against them
    Check {
        /// Fixture of `{"<buildingId>": [geofence...]}`
        #[arg(long)]
        fixture: PathBuf,
        #[arg(long)]
        building: String,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Only consider geofences on this floor (or unscoped ones)
        #[arg(long)]
        floor: Option<String>,
    },
    /// Replay recorded transition callbacks and print the emitted events
    Replay {
        #[arg(long)]
        fixture: PathBuf,
        /// JSON array of `{"entered": [id...], "exited": [id...]}`
        #[arg(long)]
        transitions: PathBuf,
        /// Listen to enter transitions
        #[arg(long, default_value_t = false)]
        enter: bool,
        /// Listen to exit transitions
        #[arg(long, default_value_t = false)]
        exit: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(data_dir::config_path);
    let config = BridgeConfig::load_or_default(&config_path);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .init();

    tracing::info!(config = %config_path.display(), "Indoorsense starting");

    match run(cli.command, config).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                tracing::error!(error = %e, "failed to render output");
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            std::process::exit(1);
        }
    }
}

async fn run(command: Command, config: BridgeConfig) -> Result<Value> {
    match command {
        Command::Check {
            fixture,
            building,
            lat,
            lon,
            floor,
        } => {
            let sdk = Arc::new(StubSdk::from_fixture(&fixture)?);
            session::run_check(sdk, config, &building, Coordinate::new(lat, lon), floor.as_deref())
                .await
        }
        Command::Replay {
            fixture,
            transitions,
            enter,
            exit,
        } => {
            let sdk = Arc::new(StubSdk::from_fixture(&fixture)?);
            let steps = session::load_transitions(&transitions)?;
            let events = session::run_replay(sdk, config, &steps, Streams::from_flags(enter, exit))?;
            Ok(Value::Array(events))
        }
    }
}
