// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Entry point: wire the shared db, the validator and the collection
//! processor together and run cycles until interrupted. Node and pod
//! records arrive through the db from the Kubernetes watcher glue.

use collector::TelemetryProcessor;
use datastore::TelemetryDb;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validator;

mod args;

use args::CmdArgs;
use clap::Parser;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() {
    let args = CmdArgs::parse();
    init_tracing();

    let config = match args.processor_config() {
        Ok(config) => config,
        Err(err) => {
            error!("Bad configuration: {err}");
            std::process::exit(1);
        }
    };

    let db = Arc::new(TelemetryDb::with_loopback_pattern(&args.loopback_pattern));
    let validator = Validator::with_loopback_pattern(db.clone(), &args.loopback_pattern);
    let processor = match TelemetryProcessor::new(db, validator, config) {
        Ok(processor) => processor,
        Err(err) => {
            error!("Failed to build the HTTP client: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "Polling agents on port {} every {}s (timeout {}s)",
        args.agent_port, args.poll_interval, args.http_timeout
    );
    tokio::select! {
        () = processor.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Shutting down");
        }
    }
}
