// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

use clap::Parser;
use collector::{ProcessorConfig, ProcessorConfigBuilder, ProcessorConfigBuilderError};
use std::time::Duration;
use telemetry::DEFAULT_LOOPBACK_PATTERN;

#[derive(Debug, Parser)]
#[command(name = "topomon")]
#[command(version)]
#[command(about = "Cluster telemetry collector and topology validator", long_about = None)]
pub struct CmdArgs {
    /// TCP port the per-node telemetry agents listen on
    #[arg(long, value_name = "port", default_value_t = collector::DEFAULT_AGENT_PORT)]
    pub agent_port: u16,

    /// Deadline of each document fetch, in seconds
    #[arg(long, value_name = "seconds", default_value_t = 10)]
    pub http_timeout: u64,

    /// Pause between collection cycles, in seconds
    #[arg(long, value_name = "seconds", default_value_t = 30)]
    pub poll_interval: u64,

    /// Internal-name prefix identifying the BVI loopback interface
    #[arg(long, value_name = "prefix", default_value = DEFAULT_LOOPBACK_PATTERN)]
    pub loopback_pattern: String,
}

impl CmdArgs {
    pub fn processor_config(&self) -> Result<ProcessorConfig, ProcessorConfigBuilderError> {
        ProcessorConfigBuilder::default()
            .agent_port(self.agent_port)
            .http_timeout(Duration::from_secs(self.http_timeout))
            .poll_interval(Duration::from_secs(self.poll_interval))
            .build()
    }
}
