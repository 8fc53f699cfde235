// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Periodic collection of the per-node agent telemetry.
//!
//! On every tick the processor fans out one HTTP fetch per (node, document)
//! pair, gathers the typed results on a single channel until the batch is
//! complete or the cycle deadline fires, installs the batch into the
//! telemetry store, and runs the topology validator on the result.

#![deny(clippy::all)]

mod dto;
mod errors;
mod http;
mod processor;

// re-exports
pub use dto::{NUM_DTOS, TelemetryKind, TelemetryPayload, TelemetryResult};
pub use errors::CollectError;
pub use http::AgentClient;
pub use processor::{
    DEFAULT_AGENT_PORT, DEFAULT_HTTP_TIMEOUT, DEFAULT_POLL_INTERVAL, ProcessorConfig,
    ProcessorConfigBuilder, ProcessorConfigBuilderError, TelemetryProcessor,
};
