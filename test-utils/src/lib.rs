// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Testing utilities for the telemetry pipeline: a defect-free 3-node
//! reference topology and a mock agent serving the five telemetry
//! endpoints with optional fault injection.

pub mod agent;
pub mod topology;
