// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Fetch failure taxonomy. The `Display` text of these errors is what ends
//! up in the report, keyed by the node that failed.

use reqwest::StatusCode;
use thiserror::Error;

/// Why a single document fetch failed. Failures are reported, never
/// retried within a cycle.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum CollectError {
    /// The fetch exceeded the HTTP client deadline.
    #[error("GET {url} timed out")]
    Timeout { url: String },

    /// The agent answered with a non-2xx status.
    #[error("GET {url} failed: {status}")]
    Http { url: String, status: StatusCode },

    /// The body did not decode into the expected document.
    #[error("GET {url} returned an undecodable body: {message}")]
    Decode { url: String, message: String },

    /// Connection-level failure (refused, reset, DNS, ...).
    #[error("GET {url} failed: {message}")]
    Transport { url: String, message: String },
}

impl CollectError {
    pub(crate) fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            CollectError::Timeout { url }
        } else if let Some(status) = error.status() {
            CollectError::Http { url, status }
        } else if error.is_decode() {
            CollectError::Decode {
                url,
                message: error.to_string(),
            }
        } else {
            CollectError::Transport {
                url,
                message: error.to_string(),
            }
        }
    }
}
