// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The HTTP client side of the collector: one shared client, one typed GET
//! per (node, document) pair.

use crate::dto::{TelemetryKind, TelemetryPayload};
use crate::errors::CollectError;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::trace;

/// Client for the per-node telemetry agents. Cloning is cheap; all clones
/// share one connection pool and deadline.
#[derive(Clone, Debug)]
pub struct AgentClient {
    http: reqwest::Client,
    port: u16,
}

impl AgentClient {
    /// Build a client for agents listening on `port`, with an independent
    /// deadline of `timeout` per request.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed.
    pub fn new(port: u16, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(AgentClient { http, port })
    }

    fn url(&self, man_ip: &str, kind: TelemetryKind) -> String {
        format!("http://{man_ip}:{}{}", self.port, kind.path())
    }

    /// Fetch and decode one document from the agent at `man_ip`.
    ///
    /// # Errors
    ///
    /// Fails with the matching [`CollectError`] on a non-2xx response, a
    /// timeout, or an undecodable body.
    pub async fn fetch(
        &self,
        man_ip: &str,
        kind: TelemetryKind,
    ) -> Result<TelemetryPayload, CollectError> {
        let url = self.url(man_ip, kind);
        trace!("GET {url}");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|error| CollectError::from_reqwest(&url, error))?;

        let payload = match kind {
            TelemetryKind::Liveness => TelemetryPayload::Liveness(decode(&url, response).await?),
            TelemetryKind::Interfaces => {
                TelemetryPayload::Interfaces(decode(&url, response).await?)
            }
            TelemetryKind::BridgeDomains => {
                TelemetryPayload::BridgeDomains(decode(&url, response).await?)
            }
            TelemetryKind::L2Fibs => TelemetryPayload::L2Fibs(decode(&url, response).await?),
            TelemetryKind::IpArps => TelemetryPayload::IpArps(decode(&url, response).await?),
        };
        Ok(payload)
    }
}

async fn decode<T: DeserializeOwned>(
    url: &str,
    response: reqwest::Response,
) -> Result<T, CollectError> {
    response
        .json::<T>()
        .await
        .map_err(|error| CollectError::from_reqwest(url, error))
}
