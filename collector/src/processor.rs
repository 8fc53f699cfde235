// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! The cycle state machine: fan out, gather, install, validate.
//!
//! One cycle walks `Idle -> Collecting -> Validating -> Idle`. The gather
//! gate is the simplest correct one: the batch is complete when
//! `NUM_DTOS * |nodes|` results arrived, or when the cycle deadline fires,
//! whichever comes first. Fetches that outlive the deadline still complete;
//! their results carry an old cycle number and are dropped on the next
//! cycle.

use crate::dto::{NUM_DTOS, TelemetryKind, TelemetryPayload, TelemetryResult};
use crate::http::AgentClient;
use datastore::TelemetryDb;
use derive_builder::Builder;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, sleep_until};
use tracing::{debug, info, warn};
use validator::Validator;

/// Default TCP port the node agents listen on.
pub const DEFAULT_AGENT_PORT: u16 = 9999;
/// Default per-request HTTP deadline.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Default pause between collection cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Grace added to the HTTP deadline before the cycle gives up on the
/// batch, so that fetch tasks that timed out right at the deadline can
/// still deliver their error results.
const CYCLE_DEADLINE_GRACE: Duration = Duration::from_millis(500);

const RESPONSE_CHANNEL_SIZE: usize = 256;

/// Tunables of the collection pipeline.
#[derive(Builder, Clone, Debug)]
pub struct ProcessorConfig {
    /// TCP port the node agents listen on.
    #[builder(default = DEFAULT_AGENT_PORT)]
    pub agent_port: u16,
    /// Independent deadline of every document fetch.
    #[builder(default = DEFAULT_HTTP_TIMEOUT)]
    pub http_timeout: Duration,
    /// Pause between cycle starts. Ticks landing in a running cycle are
    /// dropped, not queued.
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            agent_port: DEFAULT_AGENT_PORT,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// The controller of the collection pipeline. Owns the response channel,
/// the cycle counter and the validator; everything mutable happens on the
/// task driving [`TelemetryProcessor::run`].
pub struct TelemetryProcessor {
    db: Arc<TelemetryDb>,
    validator: Validator,
    client: AgentClient,
    config: ProcessorConfig,
    tx: mpsc::Sender<TelemetryResult>,
    rx: mpsc::Receiver<TelemetryResult>,
    cycle: u64,
    validation_in_progress: Arc<AtomicBool>,
}

impl TelemetryProcessor {
    /// Build a processor over the shared db.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(
        db: Arc<TelemetryDb>,
        validator: Validator,
        config: ProcessorConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = AgentClient::new(config.agent_port, config.http_timeout)?;
        let (tx, rx) = mpsc::channel(RESPONSE_CHANNEL_SIZE);
        Ok(TelemetryProcessor {
            db,
            validator,
            client,
            config,
            tx,
            rx,
            cycle: 0,
            validation_in_progress: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The sender side of the response channel. Fetch tasks hold clones of
    /// this; tests may use it to inject results.
    #[must_use]
    pub fn sender(&self) -> mpsc::Sender<TelemetryResult> {
        self.tx.clone()
    }

    /// Whether a cycle is currently between fan-out and end of validation.
    #[must_use]
    pub fn validation_in_progress(&self) -> bool {
        self.validation_in_progress.load(Ordering::Acquire)
    }

    /// Run cycles forever at the configured interval.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if self.validation_in_progress() {
                debug!("Dropping tick: previous cycle still validating");
                continue;
            }
            self.run_cycle().await;
        }
    }

    /// Execute one full collection + validation cycle.
    pub async fn run_cycle(&mut self) {
        self.cycle += 1;
        self.validation_in_progress.store(true, Ordering::Release);
        self.db.report.clear();

        // results a previous cycle left behind are dropped here
        while let Ok(stale) = self.rx.try_recv() {
            debug!(
                "Dropping result from cycle {} ({}/{})",
                stale.cycle, stale.node, stale.kind
            );
        }

        let nodes: Vec<(String, String)> = self
            .db
            .vpp
            .retrieve_all_nodes()
            .into_iter()
            .map(|node| (node.name, node.man_ip_addr))
            .collect();
        let expected = NUM_DTOS * nodes.len();
        info!(
            "Cycle {}: polling {} node(s), expecting {expected} document(s)",
            self.cycle,
            nodes.len()
        );

        let mut pending: HashSet<(String, TelemetryKind)> = HashSet::new();
        for (name, man_ip) in &nodes {
            for kind in TelemetryKind::ALL {
                pending.insert((name.clone(), kind));
                let client = self.client.clone();
                let tx = self.tx.clone();
                let cycle = self.cycle;
                let node = name.clone();
                let man_ip = man_ip.clone();
                tokio::spawn(async move {
                    let payload = client.fetch(&man_ip, kind).await;
                    let result = TelemetryResult {
                        cycle,
                        node,
                        kind,
                        payload,
                    };
                    // the processor dropping the receiver is a shutdown
                    let _ = tx.send(result).await;
                });
            }
        }

        let deadline = Instant::now() + self.config.http_timeout + CYCLE_DEADLINE_GRACE;
        self.gather(expected, deadline, &mut pending).await;

        // whatever is still pending got no response at all this cycle
        let mut missing: Vec<(String, TelemetryKind)> = pending.drain().collect();
        missing.sort();
        for (node, kind) in missing {
            self.db
                .report
                .append(&node, format!("no response from node '{node}' for {kind}"));
        }

        debug!("Cycle {}: validating", self.cycle);
        self.validator.validate();
        self.validation_in_progress.store(false, Ordering::Release);
        info!(
            "Cycle {} done: {} finding(s) in the report",
            self.cycle,
            self.db.report.len()
        );
    }

    /// Consume results until the batch is complete or `deadline` fires.
    async fn gather(
        &mut self,
        expected: usize,
        deadline: Instant,
        pending: &mut HashSet<(String, TelemetryKind)>,
    ) {
        let mut received = 0usize;
        while received < expected {
            let result = tokio::select! {
                () = sleep_until(deadline) => {
                    warn!(
                        "Cycle {}: deadline reached with {received}/{expected} result(s)",
                        self.cycle
                    );
                    return;
                }
                result = self.rx.recv() => match result {
                    Some(result) => result,
                    None => return,
                },
            };
            if result.cycle != self.cycle {
                debug!(
                    "Dropping result from cycle {} ({}/{})",
                    result.cycle, result.node, result.kind
                );
                continue;
            }
            pending.remove(&(result.node.clone(), result.kind));
            received += 1;
            self.install(result);
        }
    }

    /// Route one result to the matching store setter; failures of any kind
    /// become findings keyed by the node.
    fn install(&self, result: TelemetryResult) {
        let node = result.node;
        match result.payload {
            Ok(payload) => {
                let outcome = match payload {
                    TelemetryPayload::Liveness(liveness) => {
                        self.db.vpp.set_node_liveness(&node, liveness)
                    }
                    TelemetryPayload::Interfaces(interfaces) => {
                        match self.db.vpp.set_node_interfaces(&node, interfaces) {
                            Ok(collisions) => {
                                for collision in collisions {
                                    self.db.report.append(&node, collision.to_string());
                                }
                                Ok(())
                            }
                            Err(error) => Err(error),
                        }
                    }
                    TelemetryPayload::BridgeDomains(bridge_domains) => {
                        self.db.vpp.set_node_bridge_domains(&node, bridge_domains)
                    }
                    TelemetryPayload::L2Fibs(fibs) => self.db.vpp.set_node_l2fibs(&node, fibs),
                    TelemetryPayload::IpArps(arps) => self.db.vpp.set_node_ip_arps(&node, arps),
                };
                if let Err(error) = outcome {
                    self.db.report.append(&node, error.to_string());
                }
            }
            Err(error) => {
                self.db.report.append(&node, error.to_string());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use telemetry::NodeLiveness;

    fn processor() -> TelemetryProcessor {
        let db = Arc::new(TelemetryDb::new());
        let validator = Validator::new(db.clone());
        let config = ProcessorConfigBuilder::default()
            .http_timeout(Duration::from_millis(50))
            .build()
            .expect("Should succeed");
        TelemetryProcessor::new(db, validator, config).expect("Should succeed")
    }

    fn liveness_result(cycle: u64, node: &str) -> TelemetryResult {
        TelemetryResult {
            cycle,
            node: node.to_string(),
            kind: TelemetryKind::Liveness,
            payload: Ok(TelemetryPayload::Liveness(NodeLiveness::default())),
        }
    }

    #[tokio::test]
    async fn gather_records_missing_results_on_deadline() {
        let mut processor = processor();
        processor.db.vpp.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        processor.cycle = 1;

        let mut pending: HashSet<(String, TelemetryKind)> = TelemetryKind::ALL
            .iter()
            .map(|kind| ("k8s-master".to_string(), *kind))
            .collect();

        // deliver only one of the five documents
        let tx = processor.sender();
        tx.send(liveness_result(1, "k8s-master")).await.expect("Should succeed");

        let deadline = Instant::now() + Duration::from_millis(50);
        processor.gather(NUM_DTOS, deadline, &mut pending).await;

        assert_eq!(pending.len(), NUM_DTOS - 1);
        assert!(!pending.contains(&("k8s-master".to_string(), TelemetryKind::Liveness)));
        let node = processor.db.vpp.retrieve_node("k8s-master").expect("Should succeed");
        assert!(node.liveness.is_some());
    }

    #[tokio::test]
    async fn gather_drops_results_from_older_cycles() {
        let mut processor = processor();
        processor.db.vpp.create_node(1, "k8s-master", "10", "10").expect("Should succeed");
        processor.cycle = 3;

        let mut pending = HashSet::new();
        pending.insert(("k8s-master".to_string(), TelemetryKind::Liveness));

        let tx = processor.sender();
        tx.send(liveness_result(2, "k8s-master")).await.expect("Should succeed");

        let deadline = Instant::now() + Duration::from_millis(50);
        processor.gather(1, deadline, &mut pending).await;

        // the stale result neither counted nor installed
        assert_eq!(pending.len(), 1);
        let node = processor.db.vpp.retrieve_node("k8s-master").expect("Should succeed");
        assert!(node.liveness.is_none());
    }

    #[tokio::test]
    async fn install_converts_store_misses_to_findings() {
        let processor = processor();
        processor.install(liveness_result(1, "unknown-node"));
        let findings = processor.db.report.entries_for("unknown-node");
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains("No node named 'unknown-node'"));
    }
}
