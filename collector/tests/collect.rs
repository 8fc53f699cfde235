// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! End-to-end collection cycles against a mock agent.

use topomon_collector as collector;

use collector::{NUM_DTOS, ProcessorConfigBuilder, TelemetryProcessor};
use datastore::TelemetryDb;
use std::sync::Arc;
use std::time::Duration;
use test_utils::agent::{FaultMode, agent_router, spawn_agent};
use test_utils::topology::{self, MASTER, WORKER1, WORKER2};
use tracing_test::traced_test;
use validator::Validator;

fn processor(db: &Arc<TelemetryDb>, port: u16, timeout: Duration) -> TelemetryProcessor {
    let config = ProcessorConfigBuilder::default()
        .agent_port(port)
        .http_timeout(timeout)
        .build()
        .expect("Should succeed");
    let validator = Validator::new(db.clone());
    TelemetryProcessor::new(db.clone(), validator, config).expect("Should succeed")
}

/// All agents in these tests live on localhost; nodes are created with the
/// loopback address as their management IP.
fn create_local_nodes(db: &TelemetryDb, names: &[&str]) {
    for (index, name) in names.iter().enumerate() {
        db.vpp
            .create_node(index as u32 + 1, name, &format!("192.168.16.{index}/24"), "127.0.0.1")
            .expect("Should succeed");
    }
}

fn count_findings(db: &TelemetryDb, key: &str, needle: &str) -> usize {
    db.report
        .entries_for(key)
        .iter()
        .filter(|finding| finding.contains(needle))
        .count()
}

#[tokio::test]
#[traced_test]
async fn collects_and_installs_all_five_documents() {
    let fixture = topology::master_fixture();
    let addr = spawn_agent(agent_router(fixture.clone(), FaultMode::None))
        .await
        .expect("Should succeed");

    let db = Arc::new(TelemetryDb::new());
    db.vpp
        .create_node(fixture.id, &fixture.name, &fixture.ip_addr, "127.0.0.1")
        .expect("Should succeed");

    let mut processor = processor(&db, addr.port(), Duration::from_secs(2));
    processor.run_cycle().await;
    assert!(!processor.validation_in_progress());

    let node = db.vpp.retrieve_node(MASTER).expect("Should succeed");
    assert_eq!(node.liveness, Some(fixture.liveness));
    assert_eq!(node.interfaces, Some(fixture.interfaces));
    assert_eq!(node.bridge_domains, Some(fixture.bridge_domains));
    assert_eq!(node.l2_fibs, Some(fixture.l2_fibs));
    assert_eq!(node.ip_arps, Some(fixture.ip_arps));

    // the loopback indexes follow the polled interface table
    assert_eq!(
        db.vpp
            .retrieve_node_by_loop_ip_addr("192.168.30.3")
            .expect("Should succeed")
            .name,
        MASTER
    );
    assert_eq!(
        db.vpp
            .retrieve_node_by_loop_mac_addr(topology::MASTER_BVI_MAC)
            .expect("Should succeed")
            .name,
        MASTER
    );

    // every fetch succeeded
    assert_eq!(count_findings(&db, MASTER, "GET "), 0);
    assert_eq!(count_findings(&db, MASTER, "no response"), 0);
}

#[tokio::test]
async fn http_errors_yield_one_finding_per_document() {
    let addr = spawn_agent(agent_router(topology::master_fixture(), FaultMode::NotFound))
        .await
        .expect("Should succeed");

    let db = Arc::new(TelemetryDb::new());
    create_local_nodes(&db, &[MASTER, WORKER1, WORKER2]);

    let mut processor = processor(&db, addr.port(), Duration::from_secs(2));
    processor.run_cycle().await;

    let mut total = 0;
    for node in [MASTER, WORKER1, WORKER2] {
        let count = count_findings(&db, node, "404 Not Found");
        assert_eq!(count, NUM_DTOS);
        total += count;
    }
    assert_eq!(total, NUM_DTOS * 3);
}

#[tokio::test]
async fn timeouts_yield_one_finding_per_document() {
    let addr = spawn_agent(agent_router(
        topology::master_fixture(),
        FaultMode::Delay(Duration::from_secs(3)),
    ))
    .await
    .expect("Should succeed");

    let db = Arc::new(TelemetryDb::new());
    create_local_nodes(&db, &[MASTER, WORKER1, WORKER2]);

    let mut processor = processor(&db, addr.port(), Duration::from_millis(50));
    processor.run_cycle().await;

    for node in [MASTER, WORKER1, WORKER2] {
        assert_eq!(count_findings(&db, node, "timed out"), NUM_DTOS);
    }
}

#[tokio::test]
async fn undecodable_bodies_are_reported() {
    let addr = spawn_agent(agent_router(
        topology::master_fixture(),
        FaultMode::MalformedBody,
    ))
    .await
    .expect("Should succeed");

    let db = Arc::new(TelemetryDb::new());
    create_local_nodes(&db, &[MASTER]);

    let mut processor = processor(&db, addr.port(), Duration::from_secs(2));
    processor.run_cycle().await;

    assert_eq!(count_findings(&db, MASTER, "undecodable"), NUM_DTOS);
}

#[tokio::test]
async fn unreachable_agents_are_transport_findings() {
    // bind and drop a listener to get a port nobody is serving on
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Should succeed");
        listener.local_addr().expect("Should succeed").port()
    };

    let db = Arc::new(TelemetryDb::new());
    create_local_nodes(&db, &[MASTER]);

    let mut processor = processor(&db, port, Duration::from_secs(1));
    processor.run_cycle().await;

    assert_eq!(count_findings(&db, MASTER, "failed"), NUM_DTOS);
}
