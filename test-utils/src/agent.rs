// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! A mock telemetry agent: an axum router serving the five documents of a
//! [`NodeFixture`](crate::topology::NodeFixture), with optional fault
//! injection for the error-path tests.

use crate::topology::NodeFixture;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::error;

/// How the mock agent should misbehave, if at all.
#[derive(Clone, Debug, Default)]
pub enum FaultMode {
    /// Serve the fixture documents normally.
    #[default]
    None,
    /// Answer 404 on every endpoint.
    NotFound,
    /// Sleep before answering; combined with a short client timeout this
    /// forces the timeout path.
    Delay(Duration),
    /// Answer 200 with a body that is not the expected document.
    MalformedBody,
}

#[derive(Clone)]
struct AgentState {
    fixture: Arc<NodeFixture>,
    fault: FaultMode,
}

async fn respond<T: Serialize>(state: &AgentState, document: &T) -> Response {
    match &state.fault {
        FaultMode::NotFound => {
            (StatusCode::NOT_FOUND, "page not found - invalid path").into_response()
        }
        FaultMode::MalformedBody => "this is not the document you expected".into_response(),
        FaultMode::Delay(delay) => {
            tokio::time::sleep(*delay).await;
            Json(document).into_response()
        }
        FaultMode::None => Json(document).into_response(),
    }
}

async fn liveness(State(state): State<AgentState>) -> Response {
    respond(&state, &state.fixture.liveness).await
}

async fn interfaces(State(state): State<AgentState>) -> Response {
    respond(&state, &state.fixture.interfaces).await
}

async fn bridge_domains(State(state): State<AgentState>) -> Response {
    respond(&state, &state.fixture.bridge_domains).await
}

async fn l2_fibs(State(state): State<AgentState>) -> Response {
    respond(&state, &state.fixture.l2_fibs).await
}

async fn arps(State(state): State<AgentState>) -> Response {
    respond(&state, &state.fixture.ip_arps).await
}

/// Build a router serving the telemetry documents of `fixture`.
#[must_use]
pub fn agent_router(fixture: NodeFixture, fault: FaultMode) -> Router {
    let state = AgentState {
        fixture: Arc::new(fixture),
        fault,
    };
    Router::new()
        .route("/liveness", get(liveness))
        .route("/interfaces", get(interfaces))
        .route("/bridgedomains", get(bridge_domains))
        .route("/l2fibs", get(l2_fibs))
        .route("/arps", get(arps))
        .with_state(state)
}

/// Serve `router` on an ephemeral localhost port and return the bound
/// address. The server task runs until the test process exits.
///
/// # Errors
///
/// Fails if the listener cannot be bound.
pub async fn spawn_agent(router: Router) -> std::io::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!("mock agent terminated: {err}");
        }
    });
    Ok(addr)
}
