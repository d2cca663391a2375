// http server mode - agent card discovery plus a run endpoint

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::agent::Response;
use crate::card::{AGENT_CARD_PATH, ENTRYPOINT_PLANT_DATA, ENTRYPOINT_PLANT_INFO};
use crate::{Agent, AgentCard, Error, SpeciesQuery};

struct AppState {
    card: AgentCard,
    agent: Agent,
}

#[derive(Deserialize)]
struct RunRequest {
    #[serde(default)]
    request: String,
    #[serde(default)]
    entrypoint: Option<String>,
    #[serde(default)]
    params: Option<SpeciesParams>,
}

#[derive(Deserialize)]
struct SpeciesParams {
    genus: String,
    species: String,
}

#[derive(Serialize)]
struct RunResponse {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<Response>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct Server;

impl Server {
    pub fn router(agent: Agent, card: AgentCard) -> Router {
        let state = Arc::new(AppState { card, agent });

        Router::new()
            .route(AGENT_CARD_PATH, get(agent_card))
            .route("/health", get(health))
            .route("/run", post(run))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn run(agent: Agent, host: &str, port: u16, public_url: Option<String>) -> Result<(), Error> {
        let url = public_url.unwrap_or_else(|| format!("http://localhost:{port}"));
        let app = Self::router(agent, AgentCard::new(url));

        let addr = format!("{host}:{port}");
        info!("server running at http://{addr}");

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        Ok(())
    }
}

async fn agent_card(State(state): State<Arc<AppState>>) -> Json<AgentCard> {
    Json(state.card.clone())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> (StatusCode, Json<RunResponse>) {
    let entrypoint = req.entrypoint.as_deref().unwrap_or(ENTRYPOINT_PLANT_INFO);

    if state.card.entrypoint(entrypoint).is_none() {
        return bad_request(format!("unknown entrypoint: {entrypoint}"));
    }

    // structured params skip the model entirely
    let params = match req.params {
        Some(p) => match SpeciesQuery::new(&p.genus, &p.species) {
            Ok(q) => Some(q),
            Err(e) => return bad_request(e.to_string()),
        },
        None if entrypoint == ENTRYPOINT_PLANT_DATA => {
            return bad_request(format!("{ENTRYPOINT_PLANT_DATA} needs genus and species params"));
        }
        None => None,
    };

    if params.is_none() && req.request.trim().is_empty() {
        return bad_request("request must not be empty".to_string());
    }

    let messages = state.agent.run(&req.request, params).await;
    (
        StatusCode::OK,
        Json(RunResponse {
            messages,
            error: None,
        }),
    )
}

fn bad_request(error: String) -> (StatusCode, Json<RunResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(RunResponse {
            messages: Vec::new(),
            error: Some(error),
        }),
    )
}
