//! Axum router and HTTP handlers.
//!
//! Wire-compatible endpoints:
//! - `GET|POST /mine_block` — field `transactions` (comma-separated
//!   descriptors), optional `miner`; replies `-1`
//! - `GET|POST /count_cycles` — fields `fromBlock`, `toBlock`,
//!   `maxCycleLength`; replies `NumberOfCycles: <n>`
//!
//! GET reads fields from the query string. POST reads them from a urlencoded
//! form body and the query string; a field present in both takes the body's
//! value. JSON endpoints live under `/api`.

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use loopflow_core::constants::{CYCLE_COUNT_PREFIX, MINE_BLOCK_ACK};
use loopflow_core::error::LoopflowError;
use loopflow_core::ingest::{split_descriptors, IngestReport};
use loopflow_core::types::BlockKey;

use crate::ledger::Ledger;
use crate::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/mine_block", get(mine_block_query).post(mine_block_form))
        .route("/count_cycles", get(count_cycles_query).post(count_cycles_form))
        .route("/api/status", get(api_status))
        .route("/api/blocks", post(api_mine_block))
        .route("/api/blocks/:key", get(api_block))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Failure of a gateway call, rendered as plain text like the legacy endpoints.
struct GatewayError(StatusCode, String);

impl From<LoopflowError> for GatewayError {
    fn from(e: LoopflowError) -> Self {
        match e {
            LoopflowError::Query(q) => GatewayError(StatusCode::BAD_REQUEST, q.to_string()),
            other => {
                error!(error = %other, "ledger failure");
                GatewayError(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        }
    }
}

impl From<tokio::task::JoinError> for GatewayError {
    fn from(e: tokio::task::JoinError) -> Self {
        error!(error = %e, "blocking task failed");
        GatewayError(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ---------------------------------------------------------------------------
// Legacy endpoints
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
struct MineBlockParams {
    transactions: Option<String>,
    miner: Option<String>,
}

impl MineBlockParams {
    fn or(self, fallback: Self) -> Self {
        Self {
            transactions: self.transactions.or(fallback.transactions),
            miner: self.miner.or(fallback.miner),
        }
    }
}

#[derive(Deserialize, Default)]
struct CountCyclesParams {
    #[serde(rename = "fromBlock")]
    from_block: Option<String>,
    #[serde(rename = "toBlock")]
    to_block: Option<String>,
    #[serde(rename = "maxCycleLength")]
    max_cycle_length: Option<String>,
}

impl CountCyclesParams {
    fn or(self, fallback: Self) -> Self {
        Self {
            from_block: self.from_block.or(fallback.from_block),
            to_block: self.to_block.or(fallback.to_block),
            max_cycle_length: self.max_cycle_length.or(fallback.max_cycle_length),
        }
    }
}

async fn mine_block_query(
    State(state): State<AppState>,
    Query(params): Query<MineBlockParams>,
) -> Result<&'static str, GatewayError> {
    mine_block(state.ledger, params).await
}

async fn mine_block_form(
    State(state): State<AppState>,
    Query(query): Query<MineBlockParams>,
    form: Option<Form<MineBlockParams>>,
) -> Result<&'static str, GatewayError> {
    let params = form.map(|Form(body)| body).unwrap_or_default().or(query);
    mine_block(state.ledger, params).await
}

/// `/mine_block` — ingest one batch. The body carries no status.
async fn mine_block(ledger: Ledger, params: MineBlockParams) -> Result<&'static str, GatewayError> {
    ingest(ledger, params.transactions.unwrap_or_default(), params.miner).await?;
    Ok(MINE_BLOCK_ACK)
}

async fn count_cycles_query(
    State(state): State<AppState>,
    Query(params): Query<CountCyclesParams>,
) -> Result<String, GatewayError> {
    count_cycles(state.ledger, params).await
}

async fn count_cycles_form(
    State(state): State<AppState>,
    Query(query): Query<CountCyclesParams>,
    form: Option<Form<CountCyclesParams>>,
) -> Result<String, GatewayError> {
    let params = form.map(|Form(body)| body).unwrap_or_default().or(query);
    count_cycles(state.ledger, params).await
}

/// `/count_cycles` — validate all three integers, then search on the blocking pool.
async fn count_cycles(ledger: Ledger, params: CountCyclesParams) -> Result<String, GatewayError> {
    let count = tokio::task::spawn_blocking(move || {
        ledger.count_cycles_from_params(
            params.from_block.as_deref(),
            params.to_block.as_deref(),
            params.max_cycle_length.as_deref(),
        )
    })
    .await??;
    Ok(format!("{CYCLE_COUNT_PREFIX}{count}"))
}

async fn ingest(ledger: Ledger, transactions: String, miner: Option<String>) -> Result<IngestReport, GatewayError> {
    let report = tokio::task::spawn_blocking(move || {
        let descriptors = split_descriptors(&transactions);
        ledger.mine_block(&descriptors, miner.as_deref())
    })
    .await??;
    info!(
        block = %report.block,
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "block ingested over http"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// JSON API
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct MineBlockRequest {
    transactions: Vec<String>,
    miner: Option<String>,
}

/// `GET /api/status` — ledger counters and the gateway address.
async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.ledger.status();
    Json(json!({
        "blocks": status.blocks,
        "vertices": status.vertices,
        "transfers": status.transfers,
        "coinbase_address": status.coinbase_address,
        "http_addr": state.config.http_addr(),
    }))
}

/// `POST /api/blocks` — ingest a batch and return the full report.
async fn api_mine_block(
    State(state): State<AppState>,
    Json(req): Json<MineBlockRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let ledger = state.ledger;
    let report = tokio::task::spawn_blocking(move || ledger.mine_block(&req.transactions, req.miner.as_deref()))
        .await??;

    let accepted: Vec<String> = report.accepted.iter().map(ToString::to_string).collect();
    let rejected: Vec<serde_json::Value> = report
        .rejected
        .iter()
        .map(|r| {
            json!({
                "index": r.index,
                "descriptor": r.descriptor,
                "reason": r.reason.to_string(),
            })
        })
        .collect();

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "block": report.block,
            "accepted": accepted,
            "rejected": rejected,
        })),
    ))
}

/// `GET /api/blocks/:key` — one block with its outputs.
async fn api_block(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let Ok(key) = key.parse::<u64>() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid block key: {key}")})),
        )
            .into_response();
    };
    match state.ledger.block(BlockKey(key)) {
        Some(block) => {
            let outputs: Vec<serde_json::Value> = block
                .vertices
                .iter()
                .map(|v| json!({"id": v.id.to_string(), "address": v.address}))
                .collect();
            Json(json!({"key": block.key, "outputs": outputs})).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("block not found: {key}")})),
        )
            .into_response(),
    }
}
