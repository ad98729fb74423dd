//! HTTP API for Ballotchain
//!
//! Thin mapping from requests onto the ledger. Mutating routes take the
//! ledger's write lock for the whole validate, mutate, persist sequence;
//! read routes take the read lock, so they never see a half-applied change.

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{self, header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::Blockchain;
use crate::error::LedgerError;
use crate::persistence::write_json_atomic;

/// Shared server state.
#[derive(Clone)]
pub struct Node {
    pub blockchain: Arc<RwLock<Blockchain>>,
    export_path: PathBuf,
    cors: bool,
}

impl Node {
    pub fn new(blockchain: Blockchain, export_path: impl Into<PathBuf>) -> Self {
        Self::new_shared(Arc::new(RwLock::new(blockchain)), export_path)
    }

    /// Serve a ledger that is also held elsewhere in the process.
    pub fn new_shared(blockchain: Arc<RwLock<Blockchain>>, export_path: impl Into<PathBuf>) -> Self {
        Self {
            blockchain,
            export_path: export_path.into(),
            cors: true,
        }
    }

    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }
}

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    Ledger(LedgerError),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Ledger(e) if e.is_rejection() => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Ledger(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(MessageResponse { message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
struct MessageResponse {
    message: String,
}

/// What a `POST /mine` body asks for.
#[derive(Debug, PartialEq)]
enum MineTarget {
    All,
    Barangay(String),
}

/// Read the `POST /vote` body. It must be a JSON object; the fields are
/// handed to the ledger as raw values so that a malformed ballot is
/// reported by the ledger's own validation order.
fn parse_vote_body(body: &[u8]) -> Result<Map<String, Value>, LedgerError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        _ => Err(LedgerError::InvalidPayload),
    }
}

/// An empty or unparsable body, or a missing, null or empty `barangay`,
/// means every barangay. Any other scalar names one barangay.
fn parse_mine_body(body: &[u8]) -> Result<MineTarget, LedgerError> {
    let fields = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return Err(LedgerError::InvalidPayload),
        Err(_) => return Ok(MineTarget::All),
    };

    match fields.get("barangay") {
        None | Some(Value::Null) => Ok(MineTarget::All),
        Some(Value::String(s)) if s.is_empty() => Ok(MineTarget::All),
        Some(v @ (Value::String(_) | Value::Number(_) | Value::Bool(_))) => {
            Ok(MineTarget::Barangay(scalar_to_string(v)))
        }
        Some(_) => Err(LedgerError::InvalidPayload),
    }
}

/// Scalars become text; missing values and containers become empty and fail
/// the payload check.
fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Logs method, path, status and duration of every request.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the API router with all endpoints
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors_enabled = node.cors;

    let router = Router::new()
        // Ballot endpoints
        .route("/candidates", get(get_candidates))
        .route("/vote", post(submit_vote))
        // Mining endpoints
        .route("/mine", post(mine))
        // Ledger views
        .route("/chain_masked", get(get_chain_masked))
        .route("/pending", get(get_pending))
        .route("/visualizer_data", get(get_visualizer_data))
        .route("/export_all", get(export_all))
        .route("/verify", get(verify_chain))
        // Results endpoints
        .route("/results", get(get_results))
        .route("/results_by_barangay", get(get_results_by_barangay))
        // System endpoints
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(vec![http::Method::GET, http::Method::POST, http::Method::OPTIONS])
            .allow_headers(vec![header::CONTENT_TYPE]);
        router.layer(cors)
    } else {
        router
    }
}

/// Bind `addr` and serve until the process is stopped.
pub async fn run_api_server(node: Arc<Node>, addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(%addr, "ballot API listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Run a ledger mutation under the write lock on the blocking pool, since
/// committing it writes the snapshot file synchronously.
async fn with_ledger_mut<T, F>(node: &Node, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Blockchain) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let blockchain = Arc::clone(&node.blockchain);
    let outcome = tokio::task::spawn_blocking(move || {
        let mut guard = blockchain.blocking_write();
        op(&mut *guard)
    })
    .await
    .map_err(|e| ApiError::InternalError(format!("Ledger task failed: {}", e)))?;

    outcome.map_err(ApiError::from)
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn health_check(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    Json(json!({
        "status": "healthy",
        "blocks": blockchain.blocks.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_candidates(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    Json(blockchain.roster.clone())
}

async fn submit_vote(State(node): State<Arc<Node>>, body: Bytes) -> Result<Response, ApiError> {
    // Body is read as JSON regardless of the declared content type.
    let fields = parse_vote_body(&body)?;
    let field = |name: &str| fields.get(name).cloned().unwrap_or(Value::Null);
    let voter_id = scalar_to_string(&field("voter_id"));
    let barangay = scalar_to_string(&field("barangay"));
    let candidates = field("candidates");

    let message = with_ledger_mut(&node, move |blockchain| {
        blockchain.submit_vote(&voter_id, &candidates, &barangay)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse { message })).into_response())
}

async fn mine(State(node): State<Arc<Node>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    match parse_mine_body(&body)? {
        MineTarget::Barangay(barangay) => {
            let block = with_ledger_mut(&node, move |blockchain| blockchain.mine(&barangay)).await?;
            Ok(Json(json!({
                "message": format!("Block mined for barangay {}", block.barangay),
                "block": block
            })))
        }
        MineTarget::All => {
            let blocks = with_ledger_mut(&node, |blockchain| blockchain.mine_all()).await?;
            Ok(Json(json!({
                "message": format!("Mined {} block(s)", blocks.len()),
                "blocks": blocks
            })))
        }
    }
}

async fn get_chain_masked(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    let chain = blockchain.masked_chain();
    Json(json!({
        "length": chain.len(),
        "chain": chain
    }))
}

async fn get_pending(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    Json(json!({ "pending": blockchain.pending_snapshot() }))
}

async fn get_results(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    Json(json!({ "results": blockchain.tally_overall() }))
}

async fn get_results_by_barangay(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    Json(json!({ "results_by_barangay": blockchain.tally_by_barangay() }))
}

async fn get_visualizer_data(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    Json(json!({
        "mined": blockchain.mined_by_barangay(),
        "pending": blockchain.pending_snapshot()
    }))
}

async fn verify_chain(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let blockchain = node.blockchain.read().await;
    match blockchain.verify() {
        Ok(()) => Json(json!({ "valid": true, "length": blockchain.blocks.len() })),
        Err(e) => Json(json!({
            "valid": false,
            "length": blockchain.blocks.len(),
            "error": e.to_string()
        })),
    }
}

/// Write the full unredacted ledger to the export file and send it back as
/// an attachment.
async fn export_all(State(node): State<Arc<Node>>) -> Result<Response, ApiError> {
    let export = node.blockchain.read().await.export_snapshot();
    let export_path = node.export_path.clone();
    tokio::task::spawn_blocking(move || write_json_atomic(&export_path, &export))
        .await
        .map_err(|e| ApiError::InternalError(format!("Export task failed: {}", e)))??;

    let body = tokio::fs::read(&node.export_path)
        .await
        .map_err(|e| ApiError::InternalError(format!("Failed to read export: {}", e)))?;

    let filename = node
        .export_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("export_chain.json");

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        body,
    )
        .into_response())
}
