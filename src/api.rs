//! REST API for the carbon credit ledger
//!
//! Thin adapter: request bodies are mapped onto [`Node`] calls and core
//! results onto JSON responses. Required-field checks live here; amount
//! validation stays in the core.

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::{self, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

use crate::blockchain::Block;
use crate::config::Config;
use crate::error::LedgerError;
use crate::node::Node;
use crate::transaction::Credits;

// ============================================================================
// API Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    MissingFields { required: Vec<&'static str> },
    InvalidInput(String),
    /// A seal that could not finish; the caller may retry.
    Ledger(LedgerError),
    NotFound(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingFields { required } => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "error": "Missing required values",
                        "required": required,
                    })),
                )
                    .into_response();
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Ledger(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidAmount(_) => ApiError::InvalidInput(err.to_string()),
            LedgerError::ProofNotFound { .. }
            | LedgerError::SealCancelled
            | LedgerError::SealInProgress => ApiError::Ledger(err),
            _ => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidInput(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct IssueRequest {
    pub recipient: Option<String>,
    #[serde(alias = "credits")]
    pub amount: Option<Credits>,
    #[serde(alias = "project_type")]
    pub category: Option<String>,
    #[serde(alias = "description")]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferRequest {
    pub sender: Option<String>,
    pub recipient: Option<String>,
    #[serde(alias = "credits")]
    pub amount: Option<Credits>,
    #[serde(alias = "project_type")]
    pub category: Option<String>,
    #[serde(alias = "description")]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetireRequest {
    pub owner: Option<String>,
    #[serde(alias = "credits")]
    pub amount: Option<Credits>,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct SealResponse {
    pub message: String,
    #[serde(flatten)]
    pub block: Block,
}

#[derive(Serialize)]
pub struct ScheduledResponse {
    pub message: String,
    pub block_index: u64,
    #[serde(flatten)]
    pub details: serde_json::Value,
}

#[derive(Serialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
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

/// Build the API router with all endpoints (also used by tests)
pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api", get(api_info))
        .route("/health", get(health_check))
        // Ledger mutations
        .route("/validate", post(seal_block))
        .route("/issue", post(issue_credits))
        .route("/transfer", post(transfer_credits))
        .route("/retire", post(retire_credits))
        // Read-only views
        .route("/chain", get(full_chain))
        .route("/chain/length", get(chain_length))
        .route("/chain/verify", get(verify_chain))
        .route("/stats", get(get_stats))
        .route("/pending", get(get_pending))
        .route("/balance/:owner", get(get_balance))
        .fallback(not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

/// Bind to the configured address and serve until the process exits.
pub async fn run_api_server(
    node: Arc<Node>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_api_router(node);
    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "carbon ledger API listening");
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn api_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Carbon Credits Blockchain API",
        "endpoints": {
            "/validate": "POST - Seal pending transactions into a new block",
            "/issue": "POST - Issue new carbon credits from a project",
            "/transfer": "POST - Transfer carbon credits between parties",
            "/retire": "POST - Retire (burn) carbon credits permanently",
            "/chain": "GET - Get full blockchain",
            "/chain/length": "GET - Get blockchain length",
            "/chain/verify": "GET - Re-check linkage and proofs of the whole chain",
            "/stats": "GET - Get blockchain statistics",
            "/pending": "GET - List transactions waiting for the next block",
            "/balance/:owner": "GET - Sealed credit holdings of an owner"
        }
    }))
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

async fn seal_block(State(node): State<Arc<Node>>) -> Result<Json<SealResponse>, ApiError> {
    let block = node.seal_block().await?;
    Ok(Json(SealResponse {
        message: "New block validated and added to chain".to_string(),
        block,
    }))
}

async fn issue_credits(
    State(node): State<Arc<Node>>,
    payload: Result<Json<IssueRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduledResponse>), ApiError> {
    let Json(req) = payload?;
    let (Some(recipient), Some(amount), Some(category)) = (req.recipient, req.amount, req.category)
    else {
        return Err(ApiError::MissingFields {
            required: vec!["recipient", "amount", "category"],
        });
    };

    let index = node
        .issue(&recipient, amount, &category, req.note.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduledResponse {
            message: format!(
                "Carbon credits issued and scheduled for Block No. {}",
                index
            ),
            block_index: index,
            details: serde_json::json!({
                "recipient": recipient,
                "amount": amount,
                "category": category,
            }),
        }),
    ))
}

async fn transfer_credits(
    State(node): State<Arc<Node>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduledResponse>), ApiError> {
    let Json(req) = payload?;
    let (Some(sender), Some(recipient), Some(amount)) = (req.sender, req.recipient, req.amount)
    else {
        return Err(ApiError::MissingFields {
            required: vec!["sender", "recipient", "amount"],
        });
    };

    let index = node
        .transfer(
            &sender,
            &recipient,
            amount,
            req.category.as_deref(),
            req.note.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduledResponse {
            message: format!(
                "Carbon credit transfer scheduled for Block No. {}",
                index
            ),
            block_index: index,
            details: serde_json::json!({
                "sender": sender,
                "recipient": recipient,
                "amount": amount,
            }),
        }),
    ))
}

async fn retire_credits(
    State(node): State<Arc<Node>>,
    payload: Result<Json<RetireRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ScheduledResponse>), ApiError> {
    let Json(req) = payload?;
    let (Some(owner), Some(amount)) = (req.owner, req.amount) else {
        return Err(ApiError::MissingFields {
            required: vec!["owner", "amount"],
        });
    };

    let index = node.retire(&owner, amount, req.reason.as_deref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ScheduledResponse {
            message: format!(
                "Carbon credits retired (burned) and scheduled for Block No. {}",
                index
            ),
            block_index: index,
            details: serde_json::json!({
                "owner": owner,
                "amount": amount,
                "reason": req.reason,
            }),
        }),
    ))
}

async fn full_chain(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let chain = node.chain().await;
    let length = chain.len();
    Json(ChainResponse { chain, length })
}

async fn chain_length(State(node): State<Arc<Node>>) -> impl IntoResponse {
    Json(serde_json::json!({ "length": node.chain_length().await }))
}

async fn verify_chain(State(node): State<Arc<Node>>) -> impl IntoResponse {
    match node.verify().await {
        Ok(()) => Json(serde_json::json!({ "valid": true })),
        Err(e) => Json(serde_json::json!({ "valid": false, "error": e.to_string() })),
    }
}

async fn get_stats(State(node): State<Arc<Node>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(node.stats().await?))
}

async fn get_pending(State(node): State<Arc<Node>>) -> impl IntoResponse {
    let transactions = node.pending().await;
    Json(serde_json::json!({
        "count": transactions.len(),
        "sealing": node.sealing_count().await,
        "transactions": transactions
    }))
}

async fn get_balance(
    State(node): State<Arc<Node>>,
    Path(owner): Path<String>,
) -> impl IntoResponse {
    let balance = node.balance_of(&owner).await;
    Json(serde_json::json!({
        "owner": owner,
        "balance": balance
    }))
}
