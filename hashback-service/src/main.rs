//! HashBack HTTP service.
//!
//! Exposes the issuer endpoint plus an open, in-memory hash store for
//! development and testing. Production callers publish their verification
//! hashes on a site they control instead of the bundled store; the store
//! exists so a complete exchange can be exercised against a single local
//! process.
//!
//! Endpoints:
//!
//! - `POST /issuer` - run the verify-then-issue procedure for a request
//! - `POST /hashes` - publish a verification hash (`{"ID": ..., "Hash": ...}`)
//! - `GET /hashes?id=` - serve a published hash once, as `text/plain`
//! - `GET /healthz` - liveness probe

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use hashback_core::issuer::{HttpVerifySource, Issuer, IssuerPolicy};
use hashback_core::store::{decode_hash, AddHashBody, HashStore};
use hashback_core::{
    AuthenticationRequest, HashBackError, IssuedCredential, ProtocolVersion, ResponseType,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "hashback-service")]
#[command(about = "HashBack issuer and development hash store")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3001")]
    bind: String,

    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Service configuration from TOML.
#[derive(Debug, Deserialize)]
struct ServiceConfig {
    /// Issuer policy; every field has a default.
    #[serde(default)]
    issuer: IssuerPolicy,

    /// Maximum number of hashes held by the development store.
    #[serde(default = "default_store_capacity")]
    store_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { issuer: IssuerPolicy::default(), store_capacity: default_store_capacity() }
    }
}

fn default_store_capacity() -> usize {
    9999
}

#[derive(Clone)]
struct AppState {
    issuer: Arc<Issuer>,
    store: HashStore,
}

/// Machine-readable rejection body. `Reason` carries the stable code;
/// the optional accept fields tell a conforming caller how to adjust.
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RejectionBody {
    reason: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_versions: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_type_of_response: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    accept_rounds: Option<u32>,
}

fn reject(error: &HashBackError) -> Response {
    let accept_rounds = match error {
        HashBackError::InvalidRounds { accept } => Some(*accept),
        _ => None,
    };
    let body = RejectionBody {
        reason: error.reason_code(),
        message: error.to_string(),
        accept_versions: None,
        accept_type_of_response: None,
        accept_rounds,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn reject_simple(message: &str) -> Response {
    let body = RejectionBody {
        reason: "InvalidRequest",
        message: message.to_owned(),
        accept_versions: None,
        accept_type_of_response: None,
        accept_rounds: None,
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

async fn issue(State(state): State<AppState>, body: Bytes) -> Response {
    let request: AuthenticationRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(_) => {
            // The parse error text can quote the offending input, so a
            // static message plus the accept lists goes back instead.
            let body = RejectionBody {
                reason: "InvalidRequest",
                message: "request body is not a valid HashBack authentication request".to_owned(),
                accept_versions: Some(ProtocolVersion::ACCEPTED.to_vec()),
                accept_type_of_response: Some(ResponseType::ACCEPTED.to_vec()),
                accept_rounds: None,
            };
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match state.issuer.process(&request).await {
        Ok(IssuedCredential::BearerToken(grant)) => (StatusCode::OK, Json(grant)).into_response(),
        Ok(IssuedCredential::Jwt(jwt)) => (StatusCode::OK, Json(jwt)).into_response(),
        Ok(IssuedCredential::SessionCookie { name, value }) => {
            (StatusCode::NO_CONTENT, [(header::SET_COOKIE, format!("{name}={value}"))])
                .into_response()
        }
        Err(error) => reject(&error),
    }
}

async fn add_hash(State(state): State<AppState>, body: Bytes) -> Response {
    let body: AddHashBody = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(_) => return reject_simple("request body is not a valid {ID, Hash} object"),
    };

    let Ok(id) = Uuid::parse_str(&body.id) else {
        return reject_simple("ID property is not a valid UUID");
    };
    let Some(hash) = decode_hash(&body.hash) else {
        return reject_simple("Hash must be 256 bits of base64");
    };

    match state.store.store(id, hash, system_now()) {
        Ok(()) => (
            StatusCode::OK,
            "Hash stored. This open store is for development and testing only.\n",
        )
            .into_response(),
        Err(error) => reject(&error),
    }
}

#[derive(Deserialize)]
struct HashQuery {
    id: Option<String>,
}

async fn get_hash(State(state): State<AppState>, Query(query): Query<HashQuery>) -> Response {
    let Some(raw_id) = query.id else {
        return reject_simple("the id query parameter is required");
    };
    let Ok(id) = Uuid::parse_str(&raw_id) else {
        return reject_simple("the id query parameter is not a valid UUID");
    };

    match state.store.take(&id) {
        Some(record) => (
            [(header::CONTENT_TYPE, "text/plain")],
            format!("{}\n", record.to_base64()),
        )
            .into_response(),
        None => reject_simple("no hash is stored under that ID"),
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "hashback-service"
    }))
}

fn system_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("system time must be after Unix epoch")
        .as_secs() as i64
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let args = Args::parse();
    let config: ServiceConfig = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).expect("failed to read config file");
            toml::from_str(&text).expect("failed to parse config file")
        }
        None => ServiceConfig::default(),
    };
    config.issuer.validate().expect("issuer policy is invalid");

    if config.issuer.token_key == IssuerPolicy::default().token_key {
        warn!("issuer is signing tokens with the development key; set token_key in the config");
    }

    let source =
        HttpVerifySource::new(config.issuer.fetch_timeout()).expect("failed to build HTTP client");
    let issuer =
        Arc::new(Issuer::new(config.issuer, Arc::new(source)).expect("issuer policy is invalid"));
    let store = HashStore::new(config.store_capacity);

    let app = Router::new()
        .route("/issuer", post(issue))
        .route("/hashes", post(add_hash))
        .route("/hashes", get(get_hash))
        .route("/healthz", get(healthz))
        .with_state(AppState { issuer, store });

    info!(bind = %args.bind, "hashback-service listening");

    let listener = tokio::net::TcpListener::bind(&args.bind).await.expect("failed to bind");
    axum::serve(listener, app).await.expect("server error");
}
