//! api-server — HTTP front end for the prompt checker.
//!
//! Exposes the check pipeline over JSON:
//! - `POST /api/prompts/check` runs one prompt through every validation stage.
//! - `GET /healthz` reports liveness and the loaded rule counts.
//!
//! Rules are loaded once at startup (RULES_PATH); image reachability probes
//! go through PROBE_PROXY_URL and are skipped when it is unset.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # custom rules and reachability probing
//! RULES_PATH=rules.json PROBE_PROXY_URL=http://127.0.0.1:3128 \
//!   cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::http::HeaderValue;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain::{CheckError, CheckRequest, ErrorKind, PromptCheckResult, PromptChecker};
use http_probe::HttpImageProbe;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Clone)]
struct AppState {
    checker: Arc<PromptChecker<HttpImageProbe>>,
    /// Proxy address passed to every check; empty disables probing.
    proxy: String,
}

#[derive(Debug, Deserialize)]
struct CheckIn {
    prompt: String,
    #[serde(default)]
    allow_empty: bool,
    #[serde(default = "default_true")]
    check_banned_words: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct CheckOut {
    #[serde(flatten)]
    result: PromptCheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorKind>,
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_insecure();

    let rules = match rules_file::load_or_default(cfg.rules_path.as_ref()) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, "failed to load rules");
            std::process::exit(1);
        }
    };
    let checker = PromptChecker::new(Arc::new(rules), HttpImageProbe::new(cfg.probe_timeout))
        .with_priority(cfg.error_priority);
    let state = AppState {
        checker: Arc::new(checker),
        proxy: cfg.proxy_address(),
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = routes(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, priority = ?cfg.error_priority, "api-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/prompts/check", post(check_prompt))
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .with_state(state)
}

async fn check_prompt(
    State(state): State<AppState>,
    body: Result<Json<CheckIn>, JsonRejection>,
) -> impl IntoResponse {
    let Json(input) = match body {
        Ok(b) => b,
        Err(rejection) => {
            warn!(err = %rejection.body_text(), "bad check request");
            return (
                rejection.status(),
                Json(http_common::json_error_with_message(
                    "invalid_body",
                    &rejection.body_text(),
                )),
            )
                .into_response();
        }
    };

    let req = CheckRequest::new(input.prompt)
        .allow_empty(input.allow_empty)
        .check_banned_words(input.check_banned_words)
        .proxy(state.proxy.clone());
    let checker = Arc::clone(&state.checker);
    let started = Instant::now();

    // Reachability probes block; keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || {
        let priority = checker.priority();
        let eval = checker.evaluate(&req);
        let error_code = eval.reported(priority).map(CheckError::kind);
        CheckOut {
            result: eval.into_result(priority),
            error_code,
        }
    })
    .await;

    match outcome {
        Ok(out) => {
            info!(
                ok = out.result.is_ok(),
                error_code = ?out.error_code,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "prompt checked"
            );
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => {
            error!(err = %e, "check worker failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(http_common::json_err("internal")),
            )
                .into_response()
        }
    }
}

async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let rules = state.checker.rules();
    Json(serde_json::json!({
        "status": "ok",
        "params": rules.params.len(),
        "banned_words": rules.banned.len(),
        "probing": !state.proxy.is_empty(),
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(http_common::json_err("not_found")),
    )
}
