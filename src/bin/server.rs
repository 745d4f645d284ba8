use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use sheetris::config::PackerConfig;
use sheetris::solver::Solver;
use sheetris::types::{Demand, Solution};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct OptimizeRequest {
    #[serde(flatten)]
    config: PackerConfig,
    cuts: Vec<Demand>,
}

fn validate_cuts(cuts: &[Demand]) -> Result<(), String> {
    for c in cuts {
        if !c.rect.is_valid() {
            return Err(format!("cut dimensions must be positive, got {}", c.rect));
        }
        if c.qty == 0 {
            return Err("cut quantity must be non-zero".to_string());
        }
        if !c.thickness.is_finite() || c.thickness < 0.0 {
            return Err(format!("invalid thickness {}", c.thickness));
        }
    }
    Ok(())
}

async fn optimize(
    Json(req): Json<OptimizeRequest>,
) -> Result<Json<Solution>, (StatusCode, String)> {
    tracing::info!(
        body = serde_json::to_string(&req).unwrap_or_default(),
        "POST /optimize"
    );

    let bad_request = |e: String| (StatusCode::BAD_REQUEST, e);
    req.config
        .validate()
        .map_err(|e| bad_request(e.to_string()))?;
    validate_cuts(&req.cuts).map_err(bad_request)?;

    let solution = Solver::new(req.config, req.cuts)
        .solve()
        .map_err(|e| bad_request(e.to_string()))?;

    Ok(Json(solution))
}

fn app() -> Router {
    Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/optimize", post(optimize))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app()).await.unwrap();
}
