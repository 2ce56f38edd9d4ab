mod config;
mod error;
mod state;
mod telemetry;
pub mod routes {
    pub mod analyze;
    pub mod health;
    pub mod jobs;
    pub mod schedule;
    pub mod validate;
}

use axum::{
    routing::{get, post},
    Json, Router,
};

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
        paths(
            routes::health::health,
            routes::schedule::schedule,
            routes::schedule::run,
            routes::jobs::status,
            routes::jobs::result,
            routes::validate::validate_handler,
            routes::analyze::analyze_handler,
        ),
        components(schemas(
            types::Dataset, types::CourseRecord, types::ListingRecord, types::RequestRecord,
            types::RequestType, types::TypeLabel, types::Block, types::CourseCode, types::StudentId, types::LecturerId,
            types::ScheduleRun, types::Allocation, types::Analysis, types::SectionKey,
            types::Lecturer, types::PlacedSection, types::LecturerTimetable, types::PendingRequest,
            types::UnresolvedRequest, types::UnresolvedReason, types::MalformedRequest,
            types::MalformedListing, types::MissingField, types::CapacityShortage,
            types::TypeCounts, types::SectionFill, types::DemandAudit, types::CourseLoad,
            types::RequiredCoverage,
            jobs::JobId, jobs::JobStatus,
            routes::health::Health,
            routes::validate::ValidationReport,
            routes::schedule::JobCreated,
            routes::analyze::AnalyzeIn,
        )),
        tags(
            (name = "blocksched", description = "Block scheduling API")
        )
    )]
struct ApiDoc;

fn app(app_state: state::AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/v1/health", get(routes::health::health))
        .route("/v1/schedule", post(routes::schedule::schedule))
        .route("/v1/schedule/run", post(routes::schedule::run))
        .route("/v1/validate", post(routes::validate::validate_handler))
        .route("/v1/analyze", post(routes::analyze::analyze_handler))
        .route("/v1/jobs/:id", get(routes::jobs::status))
        .route("/v1/jobs/:id/result", get(routes::jobs::result))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(telemetry::stack(body_limit))
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(?e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let cfg = config::ServerConfig::from_env()?;
    let app = app(state::AppState::new_default(), cfg.body_limit);

    let addr = cfg.addr();
    tracing::info!(%addr, body_limit = cfg.body_limit, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
