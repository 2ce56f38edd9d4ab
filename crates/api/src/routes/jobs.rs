use axum::{extract::{Path, State}, Json};
use crate::{error::ApiError, state::AppState};

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Job status", body = jobs::JobStatus),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<jobs::JobStatus>, ApiError> {
    state
        .jobs
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("job {id} not found")))
}

#[utoipa::path(
        get,
        path = "/v1/jobs/{id}/result",
        params(("id" = String, Path, description = "Job ID")),
        responses(
            (status = 200, description = "Schedule run (if ready)", body = types::ScheduleRun),
            (status = 404, description = "Unknown job")
        )
    )]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let value = match state.jobs.get(&id) {
        Some(jobs::JobStatus::Completed { result }) => serde_json::to_value(result),
        Some(jobs::JobStatus::Failed { message }) => {
            Ok(serde_json::json!({"status": "failed", "message": message}))
        }
        Some(_) => Ok(serde_json::json!({"status": "not_ready"})),
        None => return Err(ApiError::not_found(format!("job {id} not found"))),
    };
    value
        .map(Json)
        .map_err(|e| ApiError(axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
