use crate::state::AppState;
use axum::{extract::State, Json};
use types::{Dataset, ScheduleRun};
use utoipa::ToSchema;

#[derive(serde::Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: String,
    pub status: &'static str,
}

#[utoipa::path(
        post,
        path = "/v1/schedule",
        request_body = Dataset,
        responses((status = 200, description = "Scheduling job enqueued", body = JobCreated))
    )]
pub async fn schedule(
    State(state): State<AppState>,
    Json(dataset): Json<Dataset>,
) -> Json<JobCreated> {
    let id = state.jobs.enqueue(dataset);
    Json(JobCreated {
        job_id: id.0,
        status: "queued",
    })
}

#[utoipa::path(
    post,
    path = "/v1/schedule/run",
    request_body = Dataset,
    responses((status = 200, description = "Schedule computed synchronously", body = ScheduleRun))
)]
pub async fn run(Json(dataset): Json<Dataset>) -> Json<ScheduleRun> {
    Json(allocator::run(&dataset))
}
