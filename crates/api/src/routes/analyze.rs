use axum::Json;
use serde::Deserialize;
use utoipa::ToSchema;

use sched_core::{analysis::analyze, prep::preprocess, rules::extract_rules};
use types::{Allocation, Analysis, Dataset};

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeIn {
    pub dataset: Dataset,
    pub allocation: Allocation,
}

#[utoipa::path(
    post,
    path = "/v1/analyze",
    request_body = AnalyzeIn,
    responses(
    (status = 200, description = "Quality metrics for the provided allocation", body = Analysis)
    )
)]
pub async fn analyze_handler(Json(input): Json<AnalyzeIn>) -> Json<Analysis> {
    let rules = extract_rules(&input.dataset);
    let prep = preprocess(&input.dataset, &rules);
    Json(analyze(&input.allocation, &prep.courses))
}
