use axum::{http::StatusCode, Json};
use sched_core::{audit::audit, rules::extract_rules, validate, ValidationError};
use serde::Serialize;
use types::{Dataset, DemandAudit};

#[derive(Serialize, utoipa::ToSchema)]
pub struct ValidationReport {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    pub audit: DemandAudit,
}

#[utoipa::path(
    post,
    path = "/v1/validate",
    request_body = Dataset,
    responses(
    (status = 200, description = "Validation result and demand audit", body = ValidationReport)
    )
)]
pub async fn validate_handler(Json(ds): Json<Dataset>) -> (StatusCode, Json<ValidationReport>) {
    let audit = audit(&ds, &extract_rules(&ds));
    match validate(&ds) {
        Ok(()) => (StatusCode::OK, Json(ValidationReport { ok: true, errors: vec![], audit })),
        Err(ValidationError::Msg(msg)) => {
            let errs = msg.split(';').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
            (StatusCode::OK, Json(ValidationReport { ok: false, errors: errs, audit }))
        }
    }
}
