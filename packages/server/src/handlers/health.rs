use axum::Json;

use crate::models::health::HealthResponse;

#[utoipa::path(
    get,
    path = "/health-check",
    tag = "Health",
    operation_id = "healthCheck",
    summary = "Liveness probe",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
