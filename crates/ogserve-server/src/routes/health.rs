use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::state::AppState;

/// GET /checks/healthz: liveness and readiness in one answer.
///
/// Answering 200 proves the process is alive; the 200/503 split reports
/// readiness. The handler only reads the readiness flags, so a probe is a
/// memory load no matter how busy rendering is.
pub async fn healthz(State(app): State<AppState>) -> Response {
    if app.readiness.is_ready() {
        (StatusCode::OK, "OK").into_response()
    } else {
        let report = app.readiness.report();
        (StatusCode::SERVICE_UNAVAILABLE, axum::Json(report)).into_response()
    }
}
