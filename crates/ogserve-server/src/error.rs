use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ogserve_core::OgError;

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if let Some(e) = self.0.downcast_ref::<OgError>() {
            match e {
                OgError::NewsNotFound(_) => StatusCode::NOT_FOUND,
                OgError::InvalidSlug(_)
                | OgError::InvalidTemplateKind(_)
                | OgError::InvalidCacheStrategy(_) => StatusCode::BAD_REQUEST,
                OgError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                OgError::ConfigVar { .. }
                | OgError::RunningAsRoot
                | OgError::WorkspaceNotWritable(_)
                | OgError::RenderFailed { .. }
                | OgError::ChannelNotRegistered(_)
                | OgError::NotifyFailed(_)
                | OgError::FetchFailed(_)
                | OgError::Io(_)
                | OgError::Json(_)
                | OgError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
