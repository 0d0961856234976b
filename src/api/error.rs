use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crate::services::intake::IntakeError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Client input problem, reported as-is
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// Store or staging failure; `message` goes to the client together with
    /// the raw error chain
    #[error("{message}: {cause:#}")]
    Upstream {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl GatewayError {
    pub fn upstream(message: &'static str) -> impl FnOnce(anyhow::Error) -> Self {
        move |cause| GatewayError::Upstream { message, cause }
    }
}

impl From<IntakeError> for GatewayError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::Multipart { status, message } if status == StatusCode::PAYLOAD_TOO_LARGE => {
                GatewayError::PayloadTooLarge(message)
            }
            IntakeError::Staging(cause) => GatewayError::Upstream {
                message: "Error staging upload",
                cause,
            },
            other => GatewayError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            GatewayError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            GatewayError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "message": msg }))
            }
            GatewayError::Upstream { message, cause } => {
                tracing::error!("{}: {:?}", message, cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "message": message,
                        "error": format!("{:#}", cause),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_status_codes() {
        let res = GatewayError::BadRequest("No file uploaded".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = GatewayError::upstream("Error uploading file")(anyhow!("connection refused"))
            .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_intake_errors_map_to_client_errors() {
        let err: GatewayError = IntakeError::TooManyFiles { limit: 10 }.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

        let err: GatewayError = IntakeError::Multipart {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".to_string(),
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);

        let err: GatewayError = IntakeError::Staging(anyhow!("disk full")).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_display_keeps_chain() {
        let err = GatewayError::upstream("Error retrieving images")(
            anyhow!("NoSuchBucket").context("list_objects_v2 failed"),
        );
        assert_eq!(
            err.to_string(),
            "Error retrieving images: list_objects_v2 failed: NoSuchBucket"
        );
    }
}
