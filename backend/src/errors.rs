use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::imaging::ImageError;
use crate::model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No image file provided")]
    MissingFile,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Invalid file type. Only images are allowed.")]
    UnsupportedExtension,
    #[error(transparent)]
    InvalidImage(#[from] ImageError),
    #[error("File too large. Maximum size is {0}.")]
    PayloadTooLarge(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingFile
            | ApiError::EmptyFilename
            | ApiError::UnsupportedExtension
            | ApiError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Model(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::PayloadTooLarge(_) => json!({ "error": self.to_string() }),
            ApiError::Model(_) | ApiError::Internal(_) => json!({
                "success": false,
                "error": "An error occurred during prediction",
                "message": self.to_string(),
            }),
            _ => json!({ "success": false, "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn client_errors_map_to_bad_request() {
        let (status, body) = body_json(ApiError::EmptyFilename).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "success": false, "error": "No file selected" }));

        let (status, body) =
            body_json(ImageError::Invalid("unexpected end of file".into()).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid image file: unexpected end of file");
    }

    #[actix_web::test]
    async fn model_not_loaded_is_internal() {
        let (status, body) = body_json(ModelError::NotLoaded.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "An error occurred during prediction");
        assert_eq!(body["message"], "Model not loaded. Call load() first.");
    }

    #[actix_web::test]
    async fn payload_too_large_has_plain_error_shape() {
        let (status, body) = body_json(ApiError::PayloadTooLarge("16MB".into())).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({ "error": "File too large. Maximum size is 16MB." }));
    }
}
