use std::time::Instant;

use actix_multipart::Multipart;
use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpRequest, HttpResponse, web};
use futures::TryStreamExt;
use log::{error, info, warn};
use serde_json::json;
use shared::{HealthResponse, ImageSummary, PredictionResponse};
use uuid::Uuid;

use crate::config::Settings;
use crate::errors::ApiError;
use crate::imaging::{self, ImageError, ImageInfo, PreprocessOptions};
use crate::model::{CraftClassifier, ModelRegistry, Prediction};

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health_check)))
        .service(web::resource("/predict").route(web::post().to(predict)))
        .default_service(web::route().to(not_found));
}

/// Rewrites framework-level 500s that carry no JSON body.
pub fn error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, internal_error)
}

fn internal_error<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    }

    error!("Internal server error on {}", res.request().path());
    let (req, _) = res.into_parts();
    let response = HttpResponse::InternalServerError()
        .json(json!({ "error": "Internal server error" }))
        .map_into_right_body();
    Ok(ErrorHandlerResponse::Response(ServiceResponse::new(req, response)))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "Endpoint not found" }))
}

async fn health_check(
    registry: web::Data<ModelRegistry>,
    settings: web::Data<Settings>,
) -> HttpResponse {
    let model = registry
        .get_model()
        .map(|model| model.info())
        .unwrap_or_else(|_| CraftClassifier::new().info());

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: settings.service_name.clone(),
        model,
    })
}

struct UploadedImage {
    filename: String,
    bytes: Vec<u8>,
}

/// Buffers the first `image` file field; other fields are drained.
async fn read_upload(
    payload: &mut Multipart,
    limit: usize,
    limit_label: &str,
) -> Result<UploadedImage, ApiError> {
    let mut upload: Option<UploadedImage> = None;
    let mut received = 0usize;

    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        ApiError::MissingFile
    })? {
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);
        let capture = upload.is_none() && field.name() == Some("image") && filename.is_some();

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| {
            warn!("Failed to read multipart field: {}", e);
            ApiError::MissingFile
        })? {
            received += chunk.len();
            if received > limit {
                return Err(ApiError::PayloadTooLarge(limit_label.to_string()));
            }
            if capture {
                data.extend_from_slice(&chunk);
            }
        }

        if capture {
            if let Some(filename) = filename {
                upload = Some(UploadedImage {
                    filename,
                    bytes: data,
                });
            }
        }
    }

    upload.ok_or(ApiError::MissingFile)
}

fn analyze(
    bytes: &[u8],
    options: &PreprocessOptions,
    model: &CraftClassifier,
) -> Result<(ImageInfo, Prediction), ApiError> {
    imaging::validate(bytes)?;
    // Reported dimensions come from the original upload, not the downscaled copy.
    let info = imaging::inspect(bytes)?;
    let preprocessed = imaging::preprocess(bytes, options)?;
    let (width, height) = preprocessed.dimensions();
    log::debug!(
        "Preprocessed {} -> {}x{} -> {}x{}",
        info.dimensions_label(),
        preprocessed.scaled_dimensions.0,
        preprocessed.scaled_dimensions.1,
        width,
        height
    );
    let tensor = imaging::to_tensor(&preprocessed.image);
    let prediction = model.predict(&tensor)?;
    Ok((info, prediction))
}

async fn predict(
    req: HttpRequest,
    mut payload: Multipart,
    registry: web::Data<ModelRegistry>,
    settings: web::Data<Settings>,
) -> Result<HttpResponse, ApiError> {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let limit = settings.max_content_length;

    let declared_length = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared_length.is_some_and(|len| len > limit) {
        warn!("[{}] Rejected upload larger than {} bytes", request_id, limit);
        return Err(ApiError::PayloadTooLarge(settings.max_content_label()));
    }

    let upload = read_upload(&mut payload, limit, &settings.max_content_label()).await?;

    if upload.filename.is_empty() {
        return Err(ApiError::EmptyFilename);
    }
    if !settings.image.is_allowed_filename(&upload.filename) {
        info!("[{}] Rejected file type: {}", request_id, upload.filename);
        return Err(ApiError::UnsupportedExtension);
    }
    info!(
        "[{}] Received {} ({} bytes)",
        request_id,
        upload.filename,
        upload.bytes.len()
    );

    let model = registry.get_model().inspect_err(|e| {
        error!("[{}] {}", request_id, e);
    })?;
    let [target_width, target_height] = settings.image.target_size;
    let options = PreprocessOptions {
        target_size: (target_width, target_height),
        max_dimension: settings.image.max_dimension,
    };

    let bytes = upload.bytes;
    let (image_info, prediction) = web::block(move || analyze(&bytes, &options, &model))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .inspect_err(|e| match e {
            ApiError::InvalidImage(ImageError::Invalid(cause)) => {
                warn!("[{}] Invalid image {}: {}", request_id, upload.filename, cause)
            }
            other => error!("[{}] Prediction failed: {}", request_id, other),
        })?;

    let top = prediction.top().clone();
    let processing_time = (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0;
    info!(
        "[{}] Predicted {} ({:.4}) for {} in {:.3}s",
        request_id, top.class, top.confidence, upload.filename, processing_time
    );

    Ok(HttpResponse::Ok().json(PredictionResponse {
        success: true,
        craft_name: top.class,
        confidence: top.confidence,
        all_predictions: prediction.predictions,
        image_info: ImageSummary {
            filename: upload.filename,
            dimensions: image_info.dimensions_label(),
            format: image_info.format,
        },
        model_version: prediction.model_version,
        processing_time,
    }))
}
