use crate::detector::Detector;
use crate::error::DetectError;
use crate::storage::ArtifactStore;
use actix_web::error::JsonPayloadError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, warn};

pub mod protocol;
pub mod routes;

/// Shared per-process state handed to every request
pub struct AppState {
    pub detector: Arc<dyn Detector>,
    pub store: ArtifactStore,
}

/// Register the detect-api routes on an actix app
pub fn configure(max_payload_bytes: usize) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(
            web::JsonConfig::default()
                .limit(max_payload_bytes)
                .error_handler(json_error),
        )
        .service(routes::detect);
    }
}

/// A failed request. Every pipeline failure becomes a 500 with the message
/// as `detail`
#[derive(Debug)]
pub struct WebError {
    err: DetectError,
}

impl std::fmt::Display for WebError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.err)
    }
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        let err = HashMap::from([("detail", self.to_string())]);

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(err)
    }

    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<DetectError> for WebError {
    fn from(err: DetectError) -> WebError {
        error!("detect request failed: {err:?}");
        WebError { err }
    }
}

impl From<actix_web::error::BlockingError> for WebError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        DetectError::Inference(err.to_string()).into()
    }
}

/// Malformed bodies are rejected before the handler runs
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    warn!("rejected request body: {err}");
    let detail = HashMap::from([("detail", err.to_string())]);
    let response = HttpResponse::UnprocessableEntity()
        .insert_header(ContentType::json())
        .json(detail);
    actix_web::error::InternalError::from_response(err, response).into()
}
