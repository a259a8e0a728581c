//! The user-facing JSON web server. A single route accepts an image and
//! answers with what the detector found in it

use super::protocol::{DetectRequest, DetectResponse};
use super::{AppState, WebError};
use crate::pipeline;
use actix_web::{post, web, Responder};
use tracing::info;

type Result<T> = std::result::Result<T, WebError>;

#[post("/detect")]
pub async fn detect(
    req: web::Json<DetectRequest>,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let image_data = req.into_inner().image_data;

    // Decoding, disk io and inference all block
    let top = web::block(move || {
        let state = state.get_ref();
        pipeline::run(state.detector.as_ref(), &state.store, &image_data)
    })
    .await??;

    info!("finished serving detect request ({} detections)", top.len());

    Ok(web::Json(DetectResponse { top }))
}
