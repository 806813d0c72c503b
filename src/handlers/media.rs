use actix_web::{web, HttpResponse};

use crate::error::{AppError, AppResult};
use crate::services::storage::is_safe_filename;
use crate::state::AppState;

/// Serve a locally stored upload. With the S3 backend these URLs do
/// not exist; objects are fetched from the bucket's public base URL.
pub async fn serve_upload(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let filename = path.into_inner();
    if !is_safe_filename(&filename) {
        return Err(AppError::BadRequest("Invalid filename".to_string()));
    }

    let root = state
        .storage
        .local_root()
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    let bytes = tokio::fs::read(root.join(&filename))
        .await
        .map_err(|_| AppError::NotFound("File not found".to_string()))?;

    let content_type = if filename.ends_with(".png") {
        mime::IMAGE_PNG
    } else {
        mime::IMAGE_JPEG
    };

    Ok(HttpResponse::Ok()
        .content_type(content_type.as_ref())
        .body(bytes))
}

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/uploads/{filename}", web::get().to(serve_upload));
}
