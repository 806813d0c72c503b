pub mod auth;
pub mod conversations;
pub mod media;
pub mod notifications;
pub mod posts;
pub mod users;

use std::collections::HashMap;

use actix_multipart::Multipart;
use futures_util::StreamExt;

use crate::error::{AppError, AppResult};

pub(crate) struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Drain a multipart payload into text fields plus at most one file,
/// taken from `file_field`. Unknown file fields are read as text like
/// the rest.
pub(crate) async fn collect_multipart(
    mut payload: Multipart,
    file_field: &str,
) -> AppResult<(HashMap<String, String>, Option<UploadedFile>)> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;
        let name = field.name().to_string();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data =
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart read error: {}", e)))?;
            bytes.extend_from_slice(&data);
        }

        if name == file_field {
            let filename = field
                .content_disposition()
                .get_filename()
                .unwrap_or_default()
                .to_string();
            if !bytes.is_empty() {
                file = Some(UploadedFile { filename, bytes });
            }
        } else {
            fields.insert(name, String::from_utf8_lossy(&bytes).into_owned());
        }
    }

    Ok((fields, file))
}
