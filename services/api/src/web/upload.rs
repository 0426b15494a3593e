//! services/api/src/web/upload.rs
//!
//! Reads image files out of `multipart/form-data` bodies.

use axum::extract::Multipart;
use storefront_core::ports::PortError;
use storefront_core::ImageUpload;

use crate::error::ApiError;

/// Collects every file part of the form, in the order they were sent.
pub async fn read_images(mut multipart: Multipart) -> Result<Vec<ImageUpload>, ApiError> {
    let mut uploads = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart data: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file bytes: {}", e)))?;
        uploads.push(ImageUpload { data, content_type });
    }
    Ok(uploads)
}

/// Exactly one image; extra parts are ignored.
pub async fn read_image(multipart: Multipart) -> Result<ImageUpload, ApiError> {
    read_images(multipart)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| PortError::Validation("Please upload a file".to_string()).into())
}
