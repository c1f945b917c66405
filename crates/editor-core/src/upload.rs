use std::cell::RefCell;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::builders::ImagePlacement;
use crate::core::Editor;
use crate::error::UploadError;
use crate::surface::EditableSurface;

/// Upload ceiling applied to every image, 5 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_UPLOAD_CATEGORY: &str = "blog";
const IMAGE_MIME_PREFIX: &str = "image/";

/// Client-side checks run before anything is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    pub allowed_mime_prefixes: Vec<String>,
    /// Category metadata sent along with the file.
    pub category: String,
}

impl UploadPolicy {
    pub fn with_defaults(mut self) -> Self {
        if self.max_size_bytes == 0 {
            self.max_size_bytes = DEFAULT_MAX_IMAGE_BYTES;
        }
        self.allowed_mime_prefixes
            .retain(|prefix| !prefix.trim().is_empty());
        if self.allowed_mime_prefixes.is_empty() {
            self.allowed_mime_prefixes = vec![IMAGE_MIME_PREFIX.to_string()];
        }
        if self.category.trim().is_empty() {
            self.category = DEFAULT_UPLOAD_CATEGORY.to_string();
        }
        self
    }

    pub fn request(&self, file: ImageFile) -> ImageUploadRequest {
        ImageUploadRequest {
            file,
            category: self.category.clone(),
            max_size_bytes: self.max_size_bytes,
            allowed_mime_prefixes: self.allowed_mime_prefixes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUploadRequest {
    pub file: ImageFile,
    pub category: String,
    pub max_size_bytes: u64,
    pub allowed_mime_prefixes: Vec<String>,
}

impl ImageUploadRequest {
    pub fn validate(&self) -> Result<(), UploadError> {
        let mime_type = self.file.mime_type.trim().to_ascii_lowercase();
        let allowed = self
            .allowed_mime_prefixes
            .iter()
            .any(|prefix| mime_type.starts_with(&prefix.to_ascii_lowercase()));
        if !allowed {
            return Err(UploadError::UnsupportedType {
                mime_type: self.file.mime_type.clone(),
            });
        }
        if self.file.size() > self.max_size_bytes {
            return Err(UploadError::TooLarge {
                size: self.file.size(),
                max: self.max_size_bytes,
            });
        }
        Ok(())
    }
}

/// Body returned by the upload endpoint.
///
/// Older endpoints answer with `imagePath` instead of `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, alias = "imagePath", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UploadResponse {
    pub fn ok(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            message: Some(message.into()),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn into_url(self) -> Result<String, UploadError> {
        if !self.success {
            return Err(UploadError::Rejected(
                self.message
                    .unwrap_or_else(|| "the server did not accept the image".to_string()),
            ));
        }
        self.url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingUrl)
    }
}

/// Identifies one image-insert gesture; at most one upload runs per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UploadSlot(pub u64);

/// Handed out by [`Editor::begin_image_upload`] and redeemed by
/// [`Editor::finish_image_upload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTicket {
    pub(crate) slot: UploadSlot,
    pub(crate) generation: u64,
}

impl UploadTicket {
    pub fn slot(&self) -> UploadSlot {
        self.slot
    }
}

#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub ticket: UploadTicket,
    pub request: ImageUploadRequest,
}

/// The HTTP collaborator that stores images and answers with their URL.
pub trait ImageUploader {
    fn upload(
        &self,
        request: ImageUploadRequest,
    ) -> LocalBoxFuture<'_, Result<UploadResponse, UploadError>>;
}

/// Uploads `file` and inserts the resulting image.
///
/// The editor is only borrowed before and after the upload, so it stays
/// editable while the request is in flight.
pub async fn upload_image<S, U>(
    editor: &RefCell<Editor<S>>,
    uploader: &U,
    slot: UploadSlot,
    file: ImageFile,
    placement: ImagePlacement,
) -> Result<(), UploadError>
where
    S: EditableSurface,
    U: ImageUploader + ?Sized,
{
    let PendingUpload { ticket, request } =
        editor.borrow_mut().begin_image_upload(slot, file, &placement)?;
    let result = uploader.upload(request).await;
    editor
        .borrow_mut()
        .finish_image_upload(ticket, result, placement)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(mime_type: &str, size: usize) -> ImageUploadRequest {
        UploadPolicy::default()
            .with_defaults()
            .request(ImageFile::new("a", mime_type, vec![0; size]))
    }

    #[test]
    fn rejects_non_images_and_oversized_files() {
        assert!(request("image/png", 10).validate().is_ok());
        assert!(matches!(
            request("application/pdf", 10).validate(),
            Err(UploadError::UnsupportedType { .. })
        ));
        let too_big = DEFAULT_MAX_IMAGE_BYTES as usize + 1;
        assert!(matches!(
            request("image/jpeg", too_big).validate(),
            Err(UploadError::TooLarge { .. })
        ));
    }

    #[test]
    fn response_accepts_image_path_alias() {
        let response =
            UploadResponse::from_json_str(r#"{ "success": true, "imagePath": "/uploads/a.png" }"#)
                .unwrap();
        assert_eq!(response.into_url().unwrap(), "/uploads/a.png");

        let response =
            UploadResponse::from_json_str(r#"{ "success": false, "message": "quota" }"#).unwrap();
        assert_eq!(
            response.into_url(),
            Err(UploadError::Rejected("quota".to_string()))
        );

        let response = UploadResponse::from_json_str(r#"{ "success": true }"#).unwrap();
        assert_eq!(response.into_url(), Err(UploadError::MissingUrl));
    }
}
