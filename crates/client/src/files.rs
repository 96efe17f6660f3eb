//! CAD model and document uploads.

use std::path::Path;

use order_portal_core::{CadFileType, DocumentId, FileId};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{ApiError, Result};
use crate::transport::{ApiRequest, FilePart, Transport};

const FILES_ENDPOINT: &str = "/files";
const DOCUMENTS_ENDPOINT: &str = "/documents";
const UPLOAD_FIELD: &str = "file";

/// A stored CAD model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    #[serde(alias = "file_id")]
    pub id: FileId,
    #[serde(default, alias = "file_name")]
    pub filename: String,
}

/// A stored supporting document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedDocument {
    #[serde(alias = "document_id")]
    pub id: DocumentId,
    #[serde(default, alias = "file_name")]
    pub filename: String,
}

/// Upload endpoints. Both require a session.
#[derive(Debug, Clone)]
pub struct FilesApi {
    transport: Transport,
}

impl FilesApi {
    #[must_use]
    pub const fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Upload a CAD model from disk.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::File` for unsupported or unreadable files, and
    /// transport errors otherwise.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_cad(&self, path: &Path) -> Result<UploadedFile> {
        let file_name = file_name(path)?;
        supported_cad_type(&file_name)?;

        let bytes = read(path).await?;
        self.upload_cad_bytes(&file_name, bytes).await
    }

    /// Upload a CAD model already in memory.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::File` for an unsupported file name, and transport
    /// errors otherwise.
    pub async fn upload_cad_bytes(&self, file_name: &str, bytes: Vec<u8>) -> Result<UploadedFile> {
        let file_type = supported_cad_type(file_name)?;

        let uploaded: UploadedFile = self
            .upload(FILES_ENDPOINT, file_name, file_type.mime_type(), bytes)
            .await?;
        info!(id = %uploaded.id, kind = file_type.info().name, "CAD file uploaded");
        Ok(uploaded)
    }

    /// Upload a supporting document such as a drawing or a datasheet.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::File` for unreadable files, and transport errors
    /// otherwise.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn upload_document(&self, path: &Path) -> Result<UploadedDocument> {
        let file_name = file_name(path)?;
        let bytes = read(path).await?;
        let uploaded: UploadedDocument = self
            .upload(DOCUMENTS_ENDPOINT, &file_name, document_mime(&file_name), bytes)
            .await?;
        info!(id = %uploaded.id, "Document uploaded");
        Ok(uploaded)
    }

    async fn upload<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<T> {
        let request = ApiRequest::post(endpoint)
            .authenticated()
            .multipart(vec![FilePart {
                field: UPLOAD_FIELD.to_owned(),
                file_name: file_name.to_owned(),
                mime: mime.to_owned(),
                bytes,
            }]);
        self.transport.fetch_json(&request).await
    }
}

fn supported_cad_type(file_name: &str) -> Result<CadFileType> {
    let file_type = CadFileType::from_filename(file_name);
    if file_type.is_supported() {
        Ok(file_type)
    } else {
        Err(ApiError::File(format!(
            "{file_name}: {}",
            file_type.info().description
        )))
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::File(format!("{}: not a file name", path.display())))
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::File(format!("{}: {e}", path.display())))
}

fn document_mime(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("dwg") => "image/vnd.dwg",
        Some("dxf") => "image/vnd.dxf",
        _ => "application/octet-stream",
    }
}
