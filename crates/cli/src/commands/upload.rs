//! File uploads.

use std::path::Path;

use order_portal_client::PortalClient;
use order_portal_core::CadFileType;

use super::InputError;

/// Upload a CAD model, or a document when `document` is set.
pub async fn upload(
    client: &PortalClient,
    path: &Path,
    document: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !client.session().is_authenticated() {
        return Err(InputError::NotLoggedIn.into());
    }

    if document {
        let uploaded = client.files().upload_document(path).await?;
        tracing::info!("Document {} stored as #{}", uploaded.filename, uploaded.id);
    } else {
        let uploaded = client.files().upload_cad(path).await?;
        let info = CadFileType::from_filename(&path.to_string_lossy()).info();
        tracing::info!(
            "{} model {} stored as #{} ({})",
            info.name,
            uploaded.filename,
            uploaded.id,
            info.description
        );
    }
    Ok(())
}
