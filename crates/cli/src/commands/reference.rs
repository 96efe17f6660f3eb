//! Reference data listings.

use order_portal_client::{ApiError, PortalClient};
use order_portal_core::{ManufacturingProcess, ReferenceOption};

fn list(title: &str, options: &[ReferenceOption]) {
    tracing::info!("{title} ({}):", options.len());
    for option in options {
        tracing::info!("  {:<24} {}", option.value, option.label);
    }
}

/// List coefficient options.
pub async fn coefficients(client: &PortalClient) -> Result<(), ApiError> {
    let coefficients = client.coefficients().get().await?;
    list("Finish", &coefficients.finish);
    list("Cover", &coefficients.cover);
    list("Tolerance", &coefficients.tolerance);
    Ok(())
}

/// List materials for one process, or the combined catalogue.
pub async fn materials(client: &PortalClient, process: Option<&str>) -> Result<(), ApiError> {
    match process {
        Some(id) => {
            let Ok(process) = id.parse::<ManufacturingProcess>();
            let materials = client.materials().for_process(&process).await;
            list(&format!("Materials for {process}"), &materials);
        }
        None => {
            let materials = client.materials().all().await?;
            list("Materials", &materials);
        }
    }
    Ok(())
}
