//! Version information.

use order_portal_core::version::{API_VERSION, MIN_API_VERSION, version_display};
use order_portal_core::is_api_version_compatible;

/// Show versions, and optionally whether a backend version is supported.
pub fn show(check: Option<&str>) {
    tracing::info!(
        "portal-cli {} (API {API_VERSION}, requires >= {MIN_API_VERSION})",
        version_display()
    );

    if let Some(api_version) = check {
        if is_api_version_compatible(api_version) {
            tracing::info!("API {api_version} is supported");
        } else {
            tracing::warn!("API {api_version} is older than {MIN_API_VERSION}; update the backend");
        }
    }
}
