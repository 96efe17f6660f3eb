//! Client/backend version compatibility.

use std::cmp::Ordering;

/// Version of the client, as reported to users.
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend API version this client is written against.
pub const API_VERSION: &str = "3.0.0";

/// Oldest backend API version this client still works with.
pub const MIN_API_VERSION: &str = "3.0.0";

/// Compare dotted versions numerically. Missing or non-numeric parts
/// count as zero, so `3.0` equals `3.0.0`.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| part.parse().unwrap_or(0))
            .collect()
    };
    let (left, right) = (parse(a), parse(b));
    let len = left.len().max(right.len());

    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Whether a backend reporting `api_version` is supported.
#[must_use]
pub fn is_api_version_compatible(api_version: &str) -> bool {
    compare_versions(api_version, MIN_API_VERSION).is_ge()
}

/// Short version label, e.g. `v0.1.0`.
#[must_use]
pub fn version_display() -> String {
    format!("v{CLIENT_VERSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_versions() {
        assert_eq!(compare_versions("3.0.0", "3.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("3.0", "3.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("3.1.0", "3.0.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.9", "3"), Ordering::Less);
        assert_eq!(compare_versions("3.10", "3.9"), Ordering::Greater);
    }

    #[test]
    fn test_api_compatibility() {
        assert!(is_api_version_compatible("3.0.0"));
        assert!(is_api_version_compatible("3.2.1"));
        assert!(!is_api_version_compatible("2.5.0"));
    }

    #[test]
    fn test_version_display() {
        assert!(version_display().starts_with('v'));
    }
}
