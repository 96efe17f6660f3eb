//! Newtype IDs for backend entity references.
//!
//! The backend numbers orders, kits, uploaded files and documents with plain
//! integers. `define_id!` wraps each one so a file id can never be sent where
//! a document id is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use order_portal_core::define_id;
/// define_id!(FileId);
/// define_id!(DocumentId);
///
/// let file_id = FileId::new(7);
/// let document_id = DocumentId::new(7);
///
/// // These are different types, so this won't compile:
/// // let _: FileId = document_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(OrderId);
define_id!(KitId);
define_id!(FileId);
define_id!(DocumentId);
define_id!(CalculationId);
define_id!(DealId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_number() {
        let id = FileId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: FileId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_conversions() {
        let id: OrderId = 15.into();
        assert_eq!(id.as_i64(), 15);
        assert_eq!(i64::from(id), 15);
        assert_eq!(id.to_string(), "15");
    }
}
