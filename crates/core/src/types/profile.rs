//! User profile and the fields derived from its flat strings.
//!
//! The backend stores the postal address and the full name as single
//! strings. The profile page edits them as separate inputs, so every load
//! splits them:
//!
//! - `address` on `,` into postal code, region, city, street, building and
//!   apartment (positional, trailing parts beyond the sixth are dropped)
//! - `full_name` on whitespace into last, first and patronymic name
//!
//! Derived fields are never the source of truth. They are recomputed from the
//! flat strings on every load, and `full_name` is rebuilt from the name parts
//! before an update is sent.

use serde::{Deserialize, Deserializer, Serialize};

/// Address components in the order they appear in the flat address string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressParts {
    #[serde(deserialize_with = "string_or_null")]
    pub postal_code: String,
    #[serde(deserialize_with = "string_or_null")]
    pub region: String,
    #[serde(deserialize_with = "string_or_null")]
    pub city: String,
    #[serde(deserialize_with = "string_or_null")]
    pub street: String,
    #[serde(deserialize_with = "string_or_null")]
    pub building: String,
    #[serde(deserialize_with = "string_or_null")]
    pub apartment: String,
}

impl AddressParts {
    /// Number of positional slots an address is split into.
    pub const SLOTS: usize = 6;

    /// Split a flat address on commas and assign the parts positionally.
    ///
    /// Each part is trimmed. A blank address yields all-empty parts.
    #[must_use]
    pub fn parse(address: &str) -> Self {
        let mut parts = Self::default();
        if address.trim().is_empty() {
            return parts;
        }

        let slots = [
            &mut parts.postal_code,
            &mut parts.region,
            &mut parts.city,
            &mut parts.street,
            &mut parts.building,
            &mut parts.apartment,
        ];
        for (slot, value) in slots.into_iter().zip(address.split(',')) {
            value.trim().clone_into(slot);
        }
        parts
    }

    /// Join the non-empty parts with `", "`.
    #[must_use]
    pub fn join(&self) -> String {
        [
            &self.postal_code,
            &self.region,
            &self.city,
            &self.street,
            &self.building,
            &self.apartment,
        ]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Name components of a Russian-style full name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameParts {
    #[serde(deserialize_with = "string_or_null")]
    pub last_name: String,
    #[serde(deserialize_with = "string_or_null")]
    pub first_name: String,
    #[serde(deserialize_with = "string_or_null")]
    pub patronymic: String,
}

impl NameParts {
    /// Split a full name on whitespace into last, first and patronymic name.
    ///
    /// Words beyond the third are kept in `patronymic` so no input is lost.
    #[must_use]
    pub fn parse(full_name: &str) -> Self {
        let mut words = full_name.split_whitespace();
        let last_name = words.next().unwrap_or_default().to_owned();
        let first_name = words.next().unwrap_or_default().to_owned();
        let patronymic = words.collect::<Vec<_>>().join(" ");
        Self {
            last_name,
            first_name,
            patronymic,
        }
    }
}

/// Rebuild the flat full name: non-empty parts joined by a single space.
#[must_use]
pub fn build_full_name(parts: &NameParts) -> String {
    [&parts.last_name, &parts.first_name, &parts.patronymic]
        .into_iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a flat full name. Shorthand for [`NameParts::parse`].
#[must_use]
pub fn parse_full_name(full_name: &str) -> NameParts {
    NameParts::parse(full_name)
}

/// Split a flat address. Shorthand for [`AddressParts::parse`].
#[must_use]
pub fn parse_address(address: &str) -> AddressParts {
    AddressParts::parse(address)
}

/// Profile as returned by `/profile`, enriched with derived fields.
///
/// The serialized form is flat: derived fields sit next to the server
/// fields, which is also the shape written to durable storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    #[serde(deserialize_with = "string_or_null")]
    pub username: String,
    #[serde(deserialize_with = "string_or_null")]
    pub email: String,
    #[serde(deserialize_with = "string_or_null")]
    pub phone: String,
    /// Flat postal address, comma separated.
    #[serde(deserialize_with = "string_or_null")]
    pub address: String,
    /// Flat full name, whitespace separated.
    #[serde(deserialize_with = "string_or_null")]
    pub full_name: String,
    #[serde(flatten)]
    pub address_parts: AddressParts,
    #[serde(flatten)]
    pub name_parts: NameParts,
}

impl Profile {
    /// Recompute every derived field from the flat strings.
    pub fn derive_fields(&mut self) {
        self.address_parts = AddressParts::parse(&self.address);
        self.name_parts = NameParts::parse(&self.full_name);
    }

    /// Consume the profile and return it with derived fields recomputed.
    #[must_use]
    pub fn with_derived_fields(mut self) -> Self {
        self.derive_fields();
        self
    }

    /// Rebuild `full_name` from the (possibly edited) name parts.
    ///
    /// Other flat fields are left exactly as given.
    pub fn rebuild_full_name(&mut self) {
        self.full_name = build_full_name(&self.name_parts);
    }

    /// Display name: the full name when present, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
