//! Reference option lists: machining coefficients and materials.
//!
//! The backend sends `{ id, label }` items. Selection inputs consume
//! `{ value, label }`, so every list is re-keyed on arrival.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// An option as consumed by selection inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceOption {
    /// Backend id sent back when the option is chosen.
    pub value: String,
    /// Human readable label.
    pub label: String,
}

impl ReferenceOption {
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// An item as sent by the backend.
///
/// Ids arrive as strings or numbers depending on the endpoint. Older
/// backends named the label `value`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawReferenceItem {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(alias = "value")]
    pub label: String,
}

impl From<RawReferenceItem> for ReferenceOption {
    fn from(item: RawReferenceItem) -> Self {
        Self {
            value: item.id,
            label: item.label,
        }
    }
}

/// Re-key a backend list into selection options, preserving order.
#[must_use]
pub fn to_options(items: Vec<RawReferenceItem>) -> Vec<ReferenceOption> {
    items.into_iter().map(ReferenceOption::from).collect()
}

/// Drop options whose `value` was already seen; the first occurrence wins.
#[must_use]
pub fn dedup_by_value(options: Vec<ReferenceOption>) -> Vec<ReferenceOption> {
    let mut seen = HashSet::new();
    options
        .into_iter()
        .filter(|option| seen.insert(option.value.clone()))
        .collect()
}

// =============================================================================
// Coefficients
// =============================================================================

/// Coefficient option lists used by the price calculator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coefficients {
    /// Surface roughness (Ra) options.
    pub finish: Vec<ReferenceOption>,
    /// Coating options.
    pub cover: Vec<ReferenceOption>,
    /// Tolerance grade options.
    pub tolerance: Vec<ReferenceOption>,
}

impl Coefficients {
    /// True when every list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.finish.is_empty() && self.cover.is_empty() && self.tolerance.is_empty()
    }
}

/// `/coefficients` response body. Missing lists are treated as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawCoefficients {
    #[serde(deserialize_with = "list_or_null")]
    pub finish: Vec<RawReferenceItem>,
    #[serde(deserialize_with = "list_or_null")]
    pub cover: Vec<RawReferenceItem>,
    #[serde(deserialize_with = "list_or_null")]
    pub tolerance: Vec<RawReferenceItem>,
}

impl From<RawCoefficients> for Coefficients {
    fn from(raw: RawCoefficients) -> Self {
        Self {
            finish: to_options(raw.finish),
            cover: to_options(raw.cover),
            tolerance: to_options(raw.tolerance),
        }
    }
}

// =============================================================================
// Materials
// =============================================================================

/// `/materials?process=<id>` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMaterials {
    #[serde(deserialize_with = "list_or_null")]
    pub materials: Vec<RawReferenceItem>,
}

impl From<RawMaterials> for Vec<ReferenceOption> {
    fn from(raw: RawMaterials) -> Self {
        to_options(raw.materials)
    }
}

/// Manufacturing process a material set belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ManufacturingProcess {
    /// CNC turning.
    #[default]
    CncLathe,
    /// CNC milling.
    CncMilling,
    /// Additive manufacturing.
    Printing,
    /// Painting and coating.
    Painting,
    /// Composite layup.
    Composite,
    /// Any process id this build does not know about.
    Other(String),
}

impl ManufacturingProcess {
    /// Processes whose materials make up the combined catalogue.
    pub const CATALOGUE: [Self; 2] = [Self::CncLathe, Self::Printing];

    /// The id used in the `process` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CncLathe => "cnc-lathe",
            Self::CncMilling => "cnc-milling",
            Self::Printing => "printing",
            Self::Painting => "painting",
            Self::Composite => "composite",
            Self::Other(id) => id,
        }
    }

    /// Materials offered when the backend cannot be reached.
    ///
    /// Only turning has a built-in list; other processes degrade to empty.
    #[must_use]
    pub fn fallback_materials(&self) -> Vec<ReferenceOption> {
        match self {
            Self::CncLathe => vec![
                ReferenceOption::new("alum_D16T", "Алюминий Д16Т"),
                ReferenceOption::new("steel_12X18H10T", "Сталь 12Х18Н10Т"),
            ],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for ManufacturingProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ManufacturingProcess {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "cnc-lathe" => Self::CncLathe,
            "cnc-milling" => Self::CncMilling,
            "printing" => Self::Printing,
            "painting" => Self::Painting,
            "composite" => Self::Composite,
            other => Self::Other(other.to_owned()),
        })
    }
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(n) => n.to_string(),
    })
}

fn list_or_null<'de, D>(deserializer: D) -> Result<Vec<RawReferenceItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<RawReferenceItem>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
