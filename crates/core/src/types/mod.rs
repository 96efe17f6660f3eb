//! Core types for the order portal.
//!
//! This module provides the domain shapes and pure helpers shared by the
//! client library and the CLI.

pub mod contact;
pub mod files;
pub mod id;
pub mod order;
pub mod profile;
pub mod reference;
pub mod status;
pub mod version;

pub use contact::{Email, EmailError, Phone, PhoneError, normalize_phone_input};
pub use files::{CadFileType, CadFileTypeInfo, parse_file_id_list, parse_file_ids};
pub use id::*;
pub use order::{Kit, OrderBase, OrderPayload, OrderResponse, PriceBreakdown};
pub use profile::{
    AddressParts, NameParts, Profile, build_full_name, parse_address, parse_full_name,
};
pub use reference::{
    Coefficients, ManufacturingProcess, RawCoefficients, RawMaterials, RawReferenceItem,
    ReferenceOption, dedup_by_value, to_options,
};
pub use status::{hide_price, status_text};
pub use version::{compare_versions, is_api_version_compatible};
