//! Order Portal Core - Shared types library.
//!
//! This crate provides the types shared by every part of the order portal:
//! - `client` - REST transport, session, profile and reference-data caches
//! - `cli` - Command-line front end driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Ids, contact fields, profile parsing, reference options,
//!   order DTOs, status texts, file helpers and version checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
