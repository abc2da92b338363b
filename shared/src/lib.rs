//! Shared types and models for the AgriSense crop intelligence platform
//!
//! This crate contains the record, label, and report types shared between the
//! prediction engine, the browser bindings (via WASM), and other components.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
