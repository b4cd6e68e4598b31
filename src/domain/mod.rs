//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs` — Rich domain types
//! - `wire.rs` — Raw serde structs matching backend responses
//! - `convert.rs` — Conversions from raw fields with validation
//! - `state.rs` — State containers and read-only projections

pub mod portfolio;
