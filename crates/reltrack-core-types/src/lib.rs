//! Core types shared across reltrack facilities
//!
//! This crate provides the canonical field keys and event names used by
//! the structured logging and error facilities of `reltrack-core`.

pub mod schema;
