//! # keygate-common
//!
//! Token types, signing configuration, error taxonomy, and application
//! configuration shared by the keygate crates.

pub mod auth;
pub mod config;
pub mod error;
