//! Shared types and models for the Larder inventory platform
//!
//! This crate contains types shared between the backend and any future
//! front end or tooling built on top of it.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
