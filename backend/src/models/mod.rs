//! Database models for the Larder backend
//!
//! Re-exports models from the shared crate.

pub use shared::models::*;
