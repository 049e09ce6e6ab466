//! Domain models for the Larder inventory platform

mod audit;
mod inventory;
mod item;
mod location;
mod lot;
mod user;

pub use audit::*;
pub use inventory::*;
pub use item::*;
pub use location::*;
pub use lot::*;
pub use user::*;
