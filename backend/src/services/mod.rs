//! Business logic services

pub mod audit;
pub mod auth;
pub mod inventory;
pub mod item;
pub mod location;
pub mod lot;
pub mod search;

pub use audit::AuditService;
pub use auth::AuthService;
pub use inventory::InventoryService;
pub use item::ItemService;
pub use location::LocationService;
pub use lot::LotService;
pub use search::SearchService;
