//! HTTP request handlers

pub mod audit;
pub mod auth;
pub mod chat;
pub mod health;
pub mod inventory;
pub mod item;
pub mod location;
pub mod lot;
pub mod notification;
pub mod search;
pub mod trash;
