//! Audit log models
//!
//! The transaction log is append-only: written by every mutating operation,
//! read only by operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of operation recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Search,
    CreateLocation,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Search => "SEARCH",
            Operation::CreateLocation => "CREATE_LOCATION",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(Operation::Create),
            "UPDATE" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            "SEARCH" => Some(Operation::Search),
            "CREATE_LOCATION" => Some(Operation::CreateLocation),
            _ => None,
        }
    }
}

/// Status of a logged transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Confirmed => "CONFIRMED",
            TransactionStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TransactionStatus::Pending),
            "CONFIRMED" => Some(TransactionStatus::Confirmed),
            "REJECTED" => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }
}

/// One audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionLog {
    pub id: Uuid,
    pub inventory_id: Uuid,
    pub operation: String,
    pub item_id: Option<Uuid>,
    pub data: Option<serde_json::Value>,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}
