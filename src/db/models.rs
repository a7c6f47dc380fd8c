//! Database row types and shared domain enums.
//! Rows serialize with camelCase names matching the REST/WS wire format;
//! credential material is never serialized.

use serde::{Deserialize, Serialize};

/// Owner (manager) record in the owners table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRow {
    pub id: String,
    pub phone_number: String,
    #[serde(skip)]
    pub access_code: Option<String>,
    #[serde(skip)]
    pub access_code_expires_at: Option<String>,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Employee record in the employees table.
/// `role` here is the job title string ("Waiter", "Chef", ...), not the
/// auth role — every employee authenticates with auth role `employee`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department: String,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    #[serde(skip)]
    pub access_code: Option<String>,
    #[serde(skip)]
    pub access_code_expires_at: Option<String>,
    pub last_login: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Login credentials row; only the bcrypt hash is stored.
#[derive(Debug, Clone)]
pub struct CredentialsRow {
    pub employee_id: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Task priority. Stored as its kebab-case string in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Task workflow status. Stored as its kebab-case string in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

/// Task record in the tasks table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub assigned_to: String,
    pub created_by: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Chat message kind carried on the wire and stored per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Image,
    File,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "image" => Self::Image,
            "file" => Self::File,
            _ => Self::Text,
        }
    }
}

/// Chat message record. `participants` is derived from from/to on load and
/// always contains exactly those two ids; `pair_key` is the canonical chat
/// channel id of the pair, giving conversation retrieval a single-field
/// equality query.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: String,
    #[serde(skip)]
    pub pair_key: String,
    pub from: String,
    pub to: String,
    pub participants: [String; 2],
    pub message: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    /// Unix milliseconds
    pub timestamp: i64,
    pub created_at: String,
}
