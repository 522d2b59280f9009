//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Entity was created
    Create,
    /// Entity was updated
    Update,
    /// Entity was deleted
    Delete,
    /// An asset balance moved through the clamped adjuster
    Adjust,
    /// All collections were replaced from a backup
    Restore,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Adjust => write!(f, "ADJUST"),
            Operation::Restore => write!(f, "RESTORE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Asset,
    Record,
    Loan,
    Store,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Asset => write!(f, "Asset"),
            EntityKind::Record => write!(f, "Record"),
            EntityKind::Loan => write!(f, "Loan"),
            EntityKind::Store => write!(f, "Store"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// Type of entity affected
    pub entity: EntityKind,

    /// ID of the affected entity
    pub entity_id: String,

    /// Human-readable description of the entity (e.g., asset name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Human-readable summary of what changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AuditEntry {
    fn new(
        operation: Operation,
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        summary: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity,
            entity_id: entity_id.into(),
            entity_name,
            summary,
        }
    }

    /// Entry for a create operation
    pub fn create(
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self::new(Operation::Create, entity, entity_id, entity_name, None)
    }

    /// Entry for an update operation
    pub fn update(
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        summary: Option<String>,
    ) -> Self {
        Self::new(Operation::Update, entity, entity_id, entity_name, summary)
    }

    /// Entry for a delete operation
    pub fn delete(
        entity: EntityKind,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
    ) -> Self {
        Self::new(Operation::Delete, entity, entity_id, entity_name, None)
    }

    /// Entry for a balance adjustment
    pub fn adjust(
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        summary: String,
    ) -> Self {
        Self::new(
            Operation::Adjust,
            EntityKind::Asset,
            entity_id,
            entity_name,
            Some(summary),
        )
    }

    /// Entry for a restore from backup
    pub fn restore(summary: String) -> Self {
        Self::new(
            Operation::Restore,
            EntityKind::Store,
            "store",
            None,
            Some(summary),
        )
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(summary) = &self.summary {
            output.push_str(&format!(": {}", summary));
        }

        output
    }
}
