//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Bucket, Transaction, Workspace, WorkspaceId};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Types of ledger records that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Workspace,
    Bucket,
    Transaction,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Workspace => write!(f, "Workspace"),
            EntityType::Bucket => write!(f, "Bucket"),
            EntityType::Transaction => write!(f, "Transaction"),
        }
    }
}

/// A single audit log entry
///
/// One entry per record touched by a committed ledger operation. Balance
/// updates carry the bucket before and after, so the log alone is enough to
/// replay how a balance moved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    pub entity_type: EntityType,

    pub entity_id: String,

    /// Workspace the record belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<WorkspaceId>,

    /// Human-readable label (bucket name, transaction description)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
}

impl AuditEntry {
    fn new(operation: Operation, entity_type: EntityType, entity_id: String) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            workspace_id: None,
            entity_name: None,
            before: None,
            after: None,
        }
    }

    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity: &T,
    ) -> Self {
        let mut entry = Self::new(Operation::Create, entity_type, entity_id.into());
        entry.after = serde_json::to_value(entity).ok();
        entry
    }

    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        before: &T,
        after: &T,
    ) -> Self {
        let mut entry = Self::new(Operation::Update, entity_type, entity_id.into());
        entry.before = serde_json::to_value(before).ok();
        entry.after = serde_json::to_value(after).ok();
        entry
    }

    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity: &T,
    ) -> Self {
        let mut entry = Self::new(Operation::Delete, entity_type, entity_id.into());
        entry.before = serde_json::to_value(entity).ok();
        entry
    }

    pub fn in_workspace(mut self, workspace_id: WorkspaceId) -> Self {
        self.workspace_id = Some(workspace_id);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.entity_name = Some(name);
        }
        self
    }

    /// Entry for a workspace change; `None` on either side marks create/delete
    pub fn workspace(before: Option<&Workspace>, after: Option<&Workspace>) -> Option<Self> {
        let (id, name) = match (before, after) {
            (_, Some(ws)) | (Some(ws), None) => (ws.id, ws.name.clone()),
            (None, None) => return None,
        };
        let entry = match (before, after) {
            (None, Some(a)) => Self::create(EntityType::Workspace, id.to_string(), a),
            (Some(b), Some(a)) => Self::update(EntityType::Workspace, id.to_string(), b, a),
            (Some(b), None) => Self::delete(EntityType::Workspace, id.to_string(), b),
            (None, None) => return None,
        };
        Some(entry.in_workspace(id).named(name))
    }

    /// Entry for a bucket change; `None` on either side marks create/delete
    pub fn bucket(before: Option<&Bucket>, after: Option<&Bucket>) -> Option<Self> {
        let (id, ws, name) = match (before, after) {
            (_, Some(b)) | (Some(b), None) => (b.id, b.workspace_id, b.name.clone()),
            (None, None) => return None,
        };
        let entry = match (before, after) {
            (None, Some(a)) => Self::create(EntityType::Bucket, id.to_string(), a),
            (Some(b), Some(a)) => Self::update(EntityType::Bucket, id.to_string(), b, a),
            (Some(b), None) => Self::delete(EntityType::Bucket, id.to_string(), b),
            (None, None) => return None,
        };
        Some(entry.in_workspace(ws).named(name))
    }

    pub fn transaction_created(txn: &Transaction) -> Self {
        Self::create(EntityType::Transaction, txn.id.to_string(), txn)
            .in_workspace(txn.workspace_id)
            .named(txn.description.clone())
    }

    pub fn transaction_updated(before: &Transaction, after: &Transaction) -> Self {
        Self::update(EntityType::Transaction, after.id.to_string(), before, after)
            .in_workspace(after.workspace_id)
            .named(after.description.clone())
    }

    pub fn transaction_deleted(txn: &Transaction) -> Self {
        Self::delete(EntityType::Transaction, txn.id.to_string(), txn)
            .in_workspace(txn.workspace_id)
            .named(txn.description.clone())
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketKind, Money, Percentage, TransactionKind, UserId};
    use chrono::NaiveDate;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Update.to_string(), "UPDATE");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_bucket_entries() {
        let ws = Workspace::new(UserId::new(), "Main", "USD");
        let before = Bucket::new(ws.id, "Food", BucketKind::Spending, Percentage::ZERO);
        let mut after = before.clone();
        after.current_balance = Money::from_cents(500);

        let created = AuditEntry::bucket(None, Some(&before)).unwrap();
        assert_eq!(created.operation, Operation::Create);
        assert!(created.before.is_none());
        assert_eq!(created.workspace_id, Some(ws.id));

        let updated = AuditEntry::bucket(Some(&before), Some(&after)).unwrap();
        assert_eq!(updated.operation, Operation::Update);
        assert_eq!(updated.after.as_ref().unwrap()["current_balance"], 500);
        assert_eq!(updated.entity_name.as_deref(), Some("Food"));

        let deleted = AuditEntry::bucket(Some(&after), None).unwrap();
        assert_eq!(deleted.operation, Operation::Delete);
        assert!(deleted.after.is_none());

        assert!(AuditEntry::bucket(None, None).is_none());
    }

    #[test]
    fn test_transaction_entry() {
        let ws = Workspace::new(UserId::new(), "Main", "USD");
        let bucket = Bucket::inbox(ws.id, "Inbox");
        let txn = Transaction::new(
            ws.id,
            bucket.id,
            TransactionKind::Income,
            Money::from_cents(100),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        )
        .with_description("Salary");

        let entry = AuditEntry::transaction_created(&txn);
        assert_eq!(entry.entity_type, EntityType::Transaction);
        assert_eq!(entry.entity_id, txn.id.to_string());

        let formatted = entry.format_human_readable();
        assert!(formatted.contains("CREATE"));
        assert!(formatted.contains("Transaction"));
        assert!(formatted.contains("Salary"));
    }

    #[test]
    fn test_serialization() {
        let ws = Workspace::new(UserId::new(), "Main", "USD");
        let entry = AuditEntry::workspace(None, Some(&ws)).unwrap();

        let json = serde_json::to_string(&entry).unwrap();
        let back: AuditEntry = serde_json::from_str(&json).unwrap();

        assert_eq!(back.operation, Operation::Create);
        assert_eq!(back.entity_type, EntityType::Workspace);
        assert_eq!(back.workspace_id, Some(ws.id));
    }
}
