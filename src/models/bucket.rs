//! Bucket model
//!
//! A bucket is a purpose-based sub-account of a workspace. Every workspace
//! has exactly one INBOX bucket flagged `is_default`, which receives postings
//! without an explicit bucket and the remainder of auto-allocated income.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ids::{BucketId, WorkspaceId};
use super::money::Money;
use super::percentage::Percentage;

/// Kind of bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum BucketKind {
    /// Day-to-day spending money
    #[default]
    Spending,
    /// Money set aside to grow
    Investment,
    /// The workspace's default catch-all bucket
    Inbox,
}

impl BucketKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "spending" => Some(Self::Spending),
            "investment" | "invest" => Some(Self::Investment),
            "inbox" => Some(Self::Inbox),
            _ => None,
        }
    }
}

impl fmt::Display for BucketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spending => write!(f, "Spending"),
            Self::Investment => write!(f, "Investment"),
            Self::Inbox => write!(f, "Inbox"),
        }
    }
}

/// A named sub-account of a workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: BucketId,

    pub workspace_id: WorkspaceId,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: BucketKind,

    /// Target share of allocated income; always zero for the inbox
    #[serde(default)]
    pub allocation_percentage: Percentage,

    /// Signed; expenses may push it below zero
    pub current_balance: Money,

    /// Net credits received through posting, allocation, transfer and distribution
    pub total_allocated: Money,

    /// Cumulative expense debits
    pub total_spent: Money,

    #[serde(default)]
    pub is_default: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bucket {
    /// Create an empty non-inbox bucket
    pub fn new(
        workspace_id: WorkspaceId,
        name: impl Into<String>,
        kind: BucketKind,
        allocation_percentage: Percentage,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: BucketId::new(),
            workspace_id,
            name: name.into(),
            kind,
            allocation_percentage,
            current_balance: Money::zero(),
            total_allocated: Money::zero(),
            total_spent: Money::zero(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the default inbox bucket for a workspace
    pub fn inbox(workspace_id: WorkspaceId, name: impl Into<String>) -> Self {
        let mut bucket = Self::new(workspace_id, name, BucketKind::Inbox, Percentage::ZERO);
        bucket.is_default = true;
        bucket
    }

    pub fn is_inbox(&self) -> bool {
        self.is_default || self.kind == BucketKind::Inbox
    }

    /// True if this bucket takes part in percentage allocation
    pub fn receives_allocation(&self) -> bool {
        !self.is_inbox() && !self.allocation_percentage.is_zero()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Case-insensitive name match, also accepting the id forms
    pub fn matches(&self, text: &str) -> bool {
        self.id.matches(text) || self.name.eq_ignore_ascii_case(text.trim())
    }

    /// Listing order: largest allocation first, then by name
    pub fn display_order(a: &Bucket, b: &Bucket) -> Ordering {
        b.allocation_percentage
            .cmp(&a.allocation_percentage)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    }

    pub fn validate(&self) -> Result<(), BucketValidationError> {
        if self.name.trim().is_empty() {
            return Err(BucketValidationError::EmptyName);
        }
        if self.name.len() > 50 {
            return Err(BucketValidationError::NameTooLong(self.name.len()));
        }
        if self.is_default != (self.kind == BucketKind::Inbox) {
            return Err(BucketValidationError::InboxFlagMismatch);
        }
        if self.kind == BucketKind::Inbox && !self.allocation_percentage.is_zero() {
            return Err(BucketValidationError::InboxAllocation);
        }
        Ok(())
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketValidationError {
    EmptyName,
    NameTooLong(usize),
    InboxFlagMismatch,
    InboxAllocation,
}

impl fmt::Display for BucketValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Bucket name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Bucket name too long ({} chars, max 50)", len),
            Self::InboxFlagMismatch => {
                write!(f, "Only the INBOX bucket may be the default bucket")
            }
            Self::InboxAllocation => write!(f, "The inbox cannot have an allocation percentage"),
        }
    }
}

impl std::error::Error for BucketValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbox_constructor() {
        let inbox = Bucket::inbox(WorkspaceId::new(), "Inbox");
        assert!(inbox.is_default);
        assert!(inbox.is_inbox());
        assert_eq!(inbox.kind, BucketKind::Inbox);
        assert!(!inbox.receives_allocation());
        assert!(inbox.validate().is_ok());
    }

    #[test]
    fn test_receives_allocation() {
        let ws = WorkspaceId::new();
        let food = Bucket::new(ws, "Food", BucketKind::Spending, Percentage::whole(20).unwrap());
        let idle = Bucket::new(ws, "Idle", BucketKind::Spending, Percentage::ZERO);
        assert!(food.receives_allocation());
        assert!(!idle.receives_allocation());
    }

    #[test]
    fn test_validation() {
        let ws = WorkspaceId::new();
        let mut bucket = Bucket::new(ws, "  ", BucketKind::Spending, Percentage::ZERO);
        assert_eq!(bucket.validate(), Err(BucketValidationError::EmptyName));

        bucket.name = "Food".into();
        bucket.is_default = true;
        assert_eq!(
            bucket.validate(),
            Err(BucketValidationError::InboxFlagMismatch)
        );

        let mut inbox = Bucket::inbox(ws, "Inbox");
        inbox.allocation_percentage = Percentage::whole(5).unwrap();
        assert_eq!(inbox.validate(), Err(BucketValidationError::InboxAllocation));
    }

    #[test]
    fn test_display_order() {
        let ws = WorkspaceId::new();
        let mut buckets = vec![
            Bucket::new(ws, "Fun", BucketKind::Spending, Percentage::whole(10).unwrap()),
            Bucket::inbox(ws, "Inbox"),
            Bucket::new(ws, "Rent", BucketKind::Spending, Percentage::whole(50).unwrap()),
            Bucket::new(ws, "Bonds", BucketKind::Investment, Percentage::whole(10).unwrap()),
        ];
        buckets.sort_by(Bucket::display_order);
        let names: Vec<_> = buckets.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Bonds", "Fun", "Inbox"]);
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&BucketKind::Investment).unwrap(),
            "\"INVESTMENT\""
        );
        assert_eq!(BucketKind::parse("inbox"), Some(BucketKind::Inbox));
        assert_eq!(BucketKind::parse("nope"), None);
    }

    #[test]
    fn test_matches_name_or_id() {
        let bucket = Bucket::new(WorkspaceId::new(), "Food", BucketKind::Spending, Percentage::ZERO);
        assert!(bucket.matches("food"));
        assert!(bucket.matches(&bucket.id.short()));
        assert!(!bucket.matches("rent"));
    }
}
