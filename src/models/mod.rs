//! Core data models for the bucket ledger
//!
//! Workspaces, buckets and transactions, plus the money and percentage
//! types every balance passes through.

pub mod bucket;
pub mod distribution;
pub mod ids;
pub mod money;
pub mod percentage;
pub mod transaction;
pub mod workspace;

pub use bucket::{Bucket, BucketKind};
pub use distribution::{DistributionShare, DistributionTarget};
pub use ids::{BucketId, DistributionId, TransactionId, UserId, WorkspaceId};
pub use money::Money;
pub use percentage::Percentage;
pub use transaction::{AllocationLeg, Transaction, TransactionKind, TransactionLink};
pub use workspace::Workspace;
