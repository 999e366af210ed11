//! Service layer for the bucket ledger
//!
//! Services sit on top of the storage layer and run every ledger operation
//! as one unit of work: validate, stage row changes, commit.

pub mod bucket;
pub mod distribution;
pub mod inbox;
pub mod transaction;
pub mod transfer;
pub mod workspace;

pub use bucket::{BucketService, CreateBucketInput, UpdateBucketInput};
pub use distribution::{DistributeInput, DistributionOutcome, DistributionReceipt, DistributionService};
pub use inbox::{resolve_inbox, resolve_target_bucket};
pub use transaction::{
    allocate_income, ImportRow, PostTransactionInput, TransactionFilter, TransactionService,
};
pub use transfer::{TransferResult, TransferService};
pub use workspace::{BalanceReport, WorkspaceService};
