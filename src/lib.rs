//! bucket-ledger - workspace/bucket cash ledger
//!
//! Money in a workspace lives in buckets. Income and expenses are posted to
//! buckets (or fanned out by allocation percentage), transfers move a fixed
//! amount between two buckets, and distributions spread part of one bucket
//! across others. Every operation commits all of its row changes together
//! or none of them.
//!
//! # Architecture
//!
//! - `config`: Path and settings management
//! - `error`: Custom error types
//! - `models`: Workspaces, buckets, transactions, money and percentages
//! - `storage`: JSON snapshot store with units of work
//! - `services`: Ledger operations
//! - `audit`: Audit logging system
//! - `display`: Terminal formatting for the CLI
//!
//! # Example
//!
//! ```rust,ignore
//! use bucket_ledger::config::{LedgerPaths, Settings};
//! use bucket_ledger::storage::Storage;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
