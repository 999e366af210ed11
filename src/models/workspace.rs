//! Workspace model
//!
//! A workspace is a currency-denominated container of buckets owned by one
//! user. Its `total_balance` caches the sum of its buckets' balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{UserId, WorkspaceId};
use super::money::Money;

/// A currency container holding a set of buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,

    /// Owning user; access is checked by the caller
    pub owner_id: UserId,

    pub name: String,

    /// ISO 4217 currency code (e.g. "USD", "BRL")
    pub currency: String,

    /// Cached aggregate, always equal to the sum of bucket balances
    pub total_balance: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Create a workspace with a zero balance
    pub fn new(owner_id: UserId, name: impl Into<String>, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: WorkspaceId::new(),
            owner_id,
            name: name.into(),
            currency: currency.into().trim().to_uppercase(),
            total_balance: Money::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Format an amount in this workspace's currency
    pub fn format(&self, amount: Money) -> String {
        amount.format_with_code(&self.currency)
    }

    pub fn validate(&self) -> Result<(), WorkspaceValidationError> {
        if self.name.trim().is_empty() {
            return Err(WorkspaceValidationError::EmptyName);
        }
        if self.name.len() > 100 {
            return Err(WorkspaceValidationError::NameTooLong(self.name.len()));
        }
        if !is_currency_code(&self.currency) {
            return Err(WorkspaceValidationError::InvalidCurrency(
                self.currency.clone(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidCurrency(String),
}

impl fmt::Display for WorkspaceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Workspace name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Workspace name too long ({} chars, max 100)", len)
            }
            Self::InvalidCurrency(code) => {
                write!(f, "Currency must be a 3-letter ISO code, got '{}'", code)
            }
        }
    }
}

impl std::error::Error for WorkspaceValidationError {}
