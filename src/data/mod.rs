//! Data-serving agent (Mill)
//!
//! The router only sees the [`DataService`] trait. [`InMemoryLedger`] is the
//! bundled implementation.

pub mod ledger;

pub use ledger::{DEFAULT_MAX_TRANSACTIONS, InMemoryLedger, Transaction, TransactionKind};

use crate::router::DataRequest;
use async_trait::async_trait;

/// Failures from a data agent
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    /// The request type is not something this agent answers
    #[error("unsupported data request '{kind}'")]
    Unsupported { kind: &'static str },

    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    /// Backing store could not be reached
    #[error("data store unavailable: {0}")]
    Unavailable(String),
}

/// Answers data requests with a ready-to-show response
#[async_trait]
pub trait DataService: Send + Sync {
    async fn fetch(&self, request: &DataRequest) -> Result<String, DataError>;
}
