//! In-memory transaction ledger
//!
//! Lives for the lifetime of the process. An optional JSON seed file
//! pre-populates it at startup. Holds at most `max_transactions` entries;
//! recording past the limit evicts the oldest.

use super::{DataError, DataService};
use crate::error::{AppError, AppResult};
use crate::router::DataRequest;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        amount: f64,
        description: &str,
    ) -> Result<Self, DataError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(DataError::InvalidEntry(format!(
                "amount must be a non-negative number, got {amount}"
            )));
        }
        let description = description.trim();
        if description.is_empty() {
            return Err(DataError::InvalidEntry(
                "description cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            amount,
            description: description.to_string(),
        })
    }
}

/// Seed file row: `{"kind": "expense", "amount": 120.0, "description": "chai"}`
#[derive(Debug, Deserialize)]
struct SeedEntry {
    kind: TransactionKind,
    amount: f64,
    description: String,
}

/// Default cap on retained transactions
pub const DEFAULT_MAX_TRANSACTIONS: usize = 10_000;

/// Process-lifetime ledger guarded by an async `RwLock`
#[derive(Debug)]
pub struct InMemoryLedger {
    currency: String,
    max_transactions: usize,
    transactions: RwLock<VecDeque<Transaction>>,
}

impl InMemoryLedger {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
            transactions: RwLock::new(VecDeque::new()),
        }
    }

    /// Retain at most `max` transactions (minimum 1), dropping the oldest
    /// already loaded entries if there are more
    pub fn with_max_transactions(mut self, max: usize) -> Self {
        self.max_transactions = max.max(1);
        let transactions = self.transactions.get_mut();
        let excess = transactions.len().saturating_sub(self.max_transactions);
        if excess > 0 {
            tracing::warn!(
                dropped = excess,
                max_transactions = self.max_transactions,
                "Ledger holds more entries than allowed, dropping the oldest"
            );
            transactions.drain(..excess);
        }
        self
    }

    pub fn max_transactions(&self) -> usize {
        self.max_transactions
    }

    /// Load a ledger from a JSON array of seed entries
    ///
    /// # Errors
    ///
    /// Returns `AppError::LedgerSeed` if the file cannot be read, is not
    /// valid JSON, or contains an invalid entry.
    pub fn from_seed_file(path: impl AsRef<Path>, currency: impl Into<String>) -> AppResult<Self> {
        let path = path.as_ref();
        let seed_error = |reason: String| AppError::LedgerSeed {
            path: path.display().to_string(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| seed_error(e.to_string()))?;
        let entries: Vec<SeedEntry> =
            serde_json::from_str(&contents).map_err(|e| seed_error(e.to_string()))?;

        let transactions = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                Transaction::new(entry.kind, entry.amount, &entry.description)
                    .map_err(|e| seed_error(format!("entry {index}: {e}")))
            })
            .collect::<AppResult<VecDeque<_>>>()?;

        tracing::info!(
            path = %path.display(),
            transaction_count = transactions.len(),
            "Loaded ledger seed file"
        );

        Ok(Self {
            currency: currency.into(),
            max_transactions: DEFAULT_MAX_TRANSACTIONS,
            transactions: RwLock::new(transactions),
        })
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }

    /// Snapshot of all transactions, oldest first
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().await.iter().cloned().collect()
    }

    fn money(&self, amount: f64) -> String {
        format!("{} {:.2}", self.currency, amount)
    }

    async fn record(
        &self,
        kind: TransactionKind,
        amount: f64,
        description: &str,
    ) -> Result<Transaction, DataError> {
        let transaction = Transaction::new(kind, amount, description)?;
        {
            let mut transactions = self.transactions.write().await;
            while transactions.len() >= self.max_transactions {
                if let Some(evicted) = transactions.pop_front() {
                    tracing::debug!(id = %evicted.id, "Evicted oldest transaction");
                }
            }
            transactions.push_back(transaction.clone());
        }
        tracing::debug!(
            id = %transaction.id,
            kind = kind.as_str(),
            amount,
            "Recorded transaction"
        );
        Ok(transaction)
    }

    async fn summary(&self) -> String {
        let transactions = self.transactions.read().await;
        if transactions.is_empty() {
            return "No transactions recorded yet.".to_string();
        }

        let (mut spent, mut expenses, mut received, mut incomes) = (0.0, 0usize, 0.0, 0usize);
        for t in transactions.iter() {
            match t.kind {
                TransactionKind::Expense => {
                    spent += t.amount;
                    expenses += 1;
                }
                TransactionKind::Income => {
                    received += t.amount;
                    incomes += 1;
                }
            }
        }

        format!(
            "Summary: spent {} across {} {}, received {} across {} {}. Net: {}.",
            self.money(spent),
            expenses,
            plural(expenses, "expense", "expenses"),
            self.money(received),
            incomes,
            plural(incomes, "income entry", "income entries"),
            self.money(received - spent),
        )
    }

    async fn recent(&self, count: u32) -> String {
        let transactions = self.transactions.read().await;
        if transactions.is_empty() {
            return "No transactions recorded yet.".to_string();
        }

        let shown: Vec<&Transaction> = transactions
            .iter()
            .rev()
            .take(count as usize)
            .collect();

        let mut response = format!(
            "Last {} {}:",
            shown.len(),
            plural(shown.len(), "transaction", "transactions")
        );
        for t in shown {
            response.push_str(&format!(
                "\n- {} {} {}",
                t.kind.as_str(),
                self.money(t.amount),
                t.description
            ));
        }
        response
    }

    async fn overview(&self) -> String {
        let count = self.len().await;
        format!(
            "You have {} {} recorded. Ask for a summary or your last 5 transactions.",
            count,
            plural(count, "transaction", "transactions")
        )
    }
}

fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 { one } else { many }
}

#[async_trait]
impl DataService for InMemoryLedger {
    async fn fetch(&self, request: &DataRequest) -> Result<String, DataError> {
        match request {
            DataRequest::Summary => Ok(self.summary().await),
            DataRequest::RecentTransactions { count } => Ok(self.recent(*count).await),
            DataRequest::LogExpense {
                amount,
                description,
            } => {
                let t = self
                    .record(TransactionKind::Expense, *amount, description)
                    .await?;
                Ok(format!(
                    "Logged expense of {} for {}.",
                    self.money(t.amount),
                    t.description
                ))
            }
            DataRequest::LogIncome {
                amount,
                description,
            } => {
                let t = self
                    .record(TransactionKind::Income, *amount, description)
                    .await?;
                Ok(format!(
                    "Logged income of {} ({}).",
                    self.money(t.amount),
                    t.description
                ))
            }
            DataRequest::General => Ok(self.overview().await),
            DataRequest::None => Err(DataError::Unsupported {
                kind: request.kind(),
            }),
        }
    }
}
