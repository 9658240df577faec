//! Ledger store: the row-per-day table holding egg counts.
//!
//! The store is the only source of truth. There is no locking around the
//! read-modify-write in [`LedgerStore::upsert_today`], so two concurrent
//! logs for the same day can lose an update; the later write wins.

pub mod auth;
#[cfg(test)]
pub mod memory;
pub mod sheets;
#[cfg(test)]
pub mod test_support;

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use egg_ledger_types::DayRecord;

pub use auth::ServiceAccountAuth;
pub use sheets::SheetsLedger;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Every row in the store, in store order. Rows with unparseable dates
    /// are returned as-is; readers skip them.
    async fn fetch_all_records(&self) -> Result<Vec<DayRecord>, StoreError>;

    /// Add `delta` to the first row dated `today`, or append `{today, delta}`
    /// when there is none. Returns the new total for `today`.
    async fn upsert_today(&self, today: NaiveDate, delta: u32) -> Result<u32, StoreError>;
}
