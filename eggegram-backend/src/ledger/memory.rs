//! In-process ledger with the same row semantics as the sheet.

use super::LedgerStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::NaiveDate;
use egg_ledger_types::DayRecord;
use parking_lot::Mutex;

#[derive(Default)]
pub struct MemoryLedger {
    rows: Mutex<Vec<DayRecord>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<DayRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
        }
    }

    pub fn records(&self) -> Vec<DayRecord> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn fetch_all_records(&self) -> Result<Vec<DayRecord>, StoreError> {
        Ok(self.records())
    }

    async fn upsert_today(&self, today: NaiveDate, delta: u32) -> Result<u32, StoreError> {
        let mut rows = self.rows.lock();
        match rows.iter_mut().find(|r| r.is_on(today)) {
            Some(row) => {
                row.count = row.count.saturating_add(delta);
                Ok(row.count)
            }
            None => {
                rows.push(DayRecord::new(today, delta));
                Ok(delta)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_is_additive() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.upsert_today(day(1), 5).await.unwrap(), 5);
        assert_eq!(ledger.upsert_today(day(1), 3).await.unwrap(), 8);
        assert_eq!(ledger.upsert_today(day(2), 0).await.unwrap(), 0);
        assert_eq!(ledger.records().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_updates_first_duplicate() {
        let ledger = MemoryLedger::with_records(vec![
            DayRecord::new(day(1), 2),
            DayRecord::new(day(1), 10),
        ]);
        assert_eq!(ledger.upsert_today(day(1), 1).await.unwrap(), 3);
        assert_eq!(ledger.records()[1].count, 10);
    }
}
