//! Google Sheets v4 ledger adapter.
//!
//! The ledger tab has a header row naming a `Date` and a `Count` column
//! (in any position) and one data row per day. Reads fetch the whole tab;
//! writes either rewrite a single count cell or append a new row.

use super::LedgerStore;
use super::auth::TokenSource;
use crate::error::{StoreError, truncate_error};
use async_trait::async_trait;
use chrono::NaiveDate;
use egg_ledger_types::{
    AppendValuesResponse, CountCell, DayRecord, SheetSnapshot, UpdateValuesResponse, ValueRange,
    column_letter, parse_rows,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Columns fetched on every read.
const READ_COLUMNS: &str = "A:Z";

pub struct SheetsLedger {
    http: Client,
    auth: Arc<dyn TokenSource>,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
}

impl SheetsLedger {
    pub fn new(
        http: Client,
        auth: Arc<dyn TokenSource>,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Self {
        Self {
            http,
            auth,
            base_url: SHEETS_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: sheet_name.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// A1 range on the ledger tab. Quotes in the tab name are doubled.
    fn range(&self, cells: &str) -> String {
        format!("'{}'!{}", self.sheet_name.replace('\'', "''"), cells)
    }

    fn values_url(&self, range: &str) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    async fn read_sheet(&self) -> Result<SheetSnapshot, StoreError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .get(self.values_url(&self.range(READ_COLUMNS)))
            .bearer_auth(&token)
            .send()
            .await?;

        let range: ValueRange = read_json(response).await?;
        let snapshot = parse_rows(&range.values)?;

        for row in &snapshot.rows {
            if row.count_cell == CountCell::Unreadable {
                log::warn!(
                    "Ledger row {} ({}) has an unreadable count; treating it as 0",
                    row.row_number,
                    row.record.date
                );
            }
        }

        Ok(snapshot)
    }

    async fn write_count(&self, cell: &str, count: u32) -> Result<(), StoreError> {
        let token = self.auth.access_token().await?;
        let range = self.range(cell);
        let body = ValueRange::rows(range.clone(), vec![vec![Value::from(count)]]);

        let response = self
            .http
            .put(self.values_url(&range))
            .bearer_auth(&token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        let updated: UpdateValuesResponse = read_json(response).await?;
        log::debug!(
            "Ledger: updated {}",
            updated.updated_range.as_deref().unwrap_or(&range)
        );
        Ok(())
    }

    async fn append_rows(&self, width: usize, rows: Vec<Vec<Value>>) -> Result<(), StoreError> {
        let token = self.auth.access_token().await?;
        let range = self.range(&format!("A:{}", column_letter(width.saturating_sub(1))));
        let body = ValueRange::rows(range.clone(), rows);

        let response = self
            .http
            .post(format!("{}:append", self.values_url(&range)))
            .bearer_auth(&token)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&body)
            .send()
            .await?;

        let appended: AppendValuesResponse = read_json(response).await?;
        log::debug!(
            "Ledger: appended to {}",
            appended
                .updates
                .as_ref()
                .and_then(|u| u.updated_range.as_deref())
                .unwrap_or(&range)
        );
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for SheetsLedger {
    async fn fetch_all_records(&self) -> Result<Vec<DayRecord>, StoreError> {
        Ok(self.read_sheet().await?.records())
    }

    async fn upsert_today(&self, today: NaiveDate, delta: u32) -> Result<u32, StoreError> {
        let snapshot = self.read_sheet().await?;

        if let Some(row) = snapshot.rows.iter().find(|row| row.record.is_on(today)) {
            let total = row.record.count.saturating_add(delta);
            let cell = format!("{}{}", column_letter(snapshot.layout.count), row.row_number);
            self.write_count(&cell, total).await?;
            return Ok(total);
        }

        let layout = snapshot.layout;
        let mut rows = Vec::with_capacity(2);
        if !snapshot.has_header {
            rows.push(layout.header_row());
        }
        rows.push(layout.row_values(&DayRecord::new(today, delta)));
        self.append_rows(layout.width(), rows).await?;
        Ok(delta)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            body: truncate_error(&body),
        });
    }
    Ok(response.json::<T>().await?)
}
