//! Free-text handler - a number logs that many eggs for today

use crate::aggregator;
use crate::ledger::LedgerStore;
use chrono::NaiveDate;
use std::num::IntErrorKind;

/// Largest count accepted in one message without confirmation.
pub const MAX_EGGS_PER_MESSAGE: i64 = 100;

pub const USAGE_HINT: &str = "Send a number to log eggs, or /stats for weekly stats.";
pub const NEGATIVE_PROMPT: &str = "Please send a positive number.";
pub const TOO_MANY_PROMPT: &str =
    "That seems like a lot of eggs! Are you sure? Please enter a number under 100.";
pub const LOG_APOLOGY: &str = "Sorry, I couldn't log the eggs. Please try again later.";

/// What a free-text message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EggInput {
    Count(u32),
    Negative,
    TooMany,
    NotANumber,
}

pub fn parse_input(text: &str) -> EggInput {
    match text.trim().parse::<i64>() {
        Err(e) => match e.kind() {
            // Still an integer, just too big to hold
            IntErrorKind::PosOverflow => EggInput::TooMany,
            IntErrorKind::NegOverflow => EggInput::Negative,
            _ => EggInput::NotANumber,
        },
        Ok(n) if n < 0 => EggInput::Negative,
        Ok(n) if n > MAX_EGGS_PER_MESSAGE => EggInput::TooMany,
        // 0..=100 always fits
        Ok(n) => EggInput::Count(n as u32),
    }
}

/// Handle a free-text message. Only `EggInput::Count` writes to the ledger.
pub async fn execute(ledger: &dyn LedgerStore, today: NaiveDate, text: &str) -> String {
    let count = match parse_input(text) {
        EggInput::Count(count) => count,
        EggInput::Negative => return NEGATIVE_PROMPT.to_string(),
        EggInput::TooMany => return TOO_MANY_PROMPT.to_string(),
        EggInput::NotANumber => {
            log::debug!("Ignoring non-numeric message");
            return USAGE_HINT.to_string();
        }
    };

    let today_total = match ledger.upsert_today(today, count).await {
        Ok(total) => total,
        Err(e) => {
            log::error!("Error adding eggs: {}", e);
            return LOG_APOLOGY.to_string();
        }
    };

    let week_total = match ledger.fetch_all_records().await {
        Ok(records) => aggregator::week_total(&records, today),
        Err(e) => {
            log::error!("Error reading week total after adding eggs: {}", e);
            return LOG_APOLOGY.to_string();
        }
    };

    format!(
        "Added {} eggs! Today: {} | Week: {}",
        count, today_total, week_total
    )
}
