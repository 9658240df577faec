//! Stats command - today's count, the rolling week total and a daily breakdown

use crate::aggregator::WeeklyStats;
use crate::ledger::LedgerStore;
use chrono::NaiveDate;

pub const STATS_APOLOGY: &str = "Sorry, I couldn't fetch the stats. Please try again later.";

/// Execute the stats command.
///
/// All three figures come from a single fetch so they always agree.
pub async fn execute(ledger: &dyn LedgerStore, today: NaiveDate) -> String {
    match ledger.fetch_all_records().await {
        Ok(records) => format_report(&WeeklyStats::compute(&records, today)),
        Err(e) => {
            log::error!("Error getting stats: {}", e);
            STATS_APOLOGY.to_string()
        }
    }
}

pub fn format_report(stats: &WeeklyStats) -> String {
    let breakdown = stats
        .breakdown
        .iter()
        .map(|day| format!("  {}: {}", day.label(), day.count))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Weekly Stats\n\
        {}\n\
        Today: {} eggs\n\
        Week Total: {} eggs\n\n\
        Daily Breakdown:\n{}",
        "=".repeat(20),
        stats.today,
        stats.week_total,
        breakdown
    )
}
