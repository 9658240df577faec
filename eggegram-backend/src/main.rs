//! Eggegram - a Telegram bot that logs daily egg counts to a Google Sheet
//! and reports rolling weekly totals.

use dotenv::dotenv;
use std::sync::Arc;

mod aggregator;
mod channels;
mod clock;
mod commands;
mod config;
mod error;
mod http;
mod ledger;

use clock::LocalClock;
use commands::CommandHandler;
use config::Config;
use ledger::{LedgerStore, ServiceAccountAuth, SheetsLedger};

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Using worksheet '{}' of spreadsheet {} as {}",
        config.sheet_name,
        config.spreadsheet_id,
        config.service_account.client_email
    );

    let auth = Arc::new(ServiceAccountAuth::new(
        config.service_account.clone(),
        http::shared_client().clone(),
    ));
    let ledger: Arc<dyn LedgerStore> = Arc::new(SheetsLedger::new(
        http::shared_client().clone(),
        auth,
        &config.spreadsheet_id,
        &config.sheet_name,
    ));
    let handler = Arc::new(CommandHandler::new(ledger, Arc::new(LocalClock)));

    if let Err(e) = channels::telegram::start_telegram_listener(&config, handler).await {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
