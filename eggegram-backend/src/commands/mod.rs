//! Chat command handling. One inbound event produces exactly one reply.

mod log_eggs;
mod start;
mod stats;

use crate::channels::types::{EventKind, InboundEvent};
use crate::clock::Clock;
use crate::ledger::LedgerStore;
use std::sync::Arc;

/// Slash commands the bot understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Show the welcome message: `/start`
    Start,
    /// Show weekly statistics: `/stats`
    Stats,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Stats => "stats",
        }
    }
}

/// Parse a command name. Accepts `stats`, `/stats` and `/stats@SomeBot`.
pub fn parse(name: &str) -> Option<Command> {
    let name = name.trim().trim_start_matches('/');
    let name = name.split('@').next().unwrap_or(name);

    match name.to_lowercase().as_str() {
        "start" => Some(Command::Start),
        "stats" => Some(Command::Stats),
        _ => None,
    }
}

pub struct CommandHandler {
    ledger: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl CommandHandler {
    pub fn new(ledger: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    /// Handle one event and return the reply text. Ledger failures are
    /// logged and answered with an apology; they never escape.
    pub async fn handle(&self, event: &InboundEvent) -> String {
        log::info!("Chat {}: {} event", event.chat_id, event.kind);

        let today = self.clock.today();
        match event.kind {
            EventKind::Command => match parse(&event.payload) {
                Some(Command::Start) => start::execute(),
                Some(Command::Stats) => stats::execute(self.ledger.as_ref(), today).await,
                None => log_eggs::execute(self.ledger.as_ref(), today, &event.payload).await,
            },
            EventKind::Text => log_eggs::execute(self.ledger.as_ref(), today, &event.payload).await,
        }
    }
}
