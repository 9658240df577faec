//! Start command - shows the welcome message

pub const WELCOME: &str = "Welcome to Eggegram! I'll help you track your chicken eggs.\n\n\
    How to use:\n\
    - Send a number to log eggs for today (e.g., '3')\n\
    - Send /stats to see your weekly statistics\n\n\
    Happy egg collecting!";

/// Execute the start command. Never touches the ledger.
pub fn execute() -> String {
    WELCOME.to_string()
}
