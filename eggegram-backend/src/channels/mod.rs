pub mod telegram;
pub mod types;
