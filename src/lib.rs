pub mod bridge;
pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod markdown;
pub mod todoist;

#[cfg(test)]
pub mod test_helpers;
