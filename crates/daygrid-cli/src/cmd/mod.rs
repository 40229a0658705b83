pub mod completions;
pub mod config;
pub mod layout;
pub mod stats;
