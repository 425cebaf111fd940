pub mod audit;
pub mod config;
pub mod export;
pub mod loader;
pub mod models;

/// Listen export file extensions we can read
pub const SUPPORTED_EXTENSIONS: &[&str] = &["json", "jsonl"];

/// Application name for XDG paths
pub const APP_NAME: &str = "listen-audit";
