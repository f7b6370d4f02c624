/// Application settings from config.toml
pub mod settings;

/// Storage database connection and table creation
pub mod storage;
