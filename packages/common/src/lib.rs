pub mod config;
pub mod ingest;
pub mod storage;

pub use config::StorageAppConfig;
