//! Data module for configuration, persistent storage and credential management

mod config;
mod credential;
pub mod keys;
mod preferences;
mod store;

pub use config::AppConfig;
pub use credential::CredentialStore;
pub use preferences::PreferenceBag;
pub use store::{FileStore, KeyValueStore, MemoryStore, SharedStore, StoreError};
