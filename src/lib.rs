pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod storage;

pub use config::AppConfig;
pub use core::{ReconciliationResult, TreeReconciler};
pub use error::{Result, SyncError};
pub use storage::{FileRecord, PathEntry, RemoteSession, Timestamp, TreeSource};
