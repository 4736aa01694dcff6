//! Infrastructure layer: storage, audit trail, export, caching, config and
//! the service boundary the web layer calls.

pub mod attachments;
pub mod audit;
pub mod config;
pub mod context;
pub mod export;
pub mod ledger_store;
pub mod service;
pub mod stats_cache;
pub mod storage;

pub use config::{ConfigError, LedgerConfig};
pub use context::{Caller, OperationContext};
pub use service::LedgerService;
