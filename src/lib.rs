//! stock_ledger Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod balance;
pub mod command;
pub mod domain;
pub mod engine;
pub mod ledger;

// Private modules (used only by main.rs binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{
    CatalogType, LedgerError, Metric, Movement, MovementLine, OperationContext, OriginType,
    ScopeKey, StockBalance,
};
pub use error::AppError;
