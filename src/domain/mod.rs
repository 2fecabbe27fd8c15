//! Domain module
//!
//! Value objects and records for the stock ledger: metrics, scope keys,
//! movements and their lines, balances, and the ledger error taxonomy.

mod context;
mod error;
mod metric;
mod movement;
mod origin;
mod scope;

pub use context::OperationContext;
pub use error::LedgerError;
pub use metric::{round6, Metric, LEDGER_SCALE};
pub use movement::{Movement, MovementLine, StockBalance};
pub use origin::OriginType;
pub use scope::{CatalogType, ScopeKey};
