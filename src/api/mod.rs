//! API module
//!
//! HTTP surface of the ledger: routes plus tenant and logging middleware.

pub mod middleware;
pub mod routes;

pub use routes::create_router;
