//! Database access
//!
//! Each job owns a single [`sqlx::PgConnection`]; there is no pool. Functions
//! here take `&mut PgConnection` so they run equally on a bare connection or
//! inside a transaction.

pub mod connection;
pub mod laps;
pub mod schema;
pub mod sessions;

pub use connection::{acquire, Connector, PgConnector, RetryPolicy};
pub use laps::{upsert_lap, LapWrite};
pub use schema::ensure_schema;
pub use sessions::{resolve_session, SessionResolution};
