//! Persistence layer: PostgreSQL audit log.
//!
//! The booking store itself is in-process; the only durable state this
//! service owns is the audit trail. [`postgres::PostgresAuditSink`]
//! implements [`crate::audit::AuditSink`] over `sqlx::PgPool`.

pub mod models;
pub mod postgres;

pub use postgres::PostgresAuditSink;
