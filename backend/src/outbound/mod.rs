//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM
//! - **memory**: process-local repositories used when no database is set
//! - **credentials**: bcrypt password hashing
//! - **notifier**: OTP delivery through the structured log
//! - **storage**: uploaded attachments on the local filesystem
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod credentials;
pub mod memory;
pub mod notifier;
pub mod persistence;
pub mod storage;
