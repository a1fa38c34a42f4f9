//! # Waitlist DB
//!
//! SQLite persistence for the waitlist: a single `waitlist` table, created on
//! first open and migrated in place (tracked by `PRAGMA user_version`).

pub mod schema;
pub mod store;

pub use schema::SCHEMA_VERSION;
pub use store::WaitlistDb;
