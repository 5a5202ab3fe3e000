//! Core library for the Snippy backend.
//!
//! This crate exposes the donor identity store, the authorization checks,
//! the HTML sanitizer, the insult moderation engine, announcements, and the
//! HTTP server that fronts them. Only one database backend (either `sqlite`
//! or `postgres`) should be enabled at a time.
cfg_if::cfg_if! {
    if #[cfg(all(feature = "sqlite", feature = "postgres", not(feature = "lint")))] {
        compile_error!("Choose either sqlite or postgres, not both");
    } else if #[cfg(feature = "sqlite")] {
        pub use diesel::sqlite::Sqlite as DbBackend;
    } else if #[cfg(feature = "postgres")] {
        pub use diesel::pg::Pg as DbBackend;
    } else {
        compile_error!("Either the 'sqlite' or 'postgres' feature must be enabled");
    }
}

pub mod access;
pub mod announcements;
pub mod db;
pub mod donors;
pub mod error;
pub mod insults;
pub mod models;
pub mod notify;
pub mod sanitize;
pub mod schema;
pub mod server;
