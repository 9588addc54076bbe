//! Core library surface for `library-inspect`, a small tool that shows the
//! file records of the most recently updated library in the MongoDB store
//! filled by the library parser.
//!
//! The binary only wires configuration, logging, and the connection together;
//! the query and reporting steps live here so tests can drive them against
//! the in-memory store (`mock` feature).
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod report;

pub use config::Config;
pub use db::{LibraryStore, MongoStore, Operation};
#[cfg(any(test, feature = "mock"))]
pub use db::MemoryStore;
pub use error::{Error, Result};
pub use models::{FileRecord, Library, LibraryId};
pub use report::{list_files, locate_latest_library, run, Outcome};
