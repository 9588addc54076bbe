//! Persistence module split across logical submodules. The report code only
//! talks to [`LibraryStore`]; `MongoStore` backs it in production and
//! `MemoryStore` stands in for the server in tests.

mod connection;
mod files;
mod libraries;
#[cfg(any(test, feature = "mock"))]
mod memory;

use mongodb::bson::{doc, Bson, Document};

use crate::error::{Error, Result};
use crate::models::{FileRecord, Library};

pub use connection::MongoStore;
#[cfg(any(test, feature = "mock"))]
pub use memory::MemoryStore;

/// Fields left out of every listed file record: the cover image payload and
/// the parsed section tree. Both can run to megabytes per document.
pub const HIDDEN_FILE_FIELDS: [&str; 2] = ["cover.bytes", "section"];

/// The read queries a store must answer.
pub trait LibraryStore {
    /// Most recently updated library, or `None` when none are registered.
    fn latest_library(&self) -> Result<Option<Library>>;

    /// Number of documents in the given file collection.
    fn count_files(&self, collection: &str) -> Result<u64>;

    /// File records ordered by `_id` ascending with [`HIDDEN_FILE_FIELDS`]
    /// removed, truncated to `limit` when one is given.
    fn list_files(&self, collection: &str, limit: Option<i64>) -> Result<Vec<FileRecord>>;
}

/// Identifies which query failed, used to label [`crate::Error::Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LatestLibrary,
    CountFiles,
    ListFiles,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::LatestLibrary => "find latest library",
            Operation::CountFiles => "count files",
            Operation::ListFiles => "list files",
        }
    }
}

/// Projection document excluding [`HIDDEN_FILE_FIELDS`].
pub fn file_projection() -> Document {
    HIDDEN_FILE_FIELDS
        .iter()
        .map(|field| (field.to_string(), Bson::Int32(0)))
        .collect()
}

/// Newest first; records without `updated` sort last.
pub(crate) fn latest_first() -> Document {
    doc! { "updated": -1 }
}

pub(crate) fn by_id() -> Document {
    doc! { "_id": 1 }
}

/// Turn a raw library document into a [`Library`]. Every store decodes
/// through here so a malformed record fails the same way everywhere.
pub(crate) fn decode_library(doc: Document) -> Result<Library> {
    mongodb::bson::from_document(doc).map_err(Error::Decode)
}
