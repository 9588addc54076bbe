//! Domain models that mirror the documents written by the ingestion process.
//! Library records are decoded into a typed struct; file records stay as raw
//! BSON documents because their shape depends on the parser that produced
//! them and we only ever print them.

use std::fmt;

use mongodb::bson::{Bson, DateTime, Document};
use serde::Deserialize;

/// Name of the collection holding one record per registered library.
pub const LIBRARY_COLLECTION: &str = "library";

/// Every library owns a dedicated collection named with this prefix followed
/// by the library id.
pub const FILES_COLLECTION_PREFIX: &str = "files_";

/// A parsed file record, printed as-is minus the hidden fields.
pub type FileRecord = Document;

/// Opaque library key. The ingestion process writes UUID strings, but any
/// BSON value is accepted so older databases keyed by ObjectId still work.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LibraryId(Bson);

impl LibraryId {
    /// Name of the collection that stores this library's file records.
    pub fn files_collection(&self) -> String {
        format!("{FILES_COLLECTION_PREFIX}{self}")
    }
}

impl From<Bson> for LibraryId {
    fn from(value: Bson) -> Self {
        LibraryId(value)
    }
}

impl From<&str> for LibraryId {
    fn from(value: &str) -> Self {
        LibraryId(Bson::String(value.to_string()))
    }
}

impl fmt::Display for LibraryId {
    /// Strings are written verbatim (no quotes) and ObjectIds as hex, so the
    /// result can be spliced straight into a collection name.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Bson::String(value) => f.write_str(value),
            Bson::ObjectId(oid) => write!(f, "{}", oid.to_hex()),
            other => write!(f, "{other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
/// One registered library. `updated` drives the recency ordering used to pick
/// which library gets listed.
pub struct Library {
    #[serde(rename = "_id")]
    pub id: LibraryId,
    /// Filesystem root the library was registered from.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub updated: Option<DateTime>,
}

impl Library {
    /// `<id>` or `<id> (<path>)` when the path is known.
    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => format!("{} ({path})", self.id),
            None => self.id.to_string(),
        }
    }
}
