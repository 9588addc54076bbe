//! In-memory store for tests.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;

use mongodb::bson::{Bson, Document};

use crate::error::{Error, Result};
use crate::models::{FileRecord, Library, LibraryId, LIBRARY_COLLECTION};

use super::{decode_library, LibraryStore, Operation, HIDDEN_FILE_FIELDS};

/// Store backed by plain vectors, answering queries with the same ordering,
/// projection, and limit rules as the server. A single operation can be set
/// to fail so error paths are testable without a broken database.
///
/// Every collection a query touches is recorded and can be inspected with
/// [`MemoryStore::touched_collections`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    libraries: Vec<Document>,
    files: HashMap<String, Vec<FileRecord>>,
    failure: Option<(Operation, String)>,
    touched: RefCell<Vec<String>>,
}

impl MemoryStore {
    /// Empty store: no libraries and no file collections, so every lookup
    /// behaves like a freshly created database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a raw library document. Insertion order is the natural order used
    /// to break ties on `updated`.
    pub fn with_library(mut self, library: Document) -> Self {
        self.libraries.push(library);
        self
    }

    /// Add file records to the collection owned by `library_id`.
    pub fn with_files(
        mut self,
        library_id: impl Into<Bson>,
        files: impl IntoIterator<Item = FileRecord>,
    ) -> Self {
        let collection = LibraryId::from(library_id.into()).files_collection();
        self.files.entry(collection).or_default().extend(files);
        self
    }

    /// Make `operation` fail with `message` every time it runs.
    pub fn failing(mut self, operation: Operation, message: impl Into<String>) -> Self {
        self.failure = Some((operation, message.into()));
        self
    }

    /// Collections queried so far, in order, one entry per query. Lets tests
    /// prove a step never reached a collection it should not read.
    pub fn touched_collections(&self) -> Vec<String> {
        self.touched.borrow().clone()
    }

    fn begin(&self, operation: Operation, collection: &str) -> Result<()> {
        self.touched.borrow_mut().push(collection.to_string());
        match &self.failure {
            Some((failing, message)) if *failing == operation => {
                Err(Error::query(operation, message.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl LibraryStore for MemoryStore {
    fn latest_library(&self) -> Result<Option<Library>> {
        self.begin(Operation::LatestLibrary, LIBRARY_COLLECTION)?;

        let mut libraries: Vec<&Document> = self.libraries.iter().collect();
        // Stable sort, so equal timestamps keep insertion order.
        libraries.sort_by(|a, b| compare_bson(field(b, "updated"), field(a, "updated")));

        libraries
            .first()
            .map(|doc| decode_library((*doc).clone()))
            .transpose()
    }

    fn count_files(&self, collection: &str) -> Result<u64> {
        self.begin(Operation::CountFiles, collection)?;
        Ok(self.files.get(collection).map_or(0, |files| files.len() as u64))
    }

    fn list_files(&self, collection: &str, limit: Option<i64>) -> Result<Vec<FileRecord>> {
        self.begin(Operation::ListFiles, collection)?;

        let mut files = self.files.get(collection).cloned().unwrap_or_default();
        files.sort_by(|a, b| compare_bson(field(a, "_id"), field(b, "_id")));

        // The server treats 0 as "no limit" and a negative limit as its
        // absolute value.
        if let Some(limit) = limit.filter(|limit| *limit != 0) {
            files.truncate(usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX));
        }

        for file in &mut files {
            strip_hidden_fields(file);
        }
        Ok(files)
    }
}

fn field<'a>(doc: &'a Document, key: &str) -> &'a Bson {
    doc.get(key).unwrap_or(&Bson::Null)
}

/// Remove [`HIDDEN_FILE_FIELDS`] from a document, following dotted paths into
/// sub-documents.
fn strip_hidden_fields(doc: &mut Document) {
    for path in HIDDEN_FILE_FIELDS {
        remove_path(doc, path);
    }
}

fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                remove_path(inner, rest);
            }
        }
        None => {
            doc.remove(path);
        }
    }
}

/// Position of a value's type in MongoDB's cross-type sort order.
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Approximation of the server's BSON comparison, good enough for the key
/// types libraries and files actually use.
fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::DateTime(x), Bson::DateTime(y)) => {
            x.timestamp_millis().cmp(&y.timestamp_millis())
        }
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}
