//! The two steps of an inspection run and the glue between them. Everything
//! here is written against [`LibraryStore`] and a `Write` sink so the same code
//! drives the real database and the tests.

use std::io::Write;

use crate::config::Config;
use crate::db::LibraryStore;
use crate::error::Result;
use crate::models::{FileRecord, Library};

use mongodb::bson::Bson;

/// How a run ended when no error occurred.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The library collection was empty; no file collection was read.
    NoLibrary,
    Listed { library: Library, printed: usize },
}

/// Find the most recently updated library.
pub fn locate_latest_library<S>(store: &S) -> Result<Option<Library>>
where
    S: LibraryStore + ?Sized,
{
    tracing::info!("looking up most recently updated library");
    let library = store.latest_library()?;

    match &library {
        Some(library) => tracing::info!(library = %library.id, "found library"),
        None => tracing::info!("library collection is empty"),
    }
    Ok(library)
}

/// Print the entry count of `library`'s file collection followed by its
/// records in id order, one per line. Returns how many records were printed.
pub fn list_files<S, W>(
    store: &S,
    library: &Library,
    limit: Option<i64>,
    out: &mut W,
) -> Result<usize>
where
    S: LibraryStore + ?Sized,
    W: Write + ?Sized,
{
    let collection = library.id.files_collection();
    match limit {
        Some(limit) => tracing::info!(%collection, limit, "listing first {limit} files"),
        None => tracing::info!(%collection, "listing all files"),
    }

    let total = store.count_files(&collection)?;
    writeln!(out, "collection {collection} has {total} elements")?;

    let files = store.list_files(&collection, limit)?;
    for file in &files {
        writeln!(out, "{}", render_file(file))?;
    }

    tracing::debug!(%collection, printed = files.len(), "finished listing files");
    Ok(files.len())
}

/// One file record as a single line of relaxed extended JSON, the same shape
/// `mongosh --json=relaxed` and `mongoexport` write.
fn render_file(file: &FileRecord) -> String {
    Bson::Document(file.clone()).into_relaxed_extjson().to_string()
}

/// Locate the latest library and list its files. Stops after the first step
/// when there is no library rather than querying a collection that cannot
/// exist.
pub fn run<S, W>(store: &S, config: &Config, out: &mut W) -> Result<Outcome>
where
    S: LibraryStore + ?Sized,
    W: Write + ?Sized,
{
    let Some(library) = locate_latest_library(store)? else {
        writeln!(out, "no library found")?;
        return Ok(Outcome::NoLibrary);
    };

    writeln!(out, "found library: {}", library.display_name())?;
    let printed = list_files(store, &library, config.display_limit, out)?;

    Ok(Outcome::Listed { library, printed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, Operation};
    use crate::error::Error;
    use crate::models::LibraryId;
    use assert_matches::assert_matches;
    use mongodb::bson::{doc, oid::ObjectId, DateTime, Document};

    fn library(id: &str, updated_millis: i64) -> Document {
        doc! {
            "_id": id,
            "path": format!("/srv/{id}"),
            "updated": DateTime::from_millis(updated_millis),
        }
    }

    fn file(id: i32, title: &str) -> Document {
        doc! {
            "_id": id,
            "title": title,
            "cover": { "name": format!("{title}.jpg"), "type": "image/jpeg", "bytes": [255, 216, 255] },
            "section": { "title": ["Chapter 1"] },
        }
    }

    fn output(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn library_b() -> Library {
        mongodb::bson::from_document(library("B", 2_000)).unwrap()
    }

    #[test]
    fn empty_library_collection_is_not_found() {
        let store = MemoryStore::new();
        assert_eq!(locate_latest_library(&store).unwrap(), None);
    }

    #[test]
    fn latest_library_has_greatest_updated() {
        let store = MemoryStore::new()
            .with_library(library("A", 1_000))
            .with_library(library("B", 2_000))
            .with_library(library("C", 1_500));

        let found = locate_latest_library(&store).unwrap().unwrap();
        assert_eq!(found.id, LibraryId::from("B"));
        assert_eq!(found.path.as_deref(), Some("/srv/B"));
        assert_eq!(found.updated, Some(DateTime::from_millis(2_000)));
    }

    #[test]
    fn undated_libraries_lose_to_dated_ones() {
        let store = MemoryStore::new()
            .with_library(doc! { "_id": "undated" })
            .with_library(library("A", 1));

        let found = locate_latest_library(&store).unwrap().unwrap();
        assert_eq!(found.id, LibraryId::from("A"));
    }

    #[test]
    fn files_print_in_id_order_without_hidden_fields() {
        let store = MemoryStore::new().with_files(
            "B",
            [file(3, "Solaris"), file(1, "Dune"), file(2, "Hyperion")],
        );

        let mut buf = Vec::new();
        let printed = list_files(&store, &library_b(), None, &mut buf).unwrap();
        let lines = output(buf);

        assert_eq!(printed, 3);
        assert_eq!(lines[0], "collection files_B has 3 elements");
        assert_eq!(lines.len(), 4);
        for (line, title) in lines[1..].iter().zip(["Dune", "Hyperion", "Solaris"]) {
            assert!(line.contains(title), "{line}");
            assert!(line.contains("image/jpeg"), "cover metadata should survive: {line}");
            assert!(!line.contains("bytes"), "{line}");
            assert!(!line.contains("section"), "{line}");
            assert!(!line.contains("Chapter 1"), "{line}");
        }
    }

    #[test]
    fn empty_file_collection_prints_zero_count_only() {
        let store = MemoryStore::new();

        let mut buf = Vec::new();
        let printed = list_files(&store, &library_b(), None, &mut buf).unwrap();

        assert_eq!(printed, 0);
        assert_eq!(output(buf), ["collection files_B has 0 elements"]);
    }

    #[test]
    fn display_limit_keeps_the_first_records_by_id() {
        let store = MemoryStore::new().with_files(
            "B",
            [file(4, "Ubik"), file(2, "Hyperion"), file(1, "Dune"), file(3, "Solaris")],
        );

        let mut buf = Vec::new();
        let printed = list_files(&store, &library_b(), Some(2), &mut buf).unwrap();
        let lines = output(buf);

        assert_eq!(printed, 2);
        // The count reflects the whole collection, not the limit.
        assert_eq!(lines[0], "collection files_B has 4 elements");
        assert!(lines[1].contains("Dune"));
        assert!(lines[2].contains("Hyperion"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn failure_locating_library_is_returned() {
        let store = MemoryStore::new()
            .with_library(library("A", 1))
            .failing(Operation::LatestLibrary, "connection refused");

        let err = locate_latest_library(&store).unwrap_err();
        assert_matches!(err, Error::Query { operation: "find latest library", .. });
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn failure_counting_files_is_returned() {
        let store = MemoryStore::new().failing(Operation::CountFiles, "not authorized");

        let mut buf = Vec::new();
        let err = list_files(&store, &library_b(), None, &mut buf).unwrap_err();

        assert_matches!(err, Error::Query { operation: "count files", .. });
        assert!(err.to_string().contains("not authorized"));
        assert!(buf.is_empty());
    }

    #[test]
    fn failure_listing_files_is_returned_after_the_count() {
        let store = MemoryStore::new()
            .with_files("B", [file(1, "Dune")])
            .failing(Operation::ListFiles, "cursor killed");

        let mut buf = Vec::new();
        let err = list_files(&store, &library_b(), None, &mut buf).unwrap_err();

        assert_matches!(err, Error::Query { operation: "list files", .. });
        assert_eq!(output(buf), ["collection files_B has 1 elements"]);
    }

    #[test]
    fn file_lines_are_relaxed_extended_json() {
        let oid = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let store = MemoryStore::new().with_files(
            "B",
            [doc! { "_id": oid, "added": DateTime::from_millis(0), "size": 5 }],
        );

        let mut buf = Vec::new();
        list_files(&store, &library_b(), None, &mut buf).unwrap();
        let lines = output(buf);

        assert_eq!(
            lines[1],
            r#"{"_id":{"$oid":"65a1f0c2e4b0a1b2c3d4e5f6"},"added":{"$date":"1970-01-01T00:00:00Z"},"size":5}"#
        );
    }

    #[test]
    fn run_lists_the_newest_library() {
        let store = MemoryStore::new()
            .with_library(library("A", 1_000))
            .with_library(library("B", 2_000))
            .with_files("A", [file(1, "Ignored")])
            .with_files("B", [file(2, "Hyperion"), file(1, "Dune")]);

        let mut buf = Vec::new();
        let outcome = run(&store, &Config::default(), &mut buf).unwrap();

        assert_matches!(outcome, Outcome::Listed { ref library, printed: 2 } if library.id == LibraryId::from("B"));
        assert_eq!(
            store.touched_collections(),
            ["library", "files_B", "files_B"]
        );

        let lines = output(buf);
        assert_eq!(lines[0], "found library: B (/srv/B)");
        assert_eq!(lines[1], "collection files_B has 2 elements");
        assert!(lines[2].contains("Dune"));
        assert!(lines[3].contains("Hyperion"));
        assert!(lines.iter().all(|line| !line.contains("Ignored")));
    }

    #[test]
    fn run_honours_configured_limit() {
        let store = MemoryStore::new()
            .with_library(library("B", 1))
            .with_files("B", [file(1, "Dune"), file(2, "Hyperion")]);
        let config = Config {
            display_limit: Some(1),
            ..Config::default()
        };

        let mut buf = Vec::new();
        let outcome = run(&store, &config, &mut buf).unwrap();

        assert_matches!(outcome, Outcome::Listed { printed: 1, .. });
    }

    #[test]
    fn run_stops_when_no_library_exists() {
        let store = MemoryStore::new().with_files("None", [file(1, "Orphan")]);

        let mut buf = Vec::new();
        let outcome = run(&store, &Config::default(), &mut buf).unwrap();

        assert_eq!(outcome, Outcome::NoLibrary);
        assert_eq!(store.touched_collections(), ["library"]);
        assert_eq!(output(buf), ["no library found"]);
    }

    #[test]
    fn run_propagates_locate_failure_without_listing() {
        let store = MemoryStore::new().failing(Operation::LatestLibrary, "timed out");

        let mut buf = Vec::new();
        let err = run(&store, &Config::default(), &mut buf).unwrap_err();

        assert!(err.to_string().contains("timed out"));
        assert_eq!(store.touched_collections(), ["library"]);
        assert!(buf.is_empty());
    }

    #[test]
    fn malformed_library_record_is_a_decode_error() {
        let store = MemoryStore::new().with_library(doc! { "_id": "A", "updated": "yesterday" });

        let err = locate_latest_library(&store).unwrap_err();
        assert_matches!(err, Error::Decode(_));
    }
}
