use mongodb::bson::{doc, Document};
use mongodb::sync::Database;

use crate::error::{Error, Result};
use crate::models::{Library, LIBRARY_COLLECTION};

use super::{decode_library, latest_first, Operation};

/// Fetch the library with the greatest `updated` value. Ties are resolved by
/// whatever order the server returns, so callers must not rely on which of
/// two equally recent libraries wins.
///
/// The record comes back as a raw document and is decoded here rather than by
/// the driver, so a malformed record surfaces as [`Error::Decode`] instead of
/// being mistaken for a failed query.
pub(crate) fn find_latest_library(db: &Database) -> Result<Option<Library>> {
    let latest = db
        .collection::<Document>(LIBRARY_COLLECTION)
        .find_one(doc! {})
        .sort(latest_first())
        .run()
        .map_err(|err| Error::query(Operation::LatestLibrary, err))?;

    latest.map(decode_library).transpose()
}
