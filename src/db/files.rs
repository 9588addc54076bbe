use mongodb::bson::doc;
use mongodb::sync::Database;

use crate::error::{Error, Result};
use crate::models::FileRecord;

use super::{by_id, file_projection, Operation};

/// Count every document in a library's file collection. A collection that
/// was never created counts as empty, which is how a freshly registered
/// library looks before the parser has written anything.
pub(crate) fn count_files(db: &Database, collection: &str) -> Result<u64> {
    db.collection::<FileRecord>(collection)
        .count_documents(doc! {})
        .run()
        .map_err(|err| Error::query(Operation::CountFiles, err))
}

/// Load file records ordered by id with the heavy fields projected out on the
/// server side, so cover images never cross the wire.
pub(crate) fn fetch_files(
    db: &Database,
    collection: &str,
    limit: Option<i64>,
) -> Result<Vec<FileRecord>> {
    let files = db.collection::<FileRecord>(collection);
    let mut find = files
        .find(doc! {})
        .projection(file_projection())
        .sort(by_id());

    if let Some(limit) = limit {
        find = find.limit(limit);
    }

    let cursor = find
        .run()
        .map_err(|err| Error::query(Operation::ListFiles, err))?;

    cursor
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| Error::query(Operation::ListFiles, err))
}
