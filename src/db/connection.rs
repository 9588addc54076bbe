use mongodb::bson::doc;
use mongodb::sync::{Client, Database};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{FileRecord, Library};

use super::{files, libraries, LibraryStore};

/// Live connection to the MongoDB database holding the libraries. The driver
/// client lives as long as this value and is released when it is dropped.
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Build a client for the configured server and ping it, so an
    /// unreachable server surfaces as [`Error::Connect`] before any query
    /// runs.
    pub fn connect(config: &Config) -> Result<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).map_err(Error::Connect)?;
        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(Error::Connect)?;

        tracing::info!(database = %config.database, "connected to MongoDB");
        Ok(Self { database })
    }

}

impl LibraryStore for MongoStore {
    fn latest_library(&self) -> Result<Option<Library>> {
        libraries::find_latest_library(&self.database)
    }

    fn count_files(&self, collection: &str) -> Result<u64> {
        files::count_files(&self.database, collection)
    }

    fn list_files(&self, collection: &str, limit: Option<i64>) -> Result<Vec<FileRecord>> {
        files::fetch_files(&self.database, collection, limit)
    }
}
