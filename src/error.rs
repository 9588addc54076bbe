//! Error type shared by every query and reporting helper. Each failure keeps
//! the underlying driver text in its message so the binary can print a single
//! line that still says what went wrong.

use std::io;

use thiserror::Error;

use crate::db::Operation;

/// Boxed error used for query failures coming from any store implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration for {key}: {reason}")]
    Config { key: &'static str, reason: String },

    #[error("failed to connect to MongoDB: {0}")]
    Connect(mongodb::error::Error),

    #[error("{operation} failed: {cause}")]
    Query {
        operation: &'static str,
        cause: BoxError,
    },

    #[error("malformed library record: {0}")]
    Decode(mongodb::bson::de::Error),

    #[error("failed to write report: {0}")]
    Output(io::Error),
}

impl Error {
    /// Wrap a store failure, tagging it with the operation that was running.
    pub fn query(operation: Operation, cause: impl Into<BoxError>) -> Self {
        Error::Query {
            operation: operation.label(),
            cause: cause.into(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Output(err)
    }
}
