//! Component error types. Orchestration code wraps these in `anyhow` with context.

use thiserror::Error;

/// Failure of a single fetch attempt, or of a bounded retry loop as a whole.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, DNS failure, timeout, body read error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered, but not with a 2xx status.
    #[error("HTTP status {status}: {message}")]
    Status { status: u16, message: String },

    /// Only returned by bounded retry policies.
    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },
}

/// Why a raw item could not be turned into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// A required field (or the nested path under a present counter) is absent.
    /// Carries the dotted JSON path, e.g. `from.id` or `likes.summary.total_count`.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// The item exists but does not have the expected JSON shape.
    #[error("malformed {kind} item: {message}")]
    Malformed { kind: &'static str, message: String },

    #[error("bad timestamp in `{field}`: {value:?}")]
    BadTimestamp { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document (de)serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("store backend error: {0}")]
    Backend(String),
}
