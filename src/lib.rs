mod config;
mod date;
mod error;
mod util;
mod progress;

mod fetch;
mod paginate;
mod models;
mod normalize;

mod table;
mod store;
mod aggregate;
mod pipeline;

pub use crate::config::{Credentials, MalformedPolicy, ScrapeOptions, TableFormat, DEFAULT_BASE_URL, default_feed_fields};
pub use crate::error::{FetchError, NormalizeError, StoreError};
pub use crate::pipeline::{PageScraper, ScanSummary};

// Fetch + pagination building blocks.
pub use crate::fetch::{redact_token, HttpTransport, ResilientFetcher, RetryPolicy, Transport};
pub use crate::paginate::{Page, Paging, Paginator};

// Records and the normalizer.
pub use crate::models::{ItemKind, PostRecord, RawPost, RawReaction, ReactionRecord, Record, POST_COLUMNS};
pub use crate::normalize::{normalize, normalize_post, normalize_reaction, post_from_value, reaction_from_value};
pub use crate::date::to_local_row_time;

// Sinks.
pub use crate::table::{csv_escape, tsv_escape, TableWriter};
pub use crate::store::{DocumentStore, JsonDirStore, MemoryStore, POST_REACTIONS, USER_REACTIONS};
pub use crate::aggregate::{PostReactionsSnapshot, ReactionAggregator, ReactionEntry, UserAggregate};

pub use crate::progress::ScanProgress;
pub use crate::util::init_tracing_once;
