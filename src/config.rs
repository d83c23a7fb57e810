use crate::fetch::RetryPolicy;
use std::fmt;
use std::time::Duration;

/// Output format for the per-page statuses table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Jsonl,
}

impl TableFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
            TableFormat::Jsonl => "jsonl",
        }
    }
}

/// What to do with an item the normalizer rejects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Propagate the error and stop the scan.
    Abort,
    /// Log a warning, count the item as skipped, keep going.
    Skip,
}

/// Access credentials passed as the `access_token` query parameter.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// App id + secret, joined as `<app_id>|<app_secret>`.
    App { app_id: String, app_secret: String },
    /// A token resolved elsewhere.
    Token(String),
}

impl Credentials {
    pub fn app(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Credentials::App { app_id: app_id.into(), app_secret: app_secret.into() }
    }

    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(token.into())
    }

    pub fn access_token(&self) -> String {
        match self {
            Credentials::App { app_id, app_secret } => format!("{app_id}|{app_secret}"),
            Credentials::Token(t) => t.clone(),
        }
    }

    /// Resolve from the environment:
    /// - GRAPH_ACCESS_TOKEN, if set and non-empty, wins
    /// - otherwise GRAPH_APP_ID + GRAPH_APP_SECRET
    pub fn from_env() -> Option<Self> {
        let non_empty = |k: &str| std::env::var(k).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        if let Some(t) = non_empty("GRAPH_ACCESS_TOKEN") {
            return Some(Credentials::Token(t));
        }
        match (non_empty("GRAPH_APP_ID"), non_empty("GRAPH_APP_SECRET")) {
            (Some(app_id), Some(app_secret)) => Some(Credentials::App { app_id, app_secret }),
            _ => None,
        }
    }
}

// Never print the secret.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::App { app_id, .. } => write!(f, "Credentials::App {{ app_id: {app_id:?}, app_secret: <redacted> }}"),
            Credentials::Token(_) => write!(f, "Credentials::Token(<redacted>)"),
        }
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ScrapeOptions {
    pub credentials: Credentials,
    pub base_url: String,              // API root, no trailing slash
    pub page_size: u32,                // `limit` on initial requests
    pub feed_fields: Vec<String>,      // `fields` requested on the feed edge
    pub retry: RetryPolicy,
    pub request_timeout: Option<Duration>, // None = transport default
    pub table_format: TableFormat,
    pub on_malformed: MalformedPolicy,
    pub progress: bool,                // show spinner
    pub progress_every: u64,           // log a progress line every N items (0 disables)
    pub write_buffer_bytes: usize,     // BufWriter capacity for table output
}

pub const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v2.6";

pub fn default_feed_fields() -> Vec<String> {
    [
        "message",
        "link",
        "created_time",
        "updated_time",
        "type",
        "name",
        "id",
        "from",
        "likes.limit(1).summary(true)",
        "comments.limit(1).summary(true)",
        "shares",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            credentials: Credentials::Token(String::new()),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 100,
            feed_fields: default_feed_fields(),
            retry: RetryPolicy::default(),
            request_timeout: None,
            table_format: TableFormat::Csv,
            on_malformed: MalformedPolicy::Abort,
            progress: true,
            progress_every: 1000,
            write_buffer_bytes: 64 * 1024,
        }
    }
}

impl ScrapeOptions {
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
    pub fn with_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.base_url = url.as_ref().trim_end_matches('/').to_string();
        self
    }
    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n.max(1);
        self
    }
    pub fn with_feed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.feed_fields = fields.into_iter().map(Into::into).collect();
        self
    }
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
    pub fn with_table_format(mut self, format: TableFormat) -> Self {
        self.table_format = format;
        self
    }
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_every(mut self, n: u64) -> Self {
        self.progress_every = n;
        self
    }
    pub fn with_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
