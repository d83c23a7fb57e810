//! Cursor-driven pagination over graph API edges.
//!
//! A scan starts from one page (either handed in or fetched from an initial URL) and
//! keeps following `paging.next` until a page arrives without it. Items are yielded
//! lazily, page by page, in server order. Consuming the iterator advances the
//! server-side cursor, so a `Paginator` cannot be rewound.

use crate::fetch::{redact_token, ResilientFetcher, Transport};
use crate::progress::ScanProgress;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One response batch.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    pub data: Vec<Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl Page {
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).context("decode page body")
    }

    /// Absolute URL of the following page; `None` marks the last page.
    pub fn next_url(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|s| !s.is_empty())
    }
}

pub struct Paginator<'a, T: Transport> {
    fetcher: &'a ResilientFetcher<T>,
    buffer: VecDeque<Value>,
    next: Option<String>,
    pages_fetched: u64,
    done: bool,
    progress: ScanProgress,
    elapsed: Option<Duration>,
}

impl<'a, T: Transport> Paginator<'a, T> {
    /// Start from a page the caller already holds. Only subsequent pages are fetched.
    pub fn new(fetcher: &'a ResilientFetcher<T>, first: Page) -> Self {
        let next = first.next_url().map(str::to_string);
        Self {
            fetcher,
            buffer: first.data.into(),
            next,
            pages_fetched: 0,
            done: false,
            progress: ScanProgress::new("items", 1000, false),
            elapsed: None,
        }
    }

    /// Fetch the first page from `url`, then paginate from it. The scan clock starts
    /// before that first request, so its retries count toward `elapsed`.
    pub fn start(fetcher: &'a ResilientFetcher<T>, url: &str) -> Result<Self> {
        let started = Instant::now();
        let body = fetcher
            .fetch(url)
            .with_context(|| format!("fetch first page {}", redact_token(url)))?;
        let first = Page::parse(&body).with_context(|| format!("first page {}", redact_token(url)))?;
        let mut p = Self::new(fetcher, first);
        p.pages_fetched = 1;
        p.progress = ScanProgress::since("items", 1000, false, started);
        Ok(p)
    }

    /// Replace the default progress reporter (label `items`, every 1000, no spinner).
    /// The scan clock keeps running.
    pub fn with_progress(mut self, label: impl Into<String>, every: u64, spinner: bool) -> Self {
        self.progress = ScanProgress::since(label, every, spinner, self.progress.started());
        self
    }

    pub fn items_yielded(&self) -> u64 {
        self.progress.count()
    }

    /// Pages retrieved over the network by this paginator (including the first page for `start`).
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Wall-clock duration of the scan, once exhausted.
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            self.elapsed = Some(self.progress.finish());
        }
    }

    fn fetch_next_page(&mut self, url: String) -> Result<()> {
        let body = self
            .fetcher
            .fetch(&url)
            .with_context(|| format!("fetch page {}", redact_token(&url)))?;
        self.pages_fetched += 1;
        let page = Page::parse(&body)
            .with_context(|| format!("page {} of scan ({})", self.pages_fetched, redact_token(&url)))?;
        tracing::debug!(items = page.data.len(), page = self.pages_fetched, "page received");
        self.next = page.next_url().map(str::to_string);
        self.buffer.extend(page.data);
        Ok(())
    }
}

impl<'a, T: Transport> Iterator for Paginator<'a, T> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(item) = self.buffer.pop_front() {
                self.progress.inc();
                return Some(Ok(item));
            }
            match self.next.take() {
                Some(url) => {
                    if let Err(e) = self.fetch_next_page(url) {
                        // A broken page ends the scan; nothing after it can be reached.
                        self.finish();
                        return Some(Err(e));
                    }
                    // An empty page with a cursor is legal; loop and follow it.
                }
                None => {
                    self.finish();
                    return None;
                }
            }
        }
    }
}
