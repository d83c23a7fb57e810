#![allow(dead_code)]

use graphscrape::{Credentials, FetchError, PageScraper, RetryPolicy, ScrapeOptions, Transport};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

pub const BASE: &str = "http://graph.test/v1";

/// One scripted reply.
#[derive(Clone, Debug)]
pub enum Reply {
    Body(String),
    Status(u16),
    Refused,
}

/// In-memory transport: each URL answers from its own queue. The last reply of a
/// queue repeats forever, so a URL scripted with a single body can be fetched many times.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: RefCell<HashMap<String, VecDeque<Reply>>>,
    calls: RefCell<Vec<String>>,
    delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long before answering each request, like a slow upstream.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn on(self, url: &str, replies: Vec<Reply>) -> Self {
        self.replies.borrow_mut().insert(url.to_string(), replies.into());
        self
    }

    pub fn page(self, url: &str, page: Value) -> Self {
        self.on(url, vec![Reply::Body(page.to_string())])
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.as_str() == url).count()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.borrow_mut().push(url.to_string());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let mut replies = self.replies.borrow_mut();
        let q = replies
            .get_mut(url)
            .ok_or_else(|| FetchError::Status { status: 404, message: format!("unscripted {url}") })?;
        let reply = if q.len() > 1 { q.pop_front() } else { q.front().cloned() };
        match reply {
            Some(Reply::Body(b)) => Ok(b.into_bytes()),
            Some(Reply::Status(s)) => Err(FetchError::Status { status: s, message: "scripted".into() }),
            Some(Reply::Refused) | None => Err(FetchError::Transport("connection refused".into())),
        }
    }
}

/// Options pointing at `BASE`, with zero backoff and no spinner.
pub fn test_options() -> ScrapeOptions {
    ScrapeOptions::default()
        .with_credentials(Credentials::app("app", "secret"))
        .with_base_url(BASE)
        .with_page_size(2)
        .with_retry(RetryPolicy::fixed(Duration::ZERO))
        .with_progress(false)
}

/// A scraper with the default test options and no scripted replies. Use it to compute
/// initial URLs before scripting the real transport.
pub fn url_builder() -> PageScraper<ScriptedTransport> {
    PageScraper::with_transport(test_options(), ScriptedTransport::new())
}

pub fn post(id: &str, created: &str) -> Value {
    json!({
        "id": id,
        "message": format!("message of {id}"),
        "type": "status",
        "from": {"id": "page1", "name": "Page One"},
        "created_time": created,
        "updated_time": created,
        "likes": {"data": [], "summary": {"total_count": 10}},
        "comments": {"data": [], "summary": {"total_count": 2}},
        "shares": {"count": 1}
    })
}

pub fn reaction(user: &str, name: &str, kind: &str) -> Value {
    json!({"id": user, "name": name, "type": kind})
}

pub fn page(items: Vec<Value>, next: Option<&str>) -> Value {
    match next {
        Some(n) => json!({"data": items, "paging": {"cursors": {"before": "b", "after": "a"}, "next": n}}),
        None => json!({"data": items, "paging": {"cursors": {"before": "b", "after": "a"}}}),
    }
}

/// Parse CRLF-terminated CSV text into rows of cells (no embedded quotes needed by tests).
pub fn csv_rows(text: &str) -> Vec<Vec<String>> {
    text.split("\r\n")
        .filter(|l| !l.is_empty())
        .map(|l| l.split(',').map(|c| c.to_string()).collect())
        .collect()
}
