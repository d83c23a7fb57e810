use crate::aggregate::ReactionAggregator;
use crate::config::{Credentials, MalformedPolicy, ScrapeOptions, TableFormat};
use crate::error::NormalizeError;
use crate::fetch::{HttpTransport, ResilientFetcher, RetryPolicy, Transport};
use crate::normalize::{post_from_value, reaction_from_value};
use crate::paginate::Paginator;
use crate::store::DocumentStore;
use crate::table::TableWriter;
use crate::util::init_tracing_once;
use anyhow::{anyhow, Context, Result};
use reqwest::Url;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of one scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanSummary {
    /// Raw items pulled from the API.
    pub items: u64,
    /// Items normalized and written: table rows, or distinct reactions for reaction scans.
    pub written: u64,
    /// Items dropped under `MalformedPolicy::Skip`.
    pub skipped: u64,
    /// Pages retrieved over the network, initial page included.
    pub pages: u64,
    pub elapsed: Duration,
    /// Table output, for feed scans.
    pub output: Option<PathBuf>,
    /// Post ids seen, for feed scans.
    pub post_ids: Vec<String>,
}

pub struct PageScraper<T: Transport> {
    pub(crate) opts: ScrapeOptions,
    fetcher: ResilientFetcher<T>,
}

impl PageScraper<HttpTransport> {
    /// Scraper over the real network with the given options.
    pub fn http(opts: ScrapeOptions) -> Result<Self> {
        let transport = HttpTransport::new(opts.request_timeout).context("build HTTP client")?;
        Ok(Self::with_transport(opts, transport))
    }
}

impl<T: Transport> PageScraper<T> {
    pub fn with_transport(opts: ScrapeOptions, transport: T) -> Self {
        init_tracing_once();
        let fetcher = ResilientFetcher::new(transport, opts.retry.clone());
        Self { opts, fetcher }
    }

    pub fn options(&self) -> &ScrapeOptions {
        &self.opts
    }

    pub fn fetcher(&self) -> &ResilientFetcher<T> {
        &self.fetcher
    }

    // -------- Builder methods --------
    pub fn credentials(mut self, c: Credentials) -> Self { self.opts = self.opts.with_credentials(c); self }
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self { self.opts = self.opts.with_base_url(url); self }
    pub fn page_size(mut self, n: u32) -> Self { self.opts = self.opts.with_page_size(n); self }
    pub fn table_format(mut self, f: TableFormat) -> Self { self.opts = self.opts.with_table_format(f); self }
    pub fn on_malformed(mut self, p: MalformedPolicy) -> Self { self.opts = self.opts.with_malformed_policy(p); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_every(mut self, n: u64) -> Self { self.opts = self.opts.with_progress_every(n); self }
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.fetcher = ResilientFetcher::new(self.fetcher.into_transport(), policy.clone());
        self.opts = self.opts.with_retry(policy);
        self
    }

    // -------- URLs --------

    /// `<base>/<node_id>/<edge>?...`; the id is one escaped path segment.
    fn edge_url(&self, node_id: &str, edge: &str, fields: Option<&str>) -> Result<String> {
        if node_id.trim().is_empty() {
            return Err(anyhow!("node id is required for {edge}"));
        }
        let mut url = Url::parse(&self.opts.base_url).with_context(|| format!("bad base url {}", self.opts.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("base url {} cannot take a path", self.opts.base_url))?
            .pop_if_empty()
            .push(node_id)
            .push(edge);
        {
            let mut q = url.query_pairs_mut();
            if let Some(f) = fields {
                q.append_pair("fields", f);
            }
            q.append_pair("limit", &self.opts.page_size.to_string());
            q.append_pair("access_token", &self.opts.credentials.access_token());
        }
        Ok(url.to_string())
    }

    /// Initial URL of a page's feed scan.
    pub fn feed_url(&self, page_id: &str) -> Result<String> {
        let fields = self.opts.feed_fields.join(",");
        let fields = if fields.is_empty() { None } else { Some(fields.as_str()) };
        self.edge_url(page_id, "feed", fields)
    }

    /// Initial URL of a post's reactions scan.
    pub fn reactions_url(&self, post_id: &str) -> Result<String> {
        self.edge_url(post_id, "reactions", None)
    }

    // -------- Scans --------

    fn paginator(&self, url: &str, label: String) -> Result<Paginator<'_, T>> {
        Ok(Paginator::start(&self.fetcher, url)?.with_progress(label, self.opts.progress_every, self.opts.progress))
    }

    /// Route a normalizer failure through the malformed-item policy.
    /// Ok(None) means the item was skipped.
    fn handle_malformed<R>(&self, res: Result<R, NormalizeError>, raw: &Value, what: &str) -> Result<Option<R>> {
        match res {
            Ok(r) => Ok(Some(r)),
            Err(e) => match self.opts.on_malformed {
                MalformedPolicy::Skip => {
                    let id = raw.get("id").and_then(|v| v.as_str()).unwrap_or("?");
                    tracing::warn!(id, error = %e, "skipping malformed {}", what);
                    Ok(None)
                }
                MalformedPolicy::Abort => {
                    Err(anyhow::Error::new(e).context(format!("normalize {} {}", what, raw.get("id").unwrap_or(&Value::Null))))
                }
            },
        }
    }

    /// Scan a page's feed into `<out_dir>/<page_id>_statuses.<ext>`.
    pub fn scrape_page_feed(&self, page_id: &str, out_dir: &Path) -> Result<ScanSummary> {
        if page_id.trim().is_empty() {
            return Err(anyhow!("page id is required"));
        }
        let out_path = out_dir.join(format!("{}_statuses.{}", page_id, self.opts.table_format.extension()));
        tracing::info!("Scraping {} page feed into {}", page_id, out_path.display());

        let mut table = TableWriter::create(&out_path, self.opts.table_format, self.opts.write_buffer_bytes)?;
        let mut pages = self.paginator(&self.feed_url(page_id)?, format!("{page_id} statuses"))?;
        let mut summary = ScanSummary::default();

        for item in pages.by_ref() {
            let raw = item.with_context(|| format!("feed scan of {page_id}"))?;
            summary.items += 1;
            match self.handle_malformed(post_from_value(&raw), &raw, "post")? {
                Some(rec) => {
                    table.write_post(&rec)?;
                    summary.post_ids.push(rec.post_id);
                    summary.written += 1;
                }
                None => summary.skipped += 1,
            }
        }

        summary.pages = pages.pages_fetched();
        summary.elapsed = pages.elapsed().unwrap_or_default();
        summary.output = Some(table.finish()?);
        Ok(summary)
    }

    /// Scan one post's reactions: merge each into its user's aggregate, then snapshot the
    /// full list for the post. The snapshot is only written once the scan completes.
    pub fn scrape_post_reactions<S: DocumentStore>(
        &self,
        post_id: &str,
        aggregator: &mut ReactionAggregator<S>,
    ) -> Result<ScanSummary> {
        let mut pages = self.paginator(&self.reactions_url(post_id)?, format!("{post_id} reactions"))?;
        let mut summary = ScanSummary::default();
        let mut collected = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for item in pages.by_ref() {
            let raw = item.with_context(|| format!("reaction scan of {post_id}"))?;
            summary.items += 1;
            match self.handle_malformed(reaction_from_value(&raw, post_id), &raw, "reaction")? {
                Some(rec) => {
                    aggregator
                        .merge_record(&rec)
                        .with_context(|| format!("merge reaction of {} on {}", rec.user_id, post_id))?;
                    // Redelivered items must not show up twice in the snapshot either.
                    if seen.insert((rec.user_id.clone(), rec.reaction_type.clone())) {
                        collected.push(rec);
                        summary.written += 1;
                    }
                }
                None => summary.skipped += 1,
            }
        }

        aggregator
            .snapshot_post_reactions(post_id, &collected)
            .with_context(|| format!("snapshot reactions of {post_id}"))?;
        summary.pages = pages.pages_fetched();
        summary.elapsed = pages.elapsed().unwrap_or_default();
        Ok(summary)
    }

    /// Feed scan followed by a reaction scan of every post written to the table.
    /// Returns the feed summary and the combined reaction summary.
    pub fn scrape_page_with_reactions<S: DocumentStore>(
        &self,
        page_id: &str,
        out_dir: &Path,
        aggregator: &mut ReactionAggregator<S>,
    ) -> Result<(ScanSummary, ScanSummary)> {
        let feed = self.scrape_page_feed(page_id, out_dir)?;
        let mut reactions = ScanSummary::default();
        for post_id in &feed.post_ids {
            let s = self.scrape_post_reactions(post_id, aggregator)?;
            reactions.items += s.items;
            reactions.written += s.written;
            reactions.skipped += s.skipped;
            reactions.pages += s.pages;
            reactions.elapsed += s.elapsed;
        }
        tracing::info!(
            "{}: {} posts, {} reactions across {} pages",
            page_id,
            feed.written,
            reactions.written,
            reactions.pages
        );
        Ok((feed, reactions))
    }
}
