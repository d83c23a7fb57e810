use anyhow::{anyhow, Result};
use graphscrape::{Credentials, JsonDirStore, PageScraper, ReactionAggregator, ScrapeOptions};
use std::fs;
use std::path::PathBuf;

const OUT_ROOT: &str = "./out";

fn main() -> Result<()> {
    let credentials = Credentials::from_env()
        .ok_or_else(|| anyhow!("set GRAPH_ACCESS_TOKEN, or GRAPH_APP_ID and GRAPH_APP_SECRET"))?;
    let page_id = std::env::var("GRAPH_PAGE_ID").map_err(|_| anyhow!("set GRAPH_PAGE_ID"))?;
    let out_dir = std::env::var("GRAPH_OUT_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(OUT_ROOT));
    let with_reactions = std::env::var("GRAPH_REACTIONS").map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);

    fs::create_dir_all(&out_dir)?;

    let opts = ScrapeOptions::default()
        .with_credentials(credentials)
        .with_page_size(100)
        .with_progress(true);
    let scraper = PageScraper::http(opts)?;

    if with_reactions {
        let store = JsonDirStore::open(out_dir.join("store"))?;
        let mut aggregator = ReactionAggregator::new(store);
        let (feed, reactions) = scraper.scrape_page_with_reactions(&page_id, &out_dir, &mut aggregator)?;
        println!(
            "{} statuses written to {}; {} reactions merged",
            feed.written,
            feed.output.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
            reactions.written
        );
    } else {
        let feed = scraper.scrape_page_feed(&page_id, &out_dir)?;
        println!(
            "{} statuses written to {} ({} skipped) in {:.2?}",
            feed.written,
            feed.output.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
            feed.skipped,
            feed.elapsed
        );
    }

    Ok(())
}
