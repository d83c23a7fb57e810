#[path = "common/mod.rs"]
mod common;

use common::*;
use graphscrape::{MalformedPolicy, NormalizeError, PageScraper, TableFormat, POST_COLUMNS};
use std::fs;
use std::time::Duration;

/// Two pages with one post each; the second post has no `likes` edge.
/// Output: header + 2 rows, second row's num_likes is 0, timestamps shifted to UTC-8.
#[test]
fn two_page_feed_to_csv() {
    let first_url = url_builder().feed_url("page1").unwrap();
    let mut second = post("page1_2", "2016-03-02T01:00:00+0000");
    second.as_object_mut().unwrap().remove("likes");

    let t = ScriptedTransport::new()
        .page(&first_url, page(vec![post("page1_1", "2016-03-01T12:00:00+0000")], Some("http://graph.test/next/2")))
        .page("http://graph.test/next/2", page(vec![second], None));

    let dir = tempfile::tempdir().unwrap();
    let scraper = PageScraper::with_transport(test_options(), t);
    let summary = scraper.scrape_page_feed("page1", dir.path()).unwrap();

    let out = dir.path().join("page1_statuses.csv");
    assert_eq!(summary.output.as_deref(), Some(out.as_path()));
    assert_eq!((summary.items, summary.written, summary.skipped, summary.pages), (2, 2, 0, 2));
    assert_eq!(summary.post_ids, vec!["page1_1", "page1_2"]);

    let rows = csv_rows(&fs::read_to_string(&out).unwrap());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], POST_COLUMNS.to_vec());

    let likes = POST_COLUMNS.iter().position(|c| *c == "num_likes").unwrap();
    let published = POST_COLUMNS.iter().position(|c| *c == "post_published").unwrap();
    assert_eq!(rows[1][0], "page1_1");
    assert_eq!(rows[1][likes], "10");
    assert_eq!(rows[1][published], "2016-03-01 04:00:00");
    assert_eq!(rows[2][0], "page1_2");
    assert_eq!(rows[2][likes], "0");
    assert_eq!(rows[2][published], "2016-03-01 17:00:00");
    assert!(!dir.path().join("page1_statuses.csv.part").exists());
}

/// The initial request carries fields, limit and the `<id>|<secret>` token.
#[test]
fn initial_feed_url_shape() {
    let url = url_builder().feed_url("page1").unwrap();
    assert!(url.starts_with("http://graph.test/v1/page1/feed?fields="), "{url}");
    assert!(url.contains("limit=2"), "{url}");
    assert!(url.contains("access_token=app%7Csecret"), "{url}");

    let url = url_builder().reactions_url("page1_9").unwrap();
    assert_eq!(url, "http://graph.test/v1/page1_9/reactions?limit=2&access_token=app%7Csecret");
}

/// Ids are a single path segment; reserved characters cannot reshape the request.
#[test]
fn node_id_is_escaped_in_path() {
    let url = url_builder().reactions_url("a/b?limit=1").unwrap();
    assert_eq!(url, "http://graph.test/v1/a%2Fb%3Flimit=1/reactions?limit=2&access_token=app%7Csecret");
    assert!(url_builder().reactions_url(" ").is_err());
}

/// The reported duration covers the first request too, however long it takes.
#[test]
fn elapsed_covers_slow_first_page() {
    let first_url = url_builder().feed_url("page1").unwrap();
    let t = ScriptedTransport::new()
        .page(&first_url, page(vec![post("page1_1", "2016-03-01T12:00:00+0000")], None))
        .delayed(Duration::from_millis(120));
    let dir = tempfile::tempdir().unwrap();
    let summary = PageScraper::with_transport(test_options(), t)
        .scrape_page_feed("page1", dir.path())
        .unwrap();
    assert_eq!(summary.pages, 1);
    assert!(summary.elapsed >= Duration::from_millis(120), "{:?}", summary.elapsed);
}

/// Default policy: a post missing a required field aborts the scan and no final file appears.
#[test]
fn malformed_post_aborts_by_default() {
    let first_url = url_builder().feed_url("page1").unwrap();
    let mut bad = post("page1_2", "2016-03-02T01:00:00+0000");
    bad.as_object_mut().unwrap().remove("from");

    let t = ScriptedTransport::new().page(&first_url, page(vec![post("page1_1", "2016-03-01T12:00:00+0000"), bad], None));
    let dir = tempfile::tempdir().unwrap();
    let err = PageScraper::with_transport(test_options(), t)
        .scrape_page_feed("page1", dir.path())
        .unwrap_err();

    assert_eq!(err.downcast_ref::<NormalizeError>(), Some(&NormalizeError::MissingField("from")));
    assert!(!dir.path().join("page1_statuses.csv").exists());
}

/// Skip policy: only the bad item is dropped.
#[test]
fn malformed_post_is_skipped_when_asked() {
    let first_url = url_builder().feed_url("page1").unwrap();
    let mut bad = post("page1_2", "2016-03-02T01:00:00+0000");
    bad["likes"] = serde_json::json!({"data": []});

    let t = ScriptedTransport::new().page(
        &first_url,
        page(vec![post("page1_1", "2016-03-01T12:00:00+0000"), bad, post("page1_3", "2016-03-03T12:00:00+0000")], None),
    );
    let dir = tempfile::tempdir().unwrap();
    let summary = PageScraper::with_transport(test_options(), t)
        .on_malformed(MalformedPolicy::Skip)
        .scrape_page_feed("page1", dir.path())
        .unwrap();

    assert_eq!((summary.items, summary.written, summary.skipped), (3, 2, 1));
    let rows = csv_rows(&fs::read_to_string(dir.path().join("page1_statuses.csv")).unwrap());
    let ids: Vec<&str> = rows.iter().skip(1).map(|r| r[0].as_str()).collect();
    assert_eq!(ids, vec!["page1_1", "page1_3"]);
}

/// A second run replaces the table instead of appending below the old rows.
#[test]
fn rerun_replaces_tsv_output() {
    let first_url = url_builder().feed_url("page1").unwrap();
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..2 {
        let t = ScriptedTransport::new().page(&first_url, page(vec![post("page1_1", "2016-03-01T12:00:00+0000")], None));
        PageScraper::with_transport(test_options(), t)
            .table_format(TableFormat::Tsv)
            .scrape_page_feed("page1", dir.path())
            .unwrap();
    }
    let text = fs::read_to_string(dir.path().join("page1_statuses.tsv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], POST_COLUMNS.join("\t"));
    assert!(lines[1].starts_with("page1_1\tmessage of page1_1\tpage1\tPage One\t"));
}

/// A non-JSON body is fatal even under the skip policy.
#[test]
fn invalid_json_body_is_fatal() {
    let first_url = url_builder().feed_url("page1").unwrap();
    let t = ScriptedTransport::new()
        .page(&first_url, page(vec![post("page1_1", "2016-03-01T12:00:00+0000")], Some("http://graph.test/next/2")))
        .on("http://graph.test/next/2", vec![Reply::Body("<html>maintenance</html>".into())]);
    let dir = tempfile::tempdir().unwrap();
    let res = PageScraper::with_transport(test_options(), t)
        .on_malformed(MalformedPolicy::Skip)
        .scrape_page_feed("page1", dir.path());
    assert!(res.is_err());
}
