//! Integration tests for the extraction pipeline.
//!
//! These tests drive the pipeline the way a crawler would:
//! 1. Feed pages from a source in visitation order
//! 2. Register value-only and value-with-page consumers
//! 3. Check what each consumer saw, and in which order

use std::cell::RefCell;

use spider_extract::{
    testing::{html_page, icon_page, javascript_page, tls_page},
    Archive, Callback, Certificate, CrawlConfig, ExtractionPipeline, MockPageSource,
    MockSourceCall, PageRecord, PipelineError, SourceError, StreamSource,
};
use tokio_util::sync::CancellationToken;

/// Helper to mint a DER certificate with a fixed serial.
fn certificate(name: &str, serial: u64) -> Vec<u8> {
    let mut params = rcgen::CertificateParams::new(vec![name.to_string()]);
    params.serial_number = Some(serial.into());
    rcgen::Certificate::from_params(params)
        .unwrap()
        .serialize_der()
        .unwrap()
}

/// Helper to collect strings from a single registration.
fn collect_strings(pages: &[PageRecord]) -> Vec<String> {
    let mut values = Vec::new();
    let mut pipeline = ExtractionPipeline::new();
    pipeline.every_javascript_string(Callback::value(|s: &str| values.push(s.to_string())));
    pipeline.run_iter(pages);
    drop(pipeline);
    values
}

#[test]
fn test_comment_stream_html_then_inline_then_fetched() {
    let pages = vec![
        html_page(
            "https://example.com/",
            "<html><head><!-- A --></head><body><script type=\"text/javascript\">// B\n</script></body></html>",
        ),
        javascript_page("https://example.com/app.js", "/* C */"),
    ];

    let mut comments = Vec::new();
    let mut pipeline = ExtractionPipeline::new();
    pipeline.every_comment(Callback::value(|c: &str| comments.push(c.to_string())));
    let stats = pipeline.run_iter(&pages);
    drop(pipeline);

    assert_eq!(comments, vec!["A", "// B\n", "/* C */"]);
    assert_eq!(stats.html_comments, 1);
    assert_eq!(stats.javascript_comments, 2);
}

#[test]
fn test_arity_dispatch_same_scan() {
    let page = javascript_page(
        "https://example.com/app.js",
        r#"var a = "one"; var b = 'two';"#,
    );

    let mut values = Vec::new();
    let mut pairs = Vec::new();

    let mut pipeline = ExtractionPipeline::new();
    pipeline
        .every_javascript_string(Callback::value(|s: &str| values.push(s.to_string())))
        .every_javascript_string(Callback::with_page(|s: &str, page: &PageRecord| {
            pairs.push((s.to_string(), page.url.to_string()))
        }));
    let stats = pipeline.run_iter([&page]);
    drop(pipeline);

    assert_eq!(values, vec!["one", "two"]);
    assert_eq!(
        pairs,
        vec![
            ("one".to_string(), "https://example.com/app.js".to_string()),
            ("two".to_string(), "https://example.com/app.js".to_string()),
        ]
    );
    // Both consumers share one scan
    assert_eq!(stats.javascript_strings, 2);
}

#[test]
fn test_regex_literal_does_not_hide_sibling_strings() {
    let page = javascript_page(
        "https://example.com/app.js",
        "var bar = /foo/.test(foo);\nvar re = /\"quoted\"/g;\nvar ratio = width / height; var s = \"real\";",
    );

    assert_eq!(collect_strings(&[page]), vec!["real"]);
}

#[test]
fn test_template_literal_skipped() {
    let page = javascript_page(
        "https://example.com/app.js",
        "var t = `foo = \"${foo}\"`;\nvar after = \"kept\";",
    );

    let strings = collect_strings(&[page]);
    assert!(!strings.iter().any(|s| s == "foo = "));
    assert_eq!(strings, vec!["kept"]);
}

#[test]
fn test_path_and_url_classification() {
    let page = javascript_page(
        "https://example.com/app.js",
        r#"
        load("sub/directory");
        load("../up/directory");
        load("file.txt");
        load("/absolute/path");
        load("foo");
        fetch("https://api.example.com/v1");
        "#,
    );

    let relative = RefCell::new(Vec::new());
    let absolute = RefCell::new(Vec::new());
    let urls = RefCell::new(Vec::new());

    let mut pipeline = ExtractionPipeline::new();
    pipeline
        .every_javascript_relative_path_string(Callback::value(|s: &str| {
            relative.borrow_mut().push(s.to_string())
        }))
        .every_javascript_absolute_path_string(Callback::value(|s: &str| {
            absolute.borrow_mut().push(s.to_string())
        }))
        .every_javascript_url_string(Callback::value(|s: &str| {
            urls.borrow_mut().push(s.to_string())
        }));
    pipeline.run_iter([&page]);
    drop(pipeline);

    assert_eq!(
        relative.into_inner(),
        vec!["sub/directory", "../up/directory", "file.txt"]
    );
    assert_eq!(absolute.into_inner(), vec!["/absolute/path"]);
    assert_eq!(urls.into_inner(), vec!["https://api.example.com/v1"]);
}

#[tokio::test]
async fn test_hosts_and_certs_deduplicated_in_discovery_order() {
    let cert_a = certificate("example.com", 1);
    let cert_b = certificate("other.com", 2);

    let mut source = MockPageSource::new().with_pages(vec![
        tls_page("https://example.com/", cert_a.clone()),
        tls_page("https://example.com/link1", cert_a.clone()),
        tls_page("https://other.com/", cert_b),
        tls_page("https://example.com/link2", cert_a),
        html_page("http://sub.example.com/", "<p>plain</p>"),
    ]);
    let observer = source.clone();

    let mut hosts = Vec::new();
    let mut certs: Vec<Certificate> = Vec::new();

    let mut pipeline = ExtractionPipeline::new()
        .with_crawl_config(CrawlConfig::new().with_user_agent("spider-test"));
    pipeline
        .every_host(Callback::value(|h: &str| hosts.push(h.to_string())))
        .every_cert(Callback::value(|c: &Certificate| certs.push(c.clone())));
    let stats = pipeline.run(&mut source).await.unwrap();
    drop(pipeline);

    assert_eq!(hosts, vec!["example.com", "other.com", "sub.example.com"]);
    assert_eq!(
        certs
            .iter()
            .flat_map(|c| c.subject_alt_names.clone())
            .collect::<Vec<_>>(),
        vec!["example.com", "other.com"]
    );
    assert_eq!(stats.pages, 5);
    assert_eq!(stats.hosts, 3);
    assert_eq!(stats.certs, 2);

    match &observer.calls()[0] {
        MockSourceCall::Start { user_agent, .. } => {
            assert_eq!(user_agent.as_deref(), Some("spider-test"))
        }
        other => panic!("expected start call first, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_before_start_pulls_nothing() {
    let mut source = MockPageSource::new().with_page(html_page("https://example.com/", ""));
    let token = CancellationToken::new();
    token.cancel();

    let mut pipeline = ExtractionPipeline::new();
    let result = pipeline.run_until_cancelled(&mut source, token).await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(pipeline.stats().pages, 0);
    assert_eq!(source.remaining(), 1);
}

#[tokio::test]
async fn test_cancel_from_consumer_stops_after_current_page() {
    let mut source = MockPageSource::new().with_pages(vec![
        html_page("https://a.example.com/", ""),
        html_page("https://b.example.com/", ""),
        html_page("https://c.example.com/", ""),
    ]);
    let token = CancellationToken::new();
    let cancel = token.clone();

    let mut pipeline = ExtractionPipeline::new();
    pipeline.every_host(Callback::value(move |_: &str| cancel.cancel()));
    let result = pipeline.run_until_cancelled(&mut source, token).await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(pipeline.stats().pages, 1);
    assert_eq!(pipeline.hosts().collect::<Vec<_>>(), vec!["a.example.com"]);
    assert_eq!(source.remaining(), 2);
}

#[tokio::test]
async fn test_source_error_ends_run() {
    let mut source = MockPageSource::new()
        .with_pages(vec![
            html_page("https://example.com/", ""),
            html_page("https://example.com/down", ""),
        ])
        .fail_when_remaining(1, "https://example.com/down");

    let mut pipeline = ExtractionPipeline::new();
    let result = pipeline.run(&mut source).await;

    assert!(matches!(
        result,
        Err(PipelineError::Source(SourceError::Fetch { .. }))
    ));
    assert_eq!(pipeline.stats().pages, 1);
}

#[tokio::test]
async fn test_stream_source() {
    let pages = vec![
        Ok(javascript_page("https://example.com/a.js", "var a = 'x/y';")),
        Ok(javascript_page("https://example.com/b.js", "var b = '/z';")),
    ];
    let mut source = StreamSource::new("stream", futures::stream::iter(pages));

    let mut paths = Vec::new();
    let mut pipeline = ExtractionPipeline::new();
    pipeline.every_javascript_path_string(Callback::value(|s: &str| paths.push(s.to_string())));
    pipeline.run(&mut source).await.unwrap();
    drop(pipeline);

    assert_eq!(paths, vec!["x/y", "/z"]);
}

#[test]
fn test_favicons_archived_from_consumer() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Archive::open(dir.path()).unwrap();
    let pages = vec![
        html_page("https://example.com/", "<p>home</p>"),
        icon_page("https://example.com/favicon.ico"),
    ];

    let mut written = Vec::new();
    let mut pipeline = ExtractionPipeline::new();
    pipeline.every_favicon(Callback::value(|page: &PageRecord| {
        written.push(archive.write(&page.url, &page.body).unwrap())
    }));
    pipeline.run_iter(&pages);
    drop(pipeline);

    assert_eq!(written, vec![archive.root().join("favicon.ico")]);
    assert_eq!(std::fs::read(&written[0]).unwrap(), vec![0u8, 0, 1, 0]);
}
