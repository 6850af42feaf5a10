//! Integration tests for feed pagination and the product catalog.

mod support;

use std::path::Path;

use mml_sync_core::feed::FeedError;
use mml_sync_core::timestamp::default_epoch;
use support::{
    API_KEY, FeedItem, SCOPE_PATH, atom_page, feed_client, hits, mount_first_page, mount_page,
    page_url, scope,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_paginate_visits_every_page_once() {
    let server = MockServer::start().await;
    let dest = TempDir::new().expect("failed to create temp dir");

    let first = vec![FeedItem::new(&server, "a.zip", "2024-01-01T00:00:00Z")];
    let second = vec![FeedItem::new(&server, "b.zip", "2024-01-02T00:00:00Z")];
    let third = vec![FeedItem::new(&server, "c.zip", "2024-01-03T00:00:00Z")];

    mount_first_page(&server, atom_page(&first, Some(&page_url(&server, 2)))).await;
    mount_page(&server, 2, atom_page(&second, Some(&page_url(&server, 3)))).await;
    mount_page(&server, 3, atom_page(&third, None)).await;

    let client = feed_client(&server);
    let mut paginator = client
        .paginate(&scope(), default_epoch(), dest.path())
        .unwrap();

    let mut ids = Vec::new();
    while let Some(page) = paginator.next_page().await.unwrap() {
        ids.extend(page.into_iter().map(|entry| entry.title));
    }

    assert_eq!(ids, vec!["a.zip", "b.zip", "c.zip"]);
    assert_eq!(paginator.pages_fetched(), 3);
    assert_eq!(hits(&server, SCOPE_PATH).await, 3, "each page fetched exactly once");
    assert!(
        paginator.next_page().await.unwrap().is_none(),
        "exhausted paginator stays exhausted"
    );
}

#[tokio::test]
async fn test_paginate_sends_scope_filter_and_key() {
    let server = MockServer::start().await;
    let dest = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path(SCOPE_PATH))
        .and(query_param("format", "gml"))
        .and(query_param("updated", "1990-06-20T00:00:00"))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_string(atom_page(&[], None)))
        .expect(1)
        .mount(&server)
        .await;

    let entries = feed_client(&server)
        .paginate(&scope(), default_epoch(), dest.path())
        .unwrap()
        .collect_entries()
        .await
        .unwrap();

    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_paginate_normalizes_entries_against_destination() {
    let server = MockServer::start().await;
    let dest = TempDir::new().expect("failed to create temp dir");
    let item = FeedItem::new(&server, "present.zip", "2024-01-01T00:00:00Z");
    let missing = FeedItem::new(&server, "missing.zip", "2024-01-01T00:00:00Z");

    std::fs::create_dir_all(dest.path().join("mtk/1/gml")).unwrap();
    std::fs::write(dest.path().join(item.relative_path()), b"old").unwrap();
    mount_first_page(&server, atom_page(&[item.clone(), missing], None)).await;

    let entries = feed_client(&server)
        .paginate(&scope(), default_epoch(), dest.path())
        .unwrap()
        .collect_entries()
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, item.id);
    assert_eq!(entries[0].destination_dir, dest.path().join("mtk/1/gml"));
    assert_eq!(entries[0].destination_file, "present.zip");
    assert_eq!(entries[0].download_url, item.href);
    assert!(entries[0].exists_on_disk);
    assert!(!entries[1].exists_on_disk);
}

#[tokio::test]
async fn test_paginate_http_error_on_later_page_is_fatal() {
    let server = MockServer::start().await;
    let first = vec![FeedItem::new(&server, "a.zip", "2024-01-01T00:00:00Z")];
    mount_first_page(&server, atom_page(&first, Some(&page_url(&server, 2)))).await;
    Mock::given(method("GET"))
        .and(path(SCOPE_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&server)
        .await;

    let result = feed_client(&server)
        .paginate(&scope(), default_epoch(), Path::new("/nonexistent"))
        .unwrap()
        .collect_entries()
        .await;

    match result {
        Err(FeedError::HttpStatus { status, url }) => {
            assert_eq!(status, 503);
            assert!(!url.contains(API_KEY), "API key leaked in: {url}");
        }
        other => panic!("expected HTTP status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_paginate_malformed_page_is_parse_error() {
    let server = MockServer::start().await;
    mount_first_page(&server, "<feed><entry><id>x</entry>".to_string()).await;

    let result = feed_client(&server)
        .paginate(&scope(), default_epoch(), Path::new("/nonexistent"))
        .unwrap()
        .collect_entries()
        .await;

    assert!(matches!(result, Err(FeedError::Parse { .. })));
}

#[tokio::test]
async fn test_paginate_self_referencing_next_link_is_refused() {
    let server = MockServer::start().await;
    let items = vec![FeedItem::new(&server, "a.zip", "2024-01-01T00:00:00Z")];
    mount_first_page(&server, atom_page(&items, Some(&page_url(&server, 2)))).await;
    mount_page(&server, 2, atom_page(&[], Some(&page_url(&server, 2)))).await;

    let result = feed_client(&server)
        .paginate(&scope(), default_epoch(), Path::new("/nonexistent"))
        .unwrap()
        .collect_entries()
        .await;

    assert!(matches!(result, Err(FeedError::PaginationLoop { .. })));
}

#[tokio::test]
async fn test_list_products_reads_catalog() {
    let server = MockServer::start().await;
    let catalog = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:nls="http://xml.nls.fi/atom">
  <entry>
    <id>urn:product:maastotietokanta</id>
    <title>Maastotietokanta</title>
    <updated>2024-05-01T06:30:00Z</updated>
    <nls:distributionFormat>application/gml+xml</nls:distributionFormat>
    <nls:distributionFormat>application/x-shapefile</nls:distributionFormat>
  </entry>
  <entry>
    <id>urn:product:korkeusmalli</id>
    <title>Korkeusmalli</title>
    <updated>2024-04-01T00:00:00Z</updated>
  </entry>
</feed>"#;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog))
        .mount(&server)
        .await;

    let products = feed_client(&server).list_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].guid, "urn:product:maastotietokanta");
    assert_eq!(products[0].title, "Maastotietokanta");
    assert_eq!(
        products[0].formats,
        vec!["application/gml+xml", "application/x-shapefile"]
    );
    assert!(products[1].formats.is_empty());
}

#[tokio::test]
async fn test_paginate_follows_relative_next_link() {
    let server = MockServer::start().await;
    let first = vec![FeedItem::new(&server, "a.zip", "2024-01-01T00:00:00Z")];
    let second = vec![FeedItem::new(&server, "b.zip", "2024-01-02T00:00:00Z")];
    let relative = format!("{SCOPE_PATH}?format=gml&page=2&api_key={API_KEY}");
    mount_first_page(&server, atom_page(&first, Some(&relative))).await;
    mount_page(&server, 2, atom_page(&second, None)).await;

    let entries = feed_client(&server)
        .paginate(&scope(), default_epoch(), Path::new("/nonexistent"))
        .unwrap()
        .collect_entries()
        .await
        .unwrap();

    let titles: Vec<_> = entries.into_iter().map(|entry| entry.title).collect();
    assert_eq!(titles, vec!["a.zip", "b.zip"]);
}

#[tokio::test]
async fn test_paginate_gives_untitled_sibling_links_distinct_files() {
    let server = MockServer::start().await;
    let dest = TempDir::new().expect("failed to create temp dir");
    let page = format!(
        r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>urn:path:mtk/1/gml/L4131R</id>
    <title>L4131R</title>
    <updated>2024-01-01T00:00:00Z</updated>
    <link href="{uri}/files/L4131R.zip"/>
    <link href="{uri}/files/L4131R_meta.zip"/>
    <link rel="enclosure" href="{uri}/files/L4131R_meta.zip"/>
  </entry>
</feed>"#,
        uri = server.uri()
    );
    mount_first_page(&server, page).await;

    let entries = feed_client(&server)
        .paginate(&scope(), default_epoch(), dest.path())
        .unwrap()
        .collect_entries()
        .await
        .unwrap();

    let files: Vec<_> = entries
        .iter()
        .map(|entry| entry.destination_file.as_str())
        .collect();
    assert_eq!(files, vec!["L4131R.zip", "L4131R_meta.zip"]);
    assert!(entries.iter().all(|entry| entry.id == "urn:path:mtk/1/gml/L4131R"));
}
