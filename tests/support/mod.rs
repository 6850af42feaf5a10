//! Shared fixtures for feed and sync integration tests: Atom page builders,
//! in-memory zip archives and wiremock helpers.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use mml_sync_core::feed::{FeedClient, FeedSettings};
use mml_sync_core::ScopeKey;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;

/// API key every test client sends.
pub const API_KEY: &str = "test-key";

/// Feed path of [`scope`] under the mock server.
pub const SCOPE_PATH: &str = "/feed/maastotietokanta/1";

/// The scope used throughout the integration tests.
pub fn scope() -> ScopeKey {
    ScopeKey::new("maastotietokanta", "1", "gml")
}

/// One Atom entry with a single downloadable link.
#[derive(Debug, Clone)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub updated: String,
    pub href: String,
}

impl FeedItem {
    /// Entry `name` under `mtk/1/gml/`, served from `/files/<name>`.
    pub fn new(server: &MockServer, name: &str, updated: &str) -> Self {
        Self {
            id: format!("urn:path:mtk/1/gml/{name}"),
            title: name.to_string(),
            updated: updated.to_string(),
            href: format!("{}/files/{name}", server.uri()),
        }
    }

    /// Path relative to the destination root the entry is written to.
    pub fn relative_path(&self) -> String {
        format!("mtk/1/gml/{}", self.title)
    }
}

/// Renders an Atom page. `next` is a plain URL; it is double-escaped the way
/// the live service does.
pub fn atom_page(items: &[FeedItem], next: Option<&str>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>test feed</title>
"#,
    );
    if let Some(next) = next {
        xml.push_str(&format!(
            "  <link rel=\"next\" href=\"{}\"/>\n",
            next.replace('&', "&amp;amp;")
        ));
    }
    for item in items {
        xml.push_str(&format!(
            r#"  <entry>
    <id>{id}</id>
    <title>{title}</title>
    <updated>{updated}</updated>
    <link href="{href}" type="application/zip" title="{title}"/>
  </entry>
"#,
            id = item.id,
            title = item.title,
            updated = item.updated,
            href = item.href,
        ));
    }
    xml.push_str("</feed>\n");
    xml
}

/// Builds a stored zip archive with one member.
pub fn zip_bytes(member: &str, content: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    writer.start_file(member, options).expect("start zip member");
    writer.write_all(content).expect("write zip member");
    writer.finish().expect("finish zip").into_inner()
}

/// A valid archive comfortably above the verification threshold.
pub fn valid_archive() -> Vec<u8> {
    zip_bytes("data.gml", b"<gml>plenty of feature data</gml>")
}

/// Feed client pointed at the mock server.
pub fn feed_client(server: &MockServer) -> FeedClient {
    FeedClient::new(FeedSettings::new(format!("{}/feed", server.uri()), API_KEY))
        .expect("feed client")
}

/// Serves `body` as the first page of [`scope`]'s feed.
pub async fn mount_first_page(server: &MockServer, body: String) {
    Mock::given(method("GET"))
        .and(path(SCOPE_PATH))
        .and(query_param("api_key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Serves `body` for requests carrying `page=<page>`; wins over the first page.
pub async fn mount_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(SCOPE_PATH))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Serves `bytes` at `/files/<name>`.
pub async fn mount_file(server: &MockServer, name: &str, bytes: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
        .mount(server)
        .await;
}

/// URL of page `page` of [`scope`]'s feed, as the service would link it.
pub fn page_url(server: &MockServer, page: u32) -> String {
    format!(
        "{}{SCOPE_PATH}?format=gml&page={page}&api_key={API_KEY}",
        server.uri()
    )
}

/// Number of requests the server received for `request_path`.
pub async fn hits(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}
