//! Minimal Atom reader for the change feed.
//!
//! Elements are matched by local name so the reader does not care which prefix
//! a document binds to the Atom or vendor namespaces. Only the parts the sync
//! engine consumes are kept: feed-level links, entry identity and timestamps,
//! entry links and the vendor `distributionFormat` extension.

use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

use crate::timestamp::parse_timestamp;

/// Link relations that describe downloadable content.
const CONTENT_RELATIONS: &[&str] = &["alternate", "enclosure"];

/// Errors produced while reading an Atom document.
#[derive(Debug, Error)]
pub enum AtomError {
    /// The document is not well-formed XML.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An element carries a malformed attribute.
    #[error("attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// A timestamp is not ISO-8601.
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),

    /// A link `length` is not a byte count.
    #[error("invalid link length '{0}'")]
    Length(String),
}

/// A parsed feed page.
#[derive(Debug, Clone, Default)]
pub struct AtomFeed {
    /// Feed-level links (pagination, self).
    pub links: Vec<AtomLink>,
    /// Entries in document order.
    pub entries: Vec<AtomEntry>,
}

impl AtomFeed {
    /// Returns the href of the feed-level `rel="next"` link, if present.
    #[must_use]
    pub fn next_href(&self) -> Option<&str> {
        self.links
            .iter()
            .rev()
            .find(|link| link.rel.as_deref() == Some("next"))
            .map(|link| link.href.as_str())
    }
}

/// One `<entry>`.
#[derive(Debug, Clone, Default)]
pub struct AtomEntry {
    /// Entry `<id>`.
    pub id: String,
    /// Entry `<title>`.
    pub title: String,
    /// Entry `<updated>`.
    pub updated: Option<DateTime<Utc>>,
    /// Links carried by the entry.
    pub links: Vec<AtomLink>,
    /// Vendor `distributionFormat` values, in document order.
    pub distribution_formats: Vec<String>,
}

/// One `<link>` element.
#[derive(Debug, Clone, Default)]
pub struct AtomLink {
    /// Link target (XML-unescaped).
    pub href: String,
    /// Relation, absent for plain content links.
    pub rel: Option<String>,
    /// Advertised media type.
    pub media_type: Option<String>,
    /// Advertised byte length.
    pub length: Option<u64>,
    /// Per-link title.
    pub title: Option<String>,
    /// Link-level update timestamp (vendor extension).
    pub updated: Option<DateTime<Utc>>,
}

impl AtomLink {
    /// Returns true when the link points at a downloadable resource rather than
    /// another feed document.
    #[must_use]
    pub fn is_downloadable(&self) -> bool {
        if self.href.trim().is_empty() {
            return false;
        }
        self.rel
            .as_deref()
            .is_none_or(|rel| CONTENT_RELATIONS.contains(&rel))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryField {
    Id,
    Title,
    Updated,
    DistributionFormat,
}

impl EntryField {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"id" => Some(Self::Id),
            b"title" => Some(Self::Title),
            b"updated" => Some(Self::Updated),
            b"distributionFormat" => Some(Self::DistributionFormat),
            _ => None,
        }
    }
}

/// Parses an Atom document.
///
/// Entry fields and links are taken only from direct children of `<entry>`,
/// and feed links only from direct children of the root element. Values from
/// nested elements such as `<source>` are ignored.
///
/// # Errors
///
/// Returns [`AtomError`] when the XML is malformed or a timestamp/length
/// attribute cannot be interpreted.
pub fn parse_feed(xml: &str) -> Result<AtomFeed, AtomError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut feed = AtomFeed::default();
    let mut depth = 0usize;
    // Open entry and the depth of its `<entry>` element.
    let mut entry: Option<(AtomEntry, usize)> = None;
    let mut field: Option<EntryField> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                depth += 1;
                let name = element.local_name();
                match entry.as_ref().map(|(_, entry_depth)| *entry_depth) {
                    None if name.as_ref() == b"entry" => {
                        entry = Some((AtomEntry::default(), depth));
                    }
                    Some(entry_depth) if depth == entry_depth + 1 => {
                        if name.as_ref() == b"link" {
                            push_link(&mut feed, entry.as_mut(), parse_link(&element)?);
                        } else if field.is_none() {
                            field = EntryField::from_local_name(name.as_ref());
                            text.clear();
                        }
                    }
                    None if depth == 2 && name.as_ref() == b"link" => {
                        push_link(&mut feed, None, parse_link(&element)?);
                    }
                    _ => {}
                }
            }
            Event::Empty(element) => {
                if element.local_name().as_ref() == b"link" {
                    let link_depth = depth + 1;
                    match entry.as_ref().map(|(_, entry_depth)| *entry_depth) {
                        Some(entry_depth) if link_depth == entry_depth + 1 => {
                            push_link(&mut feed, entry.as_mut(), parse_link(&element)?);
                        }
                        None if link_depth == 2 => {
                            push_link(&mut feed, None, parse_link(&element)?);
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(content) => {
                if field.is_some() {
                    text.push_str(&content.unescape()?);
                }
            }
            Event::CData(content) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&content.into_inner()));
                }
            }
            Event::End(_) => {
                let closing = depth;
                depth = depth.saturating_sub(1);
                let Some(entry_depth) = entry.as_ref().map(|(_, entry_depth)| *entry_depth) else {
                    continue;
                };
                if closing == entry_depth {
                    if let Some((done, _)) = entry.take() {
                        feed.entries.push(done);
                    }
                    field = None;
                } else if closing == entry_depth + 1
                    && let Some(current) = field.take()
                    && let Some((target, _)) = entry.as_mut()
                {
                    assign_field(target, current, text.trim())?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(feed)
}

fn push_link(feed: &mut AtomFeed, entry: Option<&mut (AtomEntry, usize)>, link: AtomLink) {
    match entry {
        Some((entry, _)) => entry.links.push(link),
        None => feed.links.push(link),
    }
}

fn assign_field(entry: &mut AtomEntry, field: EntryField, value: &str) -> Result<(), AtomError> {
    match field {
        EntryField::Id => entry.id = value.to_string(),
        EntryField::Title => entry.title = value.to_string(),
        EntryField::Updated => {
            let parsed =
                parse_timestamp(value).ok_or_else(|| AtomError::Timestamp(value.to_string()))?;
            entry.updated = Some(parsed);
        }
        EntryField::DistributionFormat => {
            if !value.is_empty() {
                entry.distribution_formats.push(value.to_string());
            }
        }
    }
    Ok(())
}

fn parse_link(element: &BytesStart<'_>) -> Result<AtomLink, AtomError> {
    let mut link = AtomLink::default();
    for attribute in element.attributes() {
        let attribute = attribute?;
        let value = attribute.unescape_value()?.trim().to_string();
        match attribute.key.local_name().as_ref() {
            b"href" => link.href = value,
            b"rel" => link.rel = Some(value).filter(|rel| !rel.is_empty()),
            b"type" => link.media_type = Some(value).filter(|kind| !kind.is_empty()),
            b"title" => link.title = Some(value).filter(|title| !title.is_empty()),
            b"length" if !value.is_empty() => {
                link.length = Some(value.parse().map_err(|_| AtomError::Length(value))?);
            }
            b"updated" if !value.is_empty() => {
                link.updated =
                    Some(parse_timestamp(&value).ok_or(AtomError::Timestamp(value))?);
            }
            _ => {}
        }
    }
    Ok(link)
}
