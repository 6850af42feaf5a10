//! Product catalog listing.

use chrono::{DateTime, Utc};

use super::atom::AtomFeed;

/// One product advertised by the catalog feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Catalog identifier of the product.
    pub guid: String,
    /// Human-readable product name.
    pub title: String,
    /// When the product was last updated, if reported.
    pub updated: Option<DateTime<Utc>>,
    /// Distribution formats available for the product.
    pub formats: Vec<String>,
}

/// Converts a catalog feed page into products, preserving feed order.
#[must_use]
pub fn products_from_feed(feed: AtomFeed) -> Vec<Product> {
    feed.entries
        .into_iter()
        .map(|entry| Product {
            guid: entry.id,
            title: entry.title,
            updated: entry.updated,
            formats: entry.distribution_formats,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::atom::parse_feed;

    #[test]
    fn test_products_from_feed_maps_entries() {
        let feed = parse_feed(
            r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:nls="http://xml.nls.fi/atom">
              <entry>
                <id>urn:product:maastotietokanta</id>
                <title>Maastotietokanta</title>
                <updated>2024-02-01T00:00:00Z</updated>
                <nls:distributionFormat>application/gml+xml</nls:distributionFormat>
              </entry>
              <entry>
                <id>urn:product:kiinteistorajat</id>
                <title>Kiinteistorajat</title>
              </entry>
            </feed>"#,
        )
        .unwrap();

        let products = products_from_feed(feed);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].guid, "urn:product:maastotietokanta");
        assert_eq!(products[0].formats, vec!["application/gml+xml"]);
        assert!(products[0].updated.is_some());
        assert!(products[1].updated.is_none());
        assert!(products[1].formats.is_empty());
    }
}
