//! Plain-text rendering of command results.

use std::fmt::Write as _;

use chrono::SecondsFormat;
use mml_sync_core::Product;

/// Renders the product catalog, one block per product:
/// `updated<TAB>title`, the product GUID, one tab-indented line per format and
/// a blank separator line.
#[must_use]
pub(crate) fn format_products(products: &[Product]) -> String {
    let mut out = String::new();
    for product in products {
        let updated = product
            .updated
            .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        let _ = writeln!(out, "{updated}\t{}", product.title);
        let _ = writeln!(out, "{}", product.guid);
        for format in &product.formats {
            let _ = writeln!(out, "\t{format}");
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_format_products_layout() {
        let products = vec![
            Product {
                guid: "urn:product:maastotietokanta".to_string(),
                title: "Maastotietokanta".to_string(),
                updated: Some(Utc.with_ymd_and_hms(2024, 5, 1, 6, 30, 0).unwrap()),
                formats: vec!["application/gml+xml".to_string(), "image/tiff".to_string()],
            },
            Product {
                guid: "urn:product:korkeusmalli".to_string(),
                title: "Korkeusmalli".to_string(),
                updated: None,
                formats: Vec::new(),
            },
        ];

        assert_eq!(
            format_products(&products),
            "2024-05-01T06:30:00Z\tMaastotietokanta\n\
             urn:product:maastotietokanta\n\
             \tapplication/gml+xml\n\
             \timage/tiff\n\
             \n\
             \tKorkeusmalli\n\
             urn:product:korkeusmalli\n\
             \n"
        );
    }

    #[test]
    fn test_format_products_empty_catalog() {
        assert_eq!(format_products(&[]), "");
    }
}
