//! Credential redaction for URLs written to logs.

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static API_KEY_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(api_key=)[^&#\s]*").expect("static API key regex is valid")
});

/// Replaces the value of any `api_key` query parameter with `***`.
#[must_use]
pub fn redact_url(url: &str) -> String {
    API_KEY_PARAM.replace_all(url, "${1}***").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_url_masks_api_key_value() {
        let redacted = redact_url("https://host/feed/p/1?format=gml&api_key=secret123&page=2");
        assert_eq!(redacted, "https://host/feed/p/1?format=gml&api_key=***&page=2");
    }

    #[test]
    fn test_redact_url_leaves_other_urls_untouched() {
        let url = "https://host/feed?format=gml";
        assert_eq!(redact_url(url), url);
    }

    #[test]
    fn test_redact_url_masks_every_occurrence() {
        let redacted = redact_url("https://a?api_key=x&next=https://b?API_KEY=y");
        assert_eq!(redacted, "https://a?api_key=***&next=https://b?API_KEY=***");
    }
}
