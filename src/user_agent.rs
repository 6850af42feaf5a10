//! Shared User-Agent string for feed and download HTTP clients.

/// Product token sent ahead of the version.
const PRODUCT: &str = "mml-sync";

/// Default User-Agent for every request this crate makes.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (nls-open-data-sync)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_crate_version() {
        let ua = default_user_agent();
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("mml-sync/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
            "UA must contain crate version"
        );
    }

    #[test]
    fn test_user_agent_is_ascii_header_value() {
        let ua = default_user_agent();
        assert!(ua.is_ascii(), "UA must be ASCII: {ua}");
        assert!(!ua.contains('\n'), "UA must be a single line: {ua}");
    }
}
