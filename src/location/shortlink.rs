//! Short-link detection and expansion.
//!
//! Expansion flow:  expander 1 → expander 2 → … → original URL unchanged

use super::providers::LinkExpander;
use super::types::ResolveError;

/// Shortener domains recognised out of the box.
pub const DEFAULT_SHORTENER_DOMAINS: &[&str] = &["goo.gl", "maps.app.goo.gl", "bit.ly", "tinyurl.com"];

/// Ordered expansion strategy list plus the domains that trigger it.
pub struct ShortLinkResolver {
    domains: Vec<String>,
    expanders: Vec<Box<dyn LinkExpander>>,
}

impl ShortLinkResolver {
    pub fn new(domains: Vec<String>, expanders: Vec<Box<dyn LinkExpander>>) -> Self {
        Self { domains, expanders }
    }

    pub fn expander_names(&self) -> Vec<&'static str> {
        self.expanders.iter().map(|e| e.name()).collect()
    }

    /// Case-sensitive substring test against the shortener domains.
    pub fn is_short_link(&self, url: &str) -> bool {
        self.domains.iter().any(|d| url.contains(d.as_str()))
    }

    /// Try each expander in order; the first success wins.
    pub async fn try_expand(&self, url: &str) -> Result<String, ResolveError> {
        for expander in &self.expanders {
            match expander.expand(url).await {
                Ok(long) => {
                    tracing::info!(expander = expander.name(), %long, "short link expanded");
                    return Ok(long);
                }
                Err(e) => {
                    tracing::warn!(expander = expander.name(), error = %e, "expansion failed");
                }
            }
        }
        Err(ResolveError::NoShortLinkExpansion)
    }

    /// Expand `url`, degrading to the original text when every expander fails.
    pub async fn expand(&self, url: &str) -> String {
        match self.try_expand(url).await {
            Ok(long) => long,
            Err(e) => {
                tracing::debug!(error = %e, "using unexpanded url");
                url.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::http::testing::ScriptedHttp;
    use super::super::http::HttpFetch;
    use super::super::providers::{AllOriginsProxy, UnshortenMe};
    use super::*;
    use std::sync::Arc;

    fn resolver(http: Arc<dyn HttpFetch>) -> ShortLinkResolver {
        ShortLinkResolver::new(
            DEFAULT_SHORTENER_DOMAINS.iter().map(|d| d.to_string()).collect(),
            vec![
                Box::new(UnshortenMe::new(http.clone(), UnshortenMe::DEFAULT_ENDPOINT).unwrap()),
                Box::new(AllOriginsProxy::new(http, AllOriginsProxy::DEFAULT_ENDPOINT).unwrap()),
            ],
        )
    }

    #[test]
    fn test_is_short_link() {
        let r = resolver(Arc::new(ScriptedHttp::new()));
        assert!(r.is_short_link("https://goo.gl/maps/abc"));
        assert!(r.is_short_link("https://maps.app.goo.gl/xyz"));
        assert!(r.is_short_link("https://bit.ly/3abc"));
        assert!(r.is_short_link("https://tinyurl.com/y7k"));
        assert!(!r.is_short_link("https://www.google.com/maps/place/X/@23.15371,79.753135,17z"));
        // case-sensitive
        assert!(!r.is_short_link("https://BIT.LY/3abc"));
    }

    #[tokio::test]
    async fn test_primary_wins_without_touching_fallback() {
        let http = Arc::new(
            ScriptedHttp::new()
                .reply("https://unshorten.me/", 200, "https://maps.google.com/?q=1.0,2.0")
                .reply("https://api.allorigins.win/", 200, r#"{"contents":"https://maps.google.com/?q=9.0,9.0"}"#),
        );
        let r = resolver(http.clone());
        assert_eq!(r.expand("https://bit.ly/x").await, "https://maps.google.com/?q=1.0,2.0");
        assert_eq!(http.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_after_primary_error() {
        let http = Arc::new(
            ScriptedHttp::new()
                .fail("https://unshorten.me/")
                .reply("https://api.allorigins.win/", 200, r#"{"contents":"https://maps.google.com/?q=9.0,9.0"}"#),
        );
        let r = resolver(http.clone());
        assert_eq!(r.expand("https://bit.ly/x").await, "https://maps.google.com/?q=9.0,9.0");
        assert_eq!(http.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_both_fail_returns_original() {
        let http = Arc::new(
            ScriptedHttp::new()
                .fail("https://unshorten.me/")
                .fail("https://api.allorigins.win/"),
        );
        let r = resolver(http);
        assert_eq!(r.expand("https://goo.gl/maps/abc").await, "https://goo.gl/maps/abc");
        assert_eq!(
            r.try_expand("https://goo.gl/maps/abc").await,
            Err(ResolveError::NoShortLinkExpansion)
        );
    }

    #[test]
    fn test_expander_order() {
        let r = resolver(Arc::new(ScriptedHttp::new()));
        assert_eq!(r.expander_names(), vec!["unshorten.me", "allorigins"]);
    }
}
