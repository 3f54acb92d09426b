use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::crawler::CrawlerError;

/// 首頁 script 內 `$.post('/json', {param: "..."})` 的參數
static PARAM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)json', \{param: "([^"]+)""#).expect("Failed to compile param regex")
});

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("Failed to parse script selector"));

/// Strategy for pulling the one-time token out of the homepage.
pub trait TokenExtractor: Send + Sync {
    fn extract(&self, homepage: &str) -> Result<String, CrawlerError>;
}

/// Scans the whole page text for the token literal.
#[derive(Debug, Default, Copy, Clone)]
pub struct PatternExtractor;

impl TokenExtractor for PatternExtractor {
    fn extract(&self, homepage: &str) -> Result<String, CrawlerError> {
        extract_token(homepage)
    }
}

/// Parses the document and only looks inside `<script>` elements, so the
/// literal showing up in visible text or attributes is ignored.
#[derive(Debug, Default, Copy, Clone)]
pub struct ScriptExtractor;

impl TokenExtractor for ScriptExtractor {
    fn extract(&self, homepage: &str) -> Result<String, CrawlerError> {
        let document = Html::parse_document(homepage);

        document
            .select(&SCRIPT_SELECTOR)
            .find_map(|script| capture(&script.text().collect::<String>()))
            .ok_or(CrawlerError::TokenExtraction)
    }
}

/// Returns the first `param` token found in `homepage`.
pub fn extract_token(homepage: &str) -> Result<String, CrawlerError> {
    capture(homepage).ok_or(CrawlerError::TokenExtraction)
}

fn capture(text: &str) -> Option<String> {
    PARAM_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
