//! Google Custom Search client.

use serde::Deserialize;
use tracing::debug;

const SEARCH_API_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// One (title, link) pair from the API's `items` array.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug)]
pub enum SearchError {
    Http(String),
    Parse(String),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Http(e) => write!(f, "HTTP error: {e}"),
            SearchError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for SearchError {}

pub struct SearchClient {
    api_key: String,
    engine_id: String,
    client: reqwest::Client,
}

impl SearchClient {
    pub fn new(api_key: String, engine_id: String) -> Self {
        Self {
            api_key,
            engine_id,
            client: reqwest::Client::new(),
        }
    }

    /// Run a query. A non-200 status reads as "no results", not an error.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!(
            "{}?q={}&key={}&cx={}",
            SEARCH_API_URL,
            urlencoding::encode(query),
            self.api_key,
            self.engine_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SearchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!("Search API returned {status}");
            return Ok(Vec::new());
        }

        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("failed to read response: {e}")))?;
        parse_results(&body)
    }
}

/// Parse the `items` array from a 200 response body. A missing `items`
/// field is an empty result set.
pub fn parse_results(body: &str) -> Result<Vec<SearchResult>, SearchError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Parse(e.to_string()))?;
    Ok(parsed.items)
}

/// Human-readable listing handed to the AI responder.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("**{}**: {}", r.title, r.link))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The summarization prompt for a non-empty result listing.
pub fn summary_prompt(results: &[SearchResult]) -> String {
    format!("Summarize these search results: {}", format_results(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_results_ordered_pairs() {
        let body = r#"{"items": [
            {"title": "Rust", "link": "https://rust-lang.org", "snippet": "ignored"},
            {"title": "Crates", "link": "https://crates.io"}
        ]}"#;
        let results = parse_results(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[1].link, "https://crates.io");
    }

    #[test]
    fn test_parse_results_missing_items_is_empty() {
        let results = parse_results(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_parse_results_malformed_body() {
        assert!(matches!(parse_results("not json"), Err(SearchError::Parse(_))));
    }

    #[test]
    fn test_format_results_listing() {
        let results = vec![
            SearchResult { title: "A".to_string(), link: "http://a".to_string() },
            SearchResult { title: "B".to_string(), link: "http://b".to_string() },
        ];
        assert_eq!(format_results(&results), "**A**: http://a\n**B**: http://b");
    }

    #[test]
    fn test_format_results_empty() {
        assert_eq!(format_results(&[]), "");
    }

    #[test]
    fn test_summary_prompt_wraps_listing() {
        let results = vec![SearchResult { title: "A".to_string(), link: "http://a".to_string() }];
        assert_eq!(
            summary_prompt(&results),
            "Summarize these search results: **A**: http://a"
        );
    }
}
