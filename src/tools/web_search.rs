//! `web_search` tool backed by DuckDuckGo's HTML endpoint.
//!
//! Search failures never surface as errors to the model: [`search`] flattens
//! them into an `"Error performing web search: ..."` observation string.
//! The model cannot tell that apart from a real result except by the prefix.

use super::Tool;
use crate::schemas::Validator;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{pin::Pin, sync::Arc, sync::OnceLock};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

const NO_RESULTS: &str = "No search results found.";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; web-search-agent/0.1)";

/// One hit as returned by the search provider. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    #[serde(rename = "body")]
    pub snippet: Option<String>,
    #[serde(rename = "href")]
    pub url: Option<String>,
}

impl SearchHit {
    pub fn new(title: &str, snippet: &str, url: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            snippet: Some(snippet.to_string()),
            url: Some(url.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("search provider returned HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Provider(String),
}

/// A text-search engine the adapter can query
#[async_trait]
pub trait SearchBackend: Send + Sync + std::fmt::Debug {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;
}

/// Render hits as the numbered report handed back to the model
pub fn format_search_results(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_RESULTS.to_string();
    }

    hits.iter()
        .enumerate()
        .map(|(idx, hit)| {
            format!(
                "{}. {}\n   {}\n   URL: {}",
                idx + 1,
                hit.title.as_deref().unwrap_or("No title"),
                hit.snippet.as_deref().unwrap_or("No description"),
                hit.url.as_deref().unwrap_or("No URL"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Run one search and format it, keeping failures as a typed error
pub async fn search_report(
    backend: &dyn SearchBackend,
    query: &str,
    max_results: usize,
) -> Result<String, SearchError> {
    let hits = backend.text(query, max_results).await?;
    debug!(query, hits = hits.len(), "web search completed");
    Ok(format_search_results(&hits))
}

/// Run one search; failures come back as a descriptive string instead of an error
pub async fn search(backend: &dyn SearchBackend, query: &str, max_results: usize) -> String {
    match search_report(backend, query, max_results).await {
        Ok(report) => report,
        Err(err) => {
            warn!(query, "web search failed: {}", err);
            format!("Error performing web search: {}", err)
        }
    }
}

/// Scrapes DuckDuckGo's no-JavaScript results page
#[derive(Debug, Clone)]
pub struct DuckDuckGoBackend {
    client: Client,
    endpoint: String,
}

impl Default for DuckDuckGoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoBackend {
    pub fn new() -> Self {
        Self::with_endpoint(DUCKDUCKGO_HTML_URL)
    }

    /// Point the backend at another results page, e.g. a local mock server
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SearchBackend for DuckDuckGoBackend {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(parse_results_page(&html, max_results))
    }
}

fn block_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<div class="result\b([^"]*)""#).expect("valid regex"))
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#).expect("valid regex")
    })
}

fn href_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"href="([^"]*)""#).expect("valid regex"))
}

fn snippet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
            .expect("valid regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid regex"))
}

/// Extract organic results from a DuckDuckGo HTML page, in page order
fn parse_results_page(html: &str, max_results: usize) -> Vec<SearchHit> {
    let starts: Vec<(usize, bool)> = block_start_re()
        .captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let is_ad = caps
                .get(1)
                .map(|class| class.as_str().contains("result--ad"))
                .unwrap_or(false);
            Some((whole.start(), is_ad))
        })
        .collect();

    let mut hits = Vec::new();

    for (idx, (start, is_ad)) in starts.iter().enumerate() {
        if hits.len() >= max_results {
            break;
        }
        if *is_ad {
            continue;
        }

        let end = starts.get(idx + 1).map(|(next, _)| *next).unwrap_or(html.len());
        let block = &html[*start..end];

        let Some(title_caps) = title_re().captures(block) else {
            continue;
        };

        let title = non_empty(clean_text(&title_caps[2]));
        let url = href_re()
            .captures(&title_caps[1])
            .map(|caps| resolve_result_url(&caps[1]))
            .and_then(non_empty);
        let snippet = snippet_re()
            .captures(block)
            .map(|caps| clean_text(&caps[1]))
            .and_then(non_empty);

        hits.push(SearchHit {
            title,
            snippet,
            url,
        });
    }

    hits
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn clean_text(fragment: &str) -> String {
    let stripped = tag_re().replace_all(fragment, "");
    let decoded = html_decode(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// DuckDuckGo wraps result links in `//duckduckgo.com/l/?uddg=<target>`
fn resolve_result_url(href: &str) -> String {
    let href = html_decode(href);
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.clone()
    };

    url::Url::parse(&absolute)
        .ok()
        .and_then(|parsed| {
            parsed
                .query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or(href)
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos|nbsp);")
            .expect("valid regex")
    })
}

/// Decode character references in one pass, so `&amp;lt;` stays `&lt;`
fn html_decode(s: &str) -> String {
    entity_re()
        .replace_all(s, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ => {
                    let hex = entity
                        .strip_prefix("#x")
                        .or_else(|| entity.strip_prefix("#X"));
                    let code = match hex {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity[1..].parse::<u32>().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Parameters accepted by the web search tool
#[derive(Debug, Serialize, Deserialize)]
pub struct WebSearchParams {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// Tool that lets the model search the web
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    backend: Arc<dyn SearchBackend>,
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSearchTool {
    /// Search through DuckDuckGo
    pub fn new() -> Self {
        Self::with_backend(DuckDuckGoBackend::new())
    }

    pub fn with_backend(backend: impl SearchBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }
}

impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        "web_search"
    }

    fn description(&self) -> &'static str {
        "Search the web for current information using DuckDuckGo. Use this when you need up-to-date information or facts that you don't already know."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "max_results": {"type": "integer", "default": DEFAULT_MAX_RESULTS}
            },
            "required": ["query"]
        })
    }

    fn execute(
        &self,
        parameters: serde_json::Value,
    ) -> Pin<
        Box<
            dyn std::future::Future<Output = Result<serde_json::Value, crate::AgentError>>
                + Send
                + '_,
        >,
    > {
        Box::pin(async move {
            let params: WebSearchParams =
                Validator::SerdeFirst.validate(parameters).map_err(|e| {
                    crate::AgentError::ToolExecution(format!("Invalid parameters: {}", e))
                })?;

            let report = search(self.backend.as_ref(), &params.query, params.max_results).await;
            Ok(serde_json::Value::String(report))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct StubBackend(Vec<SearchHit>);

    #[async_trait]
    impl SearchBackend for StubBackend {
        async fn text(&self, _query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self.0.iter().take(max_results).cloned().collect())
        }
    }

    #[derive(Debug)]
    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn text(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
            Err(SearchError::Provider("connection reset".to_string()))
        }
    }

    #[test]
    fn test_empty_results_message() {
        assert_eq!(format_search_results(&[]), "No search results found.");
    }

    #[test]
    fn test_format_numbered_entries() {
        let hits = vec![
            SearchHit::new("Paris", "Capital of France", "https://en.wikipedia.org/wiki/Paris"),
            SearchHit::new("France", "Country in Europe", "https://en.wikipedia.org/wiki/France"),
        ];
        assert_eq!(
            format_search_results(&hits),
            "1. Paris\n   Capital of France\n   URL: https://en.wikipedia.org/wiki/Paris\n\n\
             2. France\n   Country in Europe\n   URL: https://en.wikipedia.org/wiki/France"
        );
    }

    #[test]
    fn test_missing_fields_use_placeholders() {
        let hits = vec![SearchHit::default()];
        assert_eq!(
            format_search_results(&hits),
            "1. No title\n   No description\n   URL: No URL"
        );
    }

    #[test]
    fn test_hit_deserializes_provider_field_names() {
        let hit: SearchHit =
            serde_json::from_value(json!({"title": "T", "href": "https://x.test"})).unwrap();
        assert_eq!(hit.title.as_deref(), Some("T"));
        assert_eq!(hit.url.as_deref(), Some("https://x.test"));
        assert!(hit.snippet.is_none());
    }

    #[tokio::test]
    async fn test_search_never_errors() {
        let report = search(&FailingBackend, "anything", 5).await;
        assert_eq!(report, "Error performing web search: connection reset");

        let typed = search_report(&FailingBackend, "anything", 5).await;
        assert!(matches!(typed, Err(SearchError::Provider(_))));
    }

    #[tokio::test]
    async fn test_tool_defaults_max_results() {
        let hits: Vec<_> = (1..=8)
            .map(|n| SearchHit::new(&format!("t{n}"), "s", "u"))
            .collect();
        let tool = WebSearchTool::with_backend(StubBackend(hits));

        let output = tool.execute(json!({"query": "rust"})).await.unwrap();
        let report = output.as_str().unwrap();
        assert!(report.contains("5. t5"));
        assert!(!report.contains("6. t6"));

        let output = tool
            .execute(json!({"query": "rust", "max_results": 2}))
            .await
            .unwrap();
        assert_eq!(output.as_str().unwrap().matches("URL: ").count(), 2);
    }

    #[tokio::test]
    async fn test_tool_rejects_bad_parameters() {
        let tool = WebSearchTool::with_backend(StubBackend(Vec::new()));
        let err = tool.execute(json!({"max_results": 3})).await.unwrap_err();
        assert!(matches!(err, crate::AgentError::ToolExecution(_)));
    }

    #[test]
    fn test_schema_shape() {
        let tool = WebSearchTool::with_backend(StubBackend(Vec::new()));
        assert_eq!(
            tool.parameters_schema(),
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "max_results": {"type": "integer", "default": 5}
                },
                "required": ["query"]
            })
        );
        assert_eq!(tool.name(), "web_search");
    }

    const PAGE: &str = r#"
<div class="result results_links results_links_deep result--ad ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title"><a rel="nofollow" class="result__a" href="https://ads.example/">Sponsored</a></h2>
    <a class="result__snippet" href="https://ads.example/">Buy now</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title">
      <a rel="nofollow" class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fen.wikipedia.org%2Fwiki%2FParis&amp;rut=abc">Paris - <b>Wikipedia</b></a>
    </h2>
    <a class="result__snippet" href="//duckduckgo.com/l/?uddg=x">Paris is the <b>capital</b> of France &amp; its largest city.</a>
  </div>
</div>
<div class="result results_links results_links_deep web-result ">
  <div class="links_main links_deep result__body">
    <h2 class="result__title"><a rel="nofollow" class="result__a" href="https://www.britannica.com/place/Paris">Paris | Britannica</a></h2>
  </div>
</div>
"#;

    #[test]
    fn test_parse_results_page() {
        let hits = parse_results_page(PAGE, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title.as_deref(), Some("Paris - Wikipedia"));
        assert_eq!(
            hits[0].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Paris")
        );
        assert_eq!(
            hits[0].snippet.as_deref(),
            Some("Paris is the capital of France & its largest city.")
        );
        assert_eq!(
            hits[1].url.as_deref(),
            Some("https://www.britannica.com/place/Paris")
        );
        assert!(hits[1].snippet.is_none());
    }

    #[test]
    fn test_parse_decodes_entities_once() {
        let page = r#"
<div class="result results_links web-result ">
  <h2 class="result__title"><a class="result__a" href="https://example.com/?a=1&amp;b=2">Escaping &amp;lt;div&amp;gt; &#8211; HTML</a></h2>
  <a class="result__snippet" href="https://example.com/">Use &amp;amp; for &#x2F; &quot;quoted&quot; &#39;single&#39;</a>
</div>
"#;
        let hits = parse_results_page(page, 5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title.as_deref(), Some("Escaping &lt;div&gt; \u{2013} HTML"));
        assert_eq!(
            hits[0].snippet.as_deref(),
            Some("Use &amp; for / \"quoted\" 'single'")
        );
        assert_eq!(hits[0].url.as_deref(), Some("https://example.com/?a=1&b=2"));
    }

    #[test]
    fn test_html_decode_leaves_unknown_references() {
        assert_eq!(
            html_decode("&copy; &#xZZ; &#1114112; a&b"),
            "&copy; &#xZZ; &#1114112; a&b"
        );
        assert_eq!(html_decode("&#60;&#x3E;&nbsp;&apos;"), "<> '");
    }

    #[test]
    fn test_parse_respects_limit() {
        assert_eq!(parse_results_page(PAGE, 1).len(), 1);
        assert!(parse_results_page("<html></html>", 5).is_empty());
    }
}
