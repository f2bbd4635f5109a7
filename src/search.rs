//! Web search used to ground answers to "search for ..." requests.
//!
//! Uses the Brave Search API when a key is configured, otherwise the
//! DuckDuckGo HTML endpoint (no key, best-effort).

use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::{BotError, Result};

/// Number of snippets folded into the prompt
pub const MAX_RESULTS: usize = 3;

const SEARCH_PREFIXES: [&str; 2] = ["ابحث عن", "search for"];

/// Return the query when `text` asks for a web search.
///
/// Matches the Arabic and English trigger phrases case-insensitively and
/// returns whatever follows them, or `None` when nothing does.
pub fn parse_search_request(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    for prefix in SEARCH_PREFIXES {
        let Some(head) = trimmed.get(..prefix.len()) else {
            continue;
        };
        let rest = &trimmed[prefix.len()..];
        if head.to_lowercase() == prefix && (rest.is_empty() || rest.starts_with(char::is_whitespace)) {
            let query = rest.trim();
            return (!query.is_empty()).then_some(query);
        }
    }
    None
}

/// User turn that carries the search results to the model
pub fn augment_with_results(query: &str, results: &str) -> String {
    format!(
        "User asked for search: {query}\nWeb Search Results:\n{results}\nPlease answer the user based on these results."
    )
}

pub struct WebSearch {
    client: Client,
    brave_api_key: Option<String>,
}

impl WebSearch {
    pub fn new(brave_api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            brave_api_key,
        }
    }

    /// Snippets of the top results, one per line
    pub async fn search(&self, query: &str) -> Result<String> {
        if let Some(key) = &self.brave_api_key {
            match self.brave_search(query, key).await {
                Ok(snippets) if !snippets.is_empty() => return Ok(snippets.join("\n")),
                Ok(_) => warn!(query = %query, "Brave Search returned nothing, trying DuckDuckGo"),
                Err(e) => warn!(error = %e, "Brave Search failed, trying DuckDuckGo"),
            }
        }

        let snippets = self.duckduckgo_search(query).await?;
        info!(query = %query, results = snippets.len(), "Web search completed");
        Ok(snippets.join("\n"))
    }

    async fn brave_search(&self, query: &str, api_key: &str) -> Result<Vec<String>> {
        let url = format!(
            "https://api.search.brave.com/res/v1/web/search?q={}&count={}",
            urlencoding::encode(query),
            MAX_RESULTS
        );
        let response = self
            .client
            .get(&url)
            .header("X-Subscription-Token", api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(BotError::Api { status, body });
        }

        let data: Value = response.json().await?;
        Ok(data["web"]["results"]
            .as_array()
            .map(|results| {
                results
                    .iter()
                    .take(MAX_RESULTS)
                    .filter_map(|r| r["description"].as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn duckduckgo_search(&self, query: &str) -> Result<Vec<String>> {
        let url = format!(
            "https://html.duckduckgo.com/html/?q={}",
            urlencoding::encode(query)
        );
        let response = self
            .client
            .get(&url)
            .header(
                "User-Agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BotError::Api {
                status: response.status().as_u16(),
                body: "DuckDuckGo search failed".to_string(),
            });
        }

        let html = response.text().await?;
        Ok(parse_duckduckgo_html(&html, MAX_RESULTS))
    }
}

/// Snippet text of each result on a DuckDuckGo HTML results page
pub fn parse_duckduckgo_html(html: &str, max_results: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let (Ok(result_sel), Ok(snippet_sel)) =
        (Selector::parse(".result"), Selector::parse(".result__snippet"))
    else {
        return Vec::new();
    };

    document
        .select(&result_sel)
        .filter_map(|element| {
            element
                .select(&snippet_sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .filter(|snippet| !snippet.is_empty())
        .take(max_results)
        .collect()
}
