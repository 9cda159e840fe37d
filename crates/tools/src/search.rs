//! Search tool — returns deterministic mock search results.
//!
//! In production this would call a real search API (Brave, Google, etc.).
//! The mock returns plausible results so the dialogue loop can be tested
//! end-to-end without network access.

use async_trait::async_trait;
use std::collections::HashMap;

use augent_core::error::ToolError;
use augent_core::tool::{Tool, ToolResult};

const SEARCH_TERMS: &[&str] = &[
    "search", "find", "look up", "what is", "who is", "where is", "when",
];

pub struct SearchTool;

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Searches for information. Returns a list of relevant results with titles, URLs, and snippets."
    }

    fn can_handle(&self, query: &str) -> bool {
        let lower = query.to_lowercase();
        SEARCH_TERMS.iter().any(|term| lower.contains(term))
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<ToolResult, ToolError> {
        let count = parameters
            .get("num_results")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(3)
            .min(5);

        let results = mock_results(query, count);
        let listing = results
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} — {}\n   {}", i + 1, r.title, r.url, r.snippet))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolResult::ok(format!("Search results for '{query}':\n{listing}"))
            .with_data("search_query", serde_json::json!(query))
            .with_data(
                "results",
                serde_json::to_value(&results).unwrap_or_default(),
            ))
    }
}

#[derive(Clone, serde::Serialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

fn mock_results(query: &str, count: usize) -> Vec<SearchResult> {
    let q = query.to_lowercase();

    // Context-aware mock results for common topics.
    let templates: Vec<(&str, Vec<SearchResult>)> = vec![
        ("rust", vec![
            SearchResult {
                title: "The Rust Programming Language".into(),
                url: "https://doc.rust-lang.org/book/".into(),
                snippet: "Rust is a systems programming language focused on safety, speed, and concurrency.".into(),
            },
            SearchResult {
                title: "Rust by Example".into(),
                url: "https://doc.rust-lang.org/rust-by-example/".into(),
                snippet: "A collection of runnable examples that illustrate Rust concepts and standard library usage.".into(),
            },
            SearchResult {
                title: "crates.io: Rust Package Registry".into(),
                url: "https://crates.io/".into(),
                snippet: "The Rust community's crate registry for sharing and discovering Rust libraries.".into(),
            },
        ]),
        ("weather", vec![
            SearchResult {
                title: "Weather Forecast - National Weather Service".into(),
                url: "https://weather.gov/".into(),
                snippet: "Current conditions and forecasts for locations across the United States.".into(),
            },
            SearchResult {
                title: "OpenWeatherMap".into(),
                url: "https://openweathermap.org/".into(),
                snippet: "Free weather API providing current weather data and forecasts for any location.".into(),
            },
        ]),
    ];

    for (keyword, results) in &templates {
        if q.contains(keyword) {
            return results.iter().take(count).cloned().collect();
        }
    }

    // Generic fallback.
    (0..count)
        .map(|i| SearchResult {
            title: format!("Result {} for: {query}", i + 1),
            url: format!(
                "https://example.com/search?q={}&p={}",
                query.replace(' ', "+"),
                i + 1
            ),
            snippet: format!(
                "This is a mock search result for the query '{query}'. In production, this would contain real content."
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_handle_search_phrasings() {
        let tool = SearchTool;
        assert!(tool.can_handle("search for rust tutorials"));
        assert!(tool.can_handle("what is a lifetime"));
        assert!(!tool.can_handle("2 + 2"));
    }

    #[tokio::test]
    async fn search_returns_topical_results() {
        let tool = SearchTool;
        let result = tool
            .execute("search for rust programming", &HashMap::new())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.result.contains("Rust"));
        assert!(result.data.contains_key("results"));
    }

    #[tokio::test]
    async fn num_results_parameter_limits_output() {
        let tool = SearchTool;
        let mut params = HashMap::new();
        params.insert("num_results".to_string(), "2".to_string());

        let result = tool.execute("find something obscure", &params).await.unwrap();
        let results = result.data["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn generic_queries_get_fallback_results() {
        let tool = SearchTool;
        let result = tool
            .execute("look up something obscure", &HashMap::new())
            .await
            .unwrap();
        let results = result.data["results"].as_array().unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0]["url"].as_str().unwrap().contains("example.com"));
    }
}
