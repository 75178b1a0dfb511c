//! web_search tool - encyclopedic lookups for research agents
//!
//! Wikipedia (keyless) is the default backend: a search call picks the
//! best matching titles and a second call fetches their plain-text intros.
//! Tavily is used when configured and its API key is present.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{Tool, ToolError};
use crate::config::WebSearchConfig;

/// Registered name of the web search tool
pub const WEB_SEARCH_TOOL: &str = "web_search";

const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Search backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchProvider {
    Wikipedia { lang: String },
    Tavily { api_key: String },
}

/// Web search over Wikipedia or Tavily
pub struct WebSearchTool {
    http: Client,
    provider: SearchProvider,
    max_results: usize,
}

impl WebSearchTool {
    /// Build the tool from configuration
    ///
    /// Fails when the Tavily provider is selected without an API key, or the
    /// provider name is unknown.
    pub fn from_config(config: &WebSearchConfig, timeout: Duration) -> Result<Self, ToolError> {
        debug!(provider = %config.provider, "WebSearchTool::from_config: called");
        let provider = match config.provider.as_str() {
            "wikipedia" => SearchProvider::Wikipedia {
                lang: config.lang.clone(),
            },
            "tavily" => {
                let api_key = std::env::var(&config.api_key_env)
                    .map_err(|_| ToolError::MissingApiKey(config.api_key_env.clone()))?;
                SearchProvider::Tavily { api_key }
            }
            other => {
                return Err(ToolError::InvalidArgument(format!("unknown web search provider: {}", other)));
            }
        };

        let http = Client::builder()
            .timeout(timeout)
            .user_agent("AeroHub/0.1 (web_search tool)")
            .build()?;

        Ok(Self {
            http,
            provider,
            max_results: config.max_results.max(1),
        })
    }

    /// Active provider
    pub fn provider(&self) -> &SearchProvider {
        &self.provider
    }

    async fn search_wikipedia(&self, lang: &str, query: &str) -> Result<String, ToolError> {
        let url = format!("https://{}.wikipedia.org/w/api.php", lang);
        let limit = self.max_results.to_string();

        debug!(%url, "search_wikipedia: searching titles");
        let search = self
            .get_json(
                &url,
                &[
                    ("action", "query"),
                    ("list", "search"),
                    ("srsearch", query),
                    ("srlimit", limit.as_str()),
                    ("format", "json"),
                ],
            )
            .await?;

        let titles = parse_wikipedia_titles(&search);
        if titles.is_empty() {
            debug!("search_wikipedia: no titles");
            return Ok(String::new());
        }

        let joined = titles.join("|");
        debug!(count = titles.len(), "search_wikipedia: fetching extracts");
        let extracts = self
            .get_json(
                &url,
                &[
                    ("action", "query"),
                    ("prop", "extracts"),
                    ("exintro", "1"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", joined.as_str()),
                    ("format", "json"),
                ],
            )
            .await?;

        Ok(format_pages(&parse_wikipedia_extracts(&extracts, &titles)))
    }

    async fn search_tavily(&self, api_key: &str, query: &str) -> Result<String, ToolError> {
        debug!("search_tavily: called");
        let body = serde_json::json!({
            "api_key": api_key,
            "query": query,
            "max_results": self.max_results,
        });

        let response = self.http.post(TAVILY_URL).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ToolError::HttpStatus {
                status: response.status().as_u16(),
                url: TAVILY_URL.to_string(),
            });
        }

        let value: Value = response.json().await?;
        Ok(format_pages(&parse_tavily_results(&value)))
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, ToolError> {
        let response = self.http.get(url).query(params).send().await?;
        if !response.status().is_success() {
            return Err(ToolError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &'static str {
        WEB_SEARCH_TOOL
    }

    fn description(&self) -> &'static str {
        "Search the web for background on aircraft components, flight control surfaces and maintenance practice."
    }

    async fn invoke(&self, input: &str) -> Result<String, ToolError> {
        debug!(query = %input, "WebSearchTool::invoke: called");
        let query = input.trim();
        if query.is_empty() {
            return Ok(String::new());
        }

        match &self.provider {
            SearchProvider::Wikipedia { lang } => self.search_wikipedia(lang, query).await,
            SearchProvider::Tavily { api_key } => self.search_tavily(api_key, query).await,
        }
    }
}

/// Titles from a `list=search` response, in rank order
fn parse_wikipedia_titles(value: &Value) -> Vec<String> {
    value["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit["title"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// `(title, extract)` pairs from a `prop=extracts` response
///
/// Pages come back keyed by page id, so results are reordered to follow
/// the search ranking. Redirected titles keep their target's extract.
fn parse_wikipedia_extracts(value: &Value, titles: &[String]) -> Vec<(String, String)> {
    let Some(pages) = value["query"]["pages"].as_object() else {
        return Vec::new();
    };

    let mut resolved: Vec<(String, String)> = pages
        .values()
        .filter_map(|page| {
            let title = page["title"].as_str()?;
            let extract = page["extract"].as_str()?.trim();
            if extract.is_empty() {
                return None;
            }
            Some((title.to_string(), extract.to_string()))
        })
        .collect();

    let redirects: Vec<(String, String)> = value["query"]["redirects"]
        .as_array()
        .map(|list| {
            list.iter()
                .filter_map(|r| Some((r["from"].as_str()?.to_string(), r["to"].as_str()?.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let rank = |title: &str| {
        titles
            .iter()
            .position(|t| t == title || redirects.iter().any(|(from, to)| from == t && to == title))
            .unwrap_or(usize::MAX)
    };
    resolved.sort_by_key(|(title, _)| rank(title));
    resolved
}

/// `(title, content)` pairs from a Tavily response
fn parse_tavily_results(value: &Value) -> Vec<(String, String)> {
    value["results"]
        .as_array()
        .map(|results| {
            results
                .iter()
                .filter_map(|r| {
                    let title = r["title"].as_str()?;
                    let content = r["content"].as_str()?.trim();
                    Some((title.to_string(), content.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Render pages as `Page: <title>\nSummary: <text>` blocks
fn format_pages(pages: &[(String, String)]) -> String {
    pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;

    #[test]
    fn test_parse_wikipedia_titles() {
        let value = json!({
            "query": {"search": [{"title": "Aileron"}, {"title": "Flight control surfaces"}]}
        });
        assert_eq!(parse_wikipedia_titles(&value), vec!["Aileron", "Flight control surfaces"]);
        assert!(parse_wikipedia_titles(&json!({"error": "x"})).is_empty());
    }

    #[test]
    fn test_parse_wikipedia_extracts_follows_search_order() {
        let titles = vec!["Aileron".to_string(), "Hydraulic fluid".to_string()];
        let value = json!({
            "query": {"pages": {
                "100": {"title": "Hydraulic fluid", "extract": "A hydraulic fluid is a medium..."},
                "200": {"title": "Aileron", "extract": "An aileron is a hinged flight control surface..."},
                "300": {"title": "Empty", "extract": ""}
            }}
        });

        let pages = parse_wikipedia_extracts(&value, &titles);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, "Aileron");
        assert_eq!(pages[1].0, "Hydraulic fluid");
    }

    #[test]
    fn test_parse_tavily_results() {
        let value = json!({
            "results": [
                {"title": "Spoiler (aeronautics)", "content": " Spoilers reduce lift. ", "url": "https://x"},
                {"title": "missing content"}
            ]
        });
        let pages = parse_tavily_results(&value);
        assert_eq!(pages, vec![("Spoiler (aeronautics)".to_string(), "Spoilers reduce lift.".to_string())]);
    }

    #[test]
    fn test_format_pages() {
        let pages = vec![
            ("Aileron".to_string(), "Roll control.".to_string()),
            ("Elevator".to_string(), "Pitch control.".to_string()),
        ];
        assert_eq!(
            format_pages(&pages),
            "Page: Aileron\nSummary: Roll control.\n\nPage: Elevator\nSummary: Pitch control."
        );
        assert_eq!(format_pages(&[]), "");
    }

    #[test]
    fn test_from_config_wikipedia() {
        let config = WebSearchConfig::default();
        let tool = WebSearchTool::from_config(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(tool.provider(), &SearchProvider::Wikipedia { lang: "en".to_string() });
        assert_eq!(tool.name(), WEB_SEARCH_TOOL);
    }

    #[test]
    #[serial]
    fn test_from_config_tavily_requires_key() {
        let config = WebSearchConfig {
            provider: "tavily".to_string(),
            api_key_env: "AEROHUB_TEST_TAVILY_KEY".to_string(),
            ..Default::default()
        };

        unsafe { std::env::remove_var("AEROHUB_TEST_TAVILY_KEY") };
        assert!(matches!(
            WebSearchTool::from_config(&config, Duration::from_secs(5)),
            Err(ToolError::MissingApiKey(_))
        ));

        unsafe { std::env::set_var("AEROHUB_TEST_TAVILY_KEY", "tvly-test") };
        let tool = WebSearchTool::from_config(&config, Duration::from_secs(5)).unwrap();
        assert!(matches!(tool.provider(), SearchProvider::Tavily { .. }));
        unsafe { std::env::remove_var("AEROHUB_TEST_TAVILY_KEY") };
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = WebSearchConfig {
            provider: "altavista".to_string(),
            ..Default::default()
        };
        assert!(WebSearchTool::from_config(&config, Duration::from_secs(5)).is_err());
    }

    #[tokio::test]
    async fn test_blank_query_is_empty() {
        let tool = WebSearchTool::from_config(&WebSearchConfig::default(), Duration::from_secs(5)).unwrap();
        assert_eq!(tool.invoke("   ").await.unwrap(), "");
    }
}
