use crate::traits::WebSearch;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://serpapi.com";
pub const MISSING_SNIPPET: &str = "No snippet available.";

#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl Default for SerpApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_key: None,
        }
    }
}

impl SerpApiConfig {
    /// Blank keys count as absent.
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.and_then(|value| {
            let key = value.trim().to_string();
            if key.is_empty() {
                None
            } else {
                Some(key)
            }
        });
        self
    }
}

pub struct SerpApiClient {
    config: SerpApiConfig,
    client: Client,
}

impl SerpApiClient {
    pub fn new(config: SerpApiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    pub fn request_url(&self, query: &str) -> Result<Url, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingApiKey)?;
        let mut url = Url::parse(&self.config.endpoint)?;
        url.path_segments_mut()
            .map_err(|_| SearchError::InvalidEndpoint(self.config.endpoint.clone()))?
            .pop_if_empty()
            .push("search.json");
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("api_key", api_key);
        Ok(url)
    }
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str) -> Result<Vec<String>, SearchError> {
        let url = self.request_url(query)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let snippets = parse_search_response(status, &body)?;
        debug!(results = snippets.len(), "web search finished");
        Ok(snippets)
    }
}

pub fn parse_search_response(status: StatusCode, body: &str) -> Result<Vec<String>, SearchError> {
    if !status.is_success() {
        return Err(SearchError::BackendResponse {
            backend: "serpapi".to_string(),
            details: status.to_string(),
        });
    }

    let parsed: Value = serde_json::from_str(body)?;
    Ok(snippets_from_response(&parsed))
}

/// One snippet per `organic_results` entry; entries without one get a placeholder.
pub fn snippets_from_response(payload: &Value) -> Vec<String> {
    payload
        .pointer("/organic_results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .map(|result| {
                    result
                        .pointer("/snippet")
                        .and_then(Value::as_str)
                        .unwrap_or(MISSING_SNIPPET)
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        parse_search_response, snippets_from_response, SerpApiClient, SerpApiConfig,
        MISSING_SNIPPET,
    };
    use crate::SearchError;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn snippets_are_read_from_organic_results() {
        let payload = json!({
            "organic_results": [
                { "snippet": "Paris is the capital of France." },
                { "title": "no snippet here" }
            ]
        });

        let snippets = snippets_from_response(&payload);
        assert_eq!(
            snippets,
            vec![
                "Paris is the capital of France.".to_string(),
                MISSING_SNIPPET.to_string()
            ]
        );
    }

    #[test]
    fn missing_results_mean_no_snippets() {
        assert!(snippets_from_response(&json!({})).is_empty());
        assert!(snippets_from_response(&json!({ "organic_results": [] })).is_empty());
    }

    #[test]
    fn request_url_encodes_query_and_key() {
        let client = SerpApiClient::new(
            SerpApiConfig::default().with_api_key(Some("secret".to_string())),
        );
        let url = client.request_url("capital of France & more").expect("url should build");

        assert_eq!(url.host_str(), Some("serpapi.com"));
        assert_eq!(url.path(), "/search.json");
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "capital of France & more".to_string()),
                ("api_key".to_string(), "secret".to_string()),
            ]
        );
    }

    #[test]
    fn request_url_keeps_endpoint_path() {
        for endpoint in ["https://proxy.example/serp", "https://proxy.example/serp/"] {
            let client = SerpApiClient::new(
                SerpApiConfig {
                    endpoint: endpoint.to_string(),
                    api_key: None,
                }
                .with_api_key(Some("secret".to_string())),
            );
            let url = client.request_url("q").expect("url should build");
            assert_eq!(url.path(), "/serp/search.json");
        }
    }

    #[test]
    fn successful_response_yields_snippets() {
        let body = r#"{"organic_results": [{"snippet": "Paris is the capital of France."}]}"#;
        let snippets = parse_search_response(StatusCode::OK, body).expect("body should parse");
        assert_eq!(snippets, vec!["Paris is the capital of France.".to_string()]);
    }

    #[test]
    fn error_status_is_a_backend_failure() {
        let result = parse_search_response(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert!(matches!(
            result,
            Err(SearchError::BackendResponse { backend, details })
                if backend == "serpapi" && details == "500 Internal Server Error"
        ));
    }

    #[test]
    fn malformed_body_is_rejected() {
        let result = parse_search_response(StatusCode::OK, "{not json");
        assert!(matches!(result, Err(SearchError::Malformed(_))));
    }

    #[test]
    fn blank_api_key_is_missing() {
        let client =
            SerpApiClient::new(SerpApiConfig::default().with_api_key(Some("   ".to_string())));
        assert!(matches!(
            client.request_url("anything"),
            Err(SearchError::MissingApiKey)
        ));
    }
}
