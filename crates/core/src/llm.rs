use crate::traits::LanguageModel;
use crate::InferenceError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:latest";

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Non-streaming completions from a local Ollama runtime.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
        }
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_generate_response(&self.model, status, &body)
    }
}

pub fn parse_generate_response(
    model: &str,
    status: StatusCode,
    body: &str,
) -> Result<String, InferenceError> {
    if !status.is_success() {
        return Err(InferenceError::BackendResponse {
            backend: format!("ollama ({model})"),
            details: format!("{status}: {body}"),
        });
    }

    let payload: GenerateResponse = serde_json::from_str(body)?;
    Ok(payload.response)
}

#[cfg(test)]
mod tests {
    use super::{
        parse_generate_response, GenerateRequest, GenerateResponse, OllamaClient, OllamaConfig,
        DEFAULT_LLM_MODEL,
    };
    use crate::traits::LanguageModel;
    use crate::InferenceError;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn default_model_is_llama() {
        let client = OllamaClient::new(OllamaConfig::default());
        assert_eq!(client.model(), DEFAULT_LLM_MODEL);
    }

    #[test]
    fn request_disables_streaming() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama3.2:latest",
            prompt: "hi",
            stream: false,
        })
        .unwrap();
        assert_eq!(
            body,
            json!({ "model": "llama3.2:latest", "prompt": "hi", "stream": false })
        );
    }

    #[test]
    fn response_text_is_read_from_response_field() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "model": "llama3.2:latest",
            "response": "Blue.",
            "done": true
        }))
        .unwrap();
        assert_eq!(parsed.response, "Blue.");
    }

    #[test]
    fn completion_is_read_from_successful_body() {
        let answer = parse_generate_response(
            DEFAULT_LLM_MODEL,
            StatusCode::OK,
            r#"{"model": "llama3.2:latest", "response": "The sky is blue.", "done": true}"#,
        )
        .expect("completion should parse");
        assert_eq!(answer, "The sky is blue.");
    }

    #[test]
    fn missing_model_is_an_inference_error() {
        let result = parse_generate_response(
            "llama3.2:latest",
            StatusCode::NOT_FOUND,
            r#"{"error": "model 'llama3.2:latest' not found"}"#,
        );
        assert!(matches!(
            result,
            Err(InferenceError::BackendResponse { backend, details })
                if backend == "ollama (llama3.2:latest)" && details.starts_with("404 Not Found")
        ));
    }

    #[test]
    fn malformed_completion_is_rejected() {
        let result = parse_generate_response(DEFAULT_LLM_MODEL, StatusCode::OK, "{\"done\": true}");
        assert!(matches!(result, Err(InferenceError::Malformed(_))));
    }
}
