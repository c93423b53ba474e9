//! Generator implementations

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::types::*;

/// Trait for content generators
#[async_trait]
pub trait Generator: Send + Sync {
    /// Get the provider kind
    fn kind(&self) -> ProviderKind;

    /// Check if the provider is reachable
    async fn is_available(&self) -> bool;

    /// Generate content for a request. Returns the raw response text;
    /// callers parse it into their target record shape.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;
}

// ============================================================================
// Ollama Provider (Local, Default)
// ============================================================================

/// Configuration for the Ollama provider
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    /// Per-call deadline; a slow model must not hang the pipeline
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("AGORA_LLM_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            model: std::env::var("AGORA_LLM_MODEL")
                .unwrap_or_else(|_| "llama3.2:latest".to_string()),
            timeout_secs: 120,
        }
    }
}

/// Ollama local LLM provider
pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    pub fn from_env() -> Self {
        Self::new(OllamaConfig::default())
    }
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl Generator for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        self.client.get(&url).send().await.is_ok()
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let system = if request.json_mode {
            Some(
                request.system.clone().unwrap_or_default()
                    + "\n\nIMPORTANT: You must respond with valid JSON only. No other text.",
            )
        } else {
            request.system.clone()
        };

        let ollama_request = OllamaRequest {
            model: self.config.model.clone(),
            prompt: request.prompt,
            stream: false,
            system,
            format: request.json_mode.then_some("json"),
            options: OllamaOptions {
                num_predict: request.max_tokens,
            },
        };

        let url = format!("{}/api/generate", self.config.base_url);
        debug!(model = %self.config.model, "generator call");
        let response = self
            .client
            .post(&url)
            .json(&ollama_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenError::Timeout {
                        seconds: self.config.timeout_secs,
                    }
                } else {
                    GenError::NetworkError {
                        message: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(GenError::RequestFailed {
                message: format!("HTTP {}", response.status()),
            });
        }

        let ollama_response: OllamaResponse =
            response.json().await.map_err(|e| GenError::InvalidResponse {
                message: e.to_string(),
            })?;

        Ok(ollama_response.response.trim().to_string())
    }
}

// ============================================================================
// Canned Provider (Deterministic, no LLM)
// ============================================================================

/// Deterministic provider backed by a queue of fixture responses.
///
/// Each `generate` call pops the next queued response; an empty queue is a
/// request failure. Used by tests and offline runs where the content itself
/// does not matter, only the core's handling of it.
pub struct CannedProvider {
    responses: Mutex<VecDeque<String>>,
}

impl CannedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a fixture response
    pub async fn push(&self, response: impl Into<String>) {
        self.responses.lock().await.push_back(response.into());
    }

    /// Queue a fixture response from a serializable value
    pub async fn push_json(&self, value: &impl serde::Serialize) {
        let raw = serde_json::to_string(value).expect("fixture must serialize");
        self.push(raw).await;
    }
}

impl Default for CannedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for CannedProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Canned
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<String> {
        self.responses
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| GenError::RequestFailed {
                message: "canned provider has no queued response".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_provider_pops_in_order() {
        let provider = CannedProvider::new();
        provider.push("{\"a\": 1}").await;
        provider.push("{\"b\": 2}").await;

        let first = provider
            .generate(GenerationRequest::new("first"))
            .await
            .unwrap();
        let second = provider
            .generate(GenerationRequest::new("second"))
            .await
            .unwrap();
        assert_eq!(first, "{\"a\": 1}");
        assert_eq!(second, "{\"b\": 2}");
    }

    #[tokio::test]
    async fn test_canned_provider_exhaustion_is_an_error() {
        let provider = CannedProvider::new();
        let err = provider
            .generate(GenerationRequest::new("anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, GenError::RequestFailed { .. }));
    }

    #[tokio::test]
    async fn test_canned_provider_always_available() {
        assert!(CannedProvider::new().is_available().await);
    }
}
