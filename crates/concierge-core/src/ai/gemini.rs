use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ChatProvider, ProviderFactory};
use crate::error::{ProviderError, Result};
use crate::state::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiSystemInstruction,
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    system_instruction: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str, system_instruction: String) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            system_instruction,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, history: &[ChatMessage], utterance: &str) -> GeminiRequest {
        let mut contents: Vec<GeminiContent> = history
            .iter()
            .map(|msg| GeminiContent {
                role: msg.role.provider_role().to_string(),
                parts: vec![GeminiPart {
                    text: msg.content.clone(),
                }],
            })
            .collect();

        contents.push(GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: utterance.to_string(),
            }],
        });

        GeminiRequest {
            system_instruction: GeminiSystemInstruction {
                parts: vec![GeminiPart {
                    text: self.system_instruction.clone(),
                }],
            },
            contents,
        }
    }
}

fn response_text(response: GeminiResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::InvalidResponse(
            "response contained no candidate text".to_string(),
        ));
    }
    Ok(text)
}

#[async_trait]
impl ChatProvider for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn send(&self, history: &[ChatMessage], utterance: &str) -> Result<String> {
        let request = self.build_request(history, utterance);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ProviderError::CredentialMissing(format!("Gemini API error {}: {}", status, body))
                }
                StatusCode::NOT_FOUND => ProviderError::ResourceNotFound(format!("models/{}", self.model)),
                _ => ProviderError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        response_text(gemini_response)
    }
}

/// Builds [`GeminiClient`]s. Fails when no API key is available.
#[derive(Debug, Clone)]
pub struct GeminiFactory {
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiFactory {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl ProviderFactory for GeminiFactory {
    fn build(&self, system_instruction: String) -> Result<Arc<dyn ChatProvider>> {
        let api_key = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ProviderError::CredentialMissing(format!("{} not set", ENV_API_KEY)))?;

        Ok(Arc::new(GeminiClient::new(
            api_key,
            &self.model,
            &self.base_url,
            system_instruction,
        )))
    }
}
