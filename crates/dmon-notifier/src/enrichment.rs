//! Best-effort notification enrichment via an image-description model.
//!
//! Supports Ollama's `/api/generate` and OpenAI-compatible chat completions.
//! The model is asked to answer with a JSON object carrying `desc` (and
//! optionally `type` or `error`). Any failure leaves the notification as is.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use dmon_models::ObjectNotification;

use crate::config::{EnrichmentConfig, EnrichmentType};
use crate::error::{NotifierError, NotifierResult};
use crate::metrics;

/// Ollama generate request.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    stream: bool,
    images: Vec<String>,
    keep_alive: &'a str,
    format: &'a str,
    prompt: &'a str,
}

/// Ollama generate response.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

/// OpenAI chat completion response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Enrichment client.
pub struct Enricher {
    config: EnrichmentConfig,
    client: Client,
}

impl Enricher {
    pub fn new(config: EnrichmentConfig) -> NotifierResult<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }

    /// Describe the notification's photo. `None` whenever enrichment is
    /// disabled, not configured for the classification, or fails.
    pub async fn enrich(&self, n: &ObjectNotification) -> Option<String> {
        if !self.config.enable {
            return None;
        }
        let jpeg = n.jpeg_image.as_deref()?;
        let prompt_file = self.config.prompt_files.get(&n.classification)?;

        let prompt = match tokio::fs::read_to_string(prompt_file).await {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(
                    path = %prompt_file.display(),
                    error = %e,
                    "error reading enrichment prompt file"
                );
                return None;
            }
        };
        if prompt.trim().is_empty() {
            return None;
        }

        match self.describe(jpeg, &prompt).await {
            Ok(desc) => {
                debug!(id = %n.id, desc = %desc, "enrichment succeeded");
                Some(desc)
            }
            Err(e) => {
                info!(id = %n.id, error = %e, "enrichment failed; sending without description");
                metrics::record_enrichment_failure();
                None
            }
        }
    }

    async fn describe(&self, jpeg: &[u8], prompt: &str) -> NotifierResult<String> {
        let image_b64 = BASE64.encode(jpeg);
        let output = match self.config.kind {
            EnrichmentType::Ollama => self.call_ollama(image_b64, prompt).await?,
            EnrichmentType::Openai => self.call_openai(image_b64, prompt).await?,
        };
        parse_model_output(&output)
    }

    async fn call_ollama(&self, image_b64: String, prompt: &str) -> NotifierResult<String> {
        let request = OllamaRequest {
            model: &self.config.model,
            stream: false,
            images: vec![image_b64],
            keep_alive: &self.config.keep_alive,
            format: "json",
            prompt,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(NotifierError::enrichment(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| NotifierError::enrichment(format!("invalid response envelope: {}", e)))?;
        parsed
            .response
            .filter(|r| !r.is_empty())
            .ok_or_else(|| NotifierError::enrichment("response is missing"))
    }

    async fn call_openai(&self, image_b64: String, prompt: &str) -> NotifierResult<String> {
        let request = json!({
            "model": self.config.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": format!("data:image/jpeg;base64,{}", image_b64)}},
                ],
            }],
            "response_format": {"type": "json_object"},
        });

        let mut builder = self.client.post(&self.config.endpoint).json(&request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(NotifierError::enrichment(format!(
                "endpoint returned {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| NotifierError::enrichment(format!("invalid response envelope: {}", e)))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| NotifierError::enrichment("response is missing"))
    }
}

/// Strip a surrounding Markdown code fence (```json ... ```) if present.
pub fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let text = if let Some(rest) = text.strip_prefix("```json") {
        rest
    } else if let Some(rest) = text.strip_prefix("```") {
        rest
    } else {
        text
    };
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Extract the description from the model's JSON answer.
pub fn parse_model_output(text: &str) -> NotifierResult<String> {
    let parsed: Value = serde_json::from_str(strip_markdown_fences(text)).map_err(|e| {
        NotifierError::enrichment(format!("model did not produce valid JSON: {}", e))
    })?;
    let obj = parsed
        .as_object()
        .ok_or_else(|| NotifierError::enrichment("model did not produce a JSON object"))?;

    if !obj.contains_key("type") && !obj.contains_key("error") {
        return Err(NotifierError::enrichment(
            "model did not produce expected JSON keys",
        ));
    }

    let desc = obj.get("desc").and_then(Value::as_str).unwrap_or("unknown");
    if desc.is_empty() || desc == "unknown" {
        let reason = obj
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .unwrap_or("(no error returned)");
        return Err(NotifierError::enrichment(format!(
            "model could not produce a useful description: {}",
            reason
        )));
    }
    Ok(desc.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notification(classification: &str, jpeg: Option<Vec<u8>>) -> ObjectNotification {
        ObjectNotification::new(Utc::now(), classification, "arrived in driveway", "abc", jpeg)
    }

    fn prompt_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn enricher(kind: EnrichmentType, endpoint: String, prompt: &tempfile::NamedTempFile) -> Enricher {
        let mut config = EnrichmentConfig {
            enable: true,
            kind,
            endpoint,
            ..Default::default()
        };
        config
            .prompt_files
            .insert("car".to_string(), prompt.path().to_path_buf());
        Enricher::new(config).unwrap()
    }

    #[test]
    fn test_strip_markdown_fences() {
        assert_eq!(strip_markdown_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_markdown_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_markdown_fences("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_model_output() {
        assert_eq!(
            parse_model_output(r#"{"type": "car", "desc": "red sedan"}"#).unwrap(),
            "red sedan"
        );
        assert_eq!(
            parse_model_output("```json\n{\"type\": \"truck\", \"desc\": \"UPS truck\"}\n```").unwrap(),
            "UPS truck"
        );
        assert!(parse_model_output(r#"{"desc": "red sedan"}"#).is_err());
        assert!(parse_model_output(r#"{"type": "car", "desc": "unknown"}"#).is_err());
        assert!(parse_model_output(r#"{"error": "too dark"}"#).is_err());
        assert!(parse_model_output("a red sedan").is_err());
    }

    #[tokio::test]
    async fn test_ollama_enrichment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({
                "model": "llava",
                "stream": false,
                "format": "json",
                "keep_alive": "240m",
                "prompt": "describe the vehicle",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "{\"type\": \"car\", \"desc\": \"white pickup truck\"}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = prompt_file("describe the vehicle");
        let enricher = enricher(EnrichmentType::Ollama, format!("{}/api/generate", server.uri()), &prompt);

        let desc = enricher.enrich(&notification("car", Some(vec![0xFF, 0xD8]))).await;
        assert_eq!(desc.as_deref(), Some("white pickup truck"));
    }

    #[tokio::test]
    async fn test_openai_enrichment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "```json\n{\"type\": \"car\", \"desc\": \"blue hatchback\"}\n```"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let prompt = prompt_file("describe the vehicle");
        let mut enricher = enricher(
            EnrichmentType::Openai,
            format!("{}/v1/chat/completions", server.uri()),
            &prompt,
        );
        enricher.config.api_key = Some("sk-test".to_string());

        let desc = enricher.enrich(&notification("car", Some(vec![0xFF, 0xD8]))).await;
        assert_eq!(desc.as_deref(), Some("blue hatchback"));
    }

    #[tokio::test]
    async fn test_failures_degrade_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let prompt = prompt_file("describe the vehicle");
        let enricher = enricher(EnrichmentType::Ollama, server.uri(), &prompt);
        assert!(enricher.enrich(&notification("car", Some(vec![1]))).await.is_none());
    }

    #[tokio::test]
    async fn test_skipped_without_image_or_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let prompt = prompt_file("describe the vehicle");
        let enricher = enricher(EnrichmentType::Ollama, server.uri(), &prompt);
        assert!(enricher.enrich(&notification("car", None)).await.is_none());
        assert!(enricher.enrich(&notification("person", Some(vec![1]))).await.is_none());
    }

    #[tokio::test]
    async fn test_timeout_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "{\"type\": \"car\", \"desc\": \"late\"}"}))
                    .set_delay(std::time::Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let prompt = prompt_file("describe the vehicle");
        let mut enricher = enricher(EnrichmentType::Ollama, server.uri(), &prompt);
        enricher.client = Client::builder()
            .timeout(std::time::Duration::from_millis(50))
            .build()
            .unwrap();
        assert!(enricher.enrich(&notification("car", Some(vec![1]))).await.is_none());
    }
}
