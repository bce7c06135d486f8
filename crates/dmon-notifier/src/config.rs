//! Notifier, enrichment and health pinger configuration.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{NotifierError, NotifierResult};

/// ntfy message priority. Accepts names or numbers, case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum NtfyPriority {
    N1,
    Min,
    N2,
    Low,
    N3,
    #[default]
    Default,
    N4,
    High,
    N5,
    Max,
    Urgent,
}

impl NtfyPriority {
    /// Value sent in the `Priority` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            NtfyPriority::N1 => "1",
            NtfyPriority::Min => "min",
            NtfyPriority::N2 => "2",
            NtfyPriority::Low => "low",
            NtfyPriority::N3 => "3",
            NtfyPriority::Default => "default",
            NtfyPriority::N4 => "4",
            NtfyPriority::High => "high",
            NtfyPriority::N5 => "5",
            NtfyPriority::Max => "max",
            NtfyPriority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NtfyPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NtfyPriority {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" => Ok(NtfyPriority::N1),
            "min" => Ok(NtfyPriority::Min),
            "2" => Ok(NtfyPriority::N2),
            "low" => Ok(NtfyPriority::Low),
            "3" => Ok(NtfyPriority::N3),
            "default" => Ok(NtfyPriority::Default),
            "4" => Ok(NtfyPriority::N4),
            "high" => Ok(NtfyPriority::High),
            "5" => Ok(NtfyPriority::N5),
            "max" => Ok(NtfyPriority::Max),
            "urgent" => Ok(NtfyPriority::Urgent),
            other => Err(NotifierError::config(format!(
                "invalid ntfy priority '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for NtfyPriority {
    type Error = NotifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How the photo link is attached to object notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ImageAttachMethod {
    Attach,
    Click,
}

impl FromStr for ImageAttachMethod {
    type Err = NotifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "attach" => Ok(ImageAttachMethod::Attach),
            "click" => Ok(ImageAttachMethod::Click),
            other => Err(NotifierError::config(format!(
                "invalid image_method '{}' (expected attach or click)",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ImageAttachMethod {
    type Error = NotifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// ntfy delivery configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub server: String,
    pub topic: String,
    pub token: Option<String>,
    /// Minimum seconds between notifications of the same classification
    pub debounce_threshold_s: f64,
    pub default_priority: NtfyPriority,
    /// Per-classification priority overrides
    pub priorities: HashMap<String, NtfyPriority>,
    pub req_timeout_s: f64,
    /// Unset means both click and attach
    pub image_method: Option<ImageAttachMethod>,
    /// Copy every notification photo into this directory
    pub images_cc_dir: Option<PathBuf>,
    /// Public base URL of the control server; comes from the `web` section
    #[serde(skip)]
    pub external_base_url: String,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            server: "https://ntfy.sh".to_string(),
            topic: "driveway-monitor".to_string(),
            token: None,
            debounce_threshold_s: 60.0,
            default_priority: NtfyPriority::Default,
            priorities: HashMap::new(),
            req_timeout_s: 10.0,
            image_method: None,
            images_cc_dir: None,
            external_base_url: "http://localhost:5550".to_string(),
        }
    }
}

impl NotifierConfig {
    /// Apply deployment-level overrides from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("NTFY_TOKEN") {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }
    }

    pub fn priority_for(&self, classification: &str) -> NtfyPriority {
        self.priorities
            .get(classification)
            .copied()
            .unwrap_or(self.default_priority)
    }

    /// External base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.external_base_url.trim_end_matches('/')
    }

    /// Endpoint messages are POSTed to.
    pub fn topic_url(&self) -> String {
        format!("{}/{}", self.server.trim_end_matches('/'), self.topic)
    }

    pub fn req_timeout(&self) -> Duration {
        timeout_from_secs(self.req_timeout_s)
    }

    pub fn debounce_threshold(&self) -> chrono::Duration {
        chrono::Duration::try_milliseconds((self.debounce_threshold_s * 1000.0).round() as i64)
            .unwrap_or(chrono::Duration::MAX)
    }

    pub fn validate(&self) -> NotifierResult<()> {
        if self.topic.trim().is_empty() {
            return Err(NotifierError::config("notifier.topic must not be empty"));
        }
        if !is_http_url(&self.server) {
            return Err(NotifierError::config(
                "notifier.server must start with http:// or https://",
            ));
        }
        if self.debounce_threshold_s < 0.0 {
            return Err(NotifierError::config(
                "notifier.debounce_threshold_s must not be negative",
            ));
        }
        if !is_valid_timeout(self.req_timeout_s) {
            return Err(NotifierError::config(format!(
                "notifier.req_timeout_s must be positive and at most {}",
                MAX_TIMEOUT_S
            )));
        }
        if !is_http_url(&self.external_base_url) {
            return Err(NotifierError::config(
                "web.external_base_url must start with http:// or https://",
            ));
        }
        Ok(())
    }
}

/// Which model API the enrichment endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentType {
    #[default]
    Ollama,
    Openai,
}

/// Best-effort image description configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enable: bool,
    #[serde(rename = "type")]
    pub kind: EnrichmentType,
    pub endpoint: String,
    /// Bearer token for OpenAI-compatible endpoints
    pub api_key: Option<String>,
    pub model: String,
    /// Ollama keep-alive hint
    pub keep_alive: String,
    /// Prompt file per classification; classifications without one are not enriched
    pub prompt_files: HashMap<String, PathBuf>,
    pub timeout_s: f64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enable: false,
            kind: EnrichmentType::Ollama,
            endpoint: String::new(),
            api_key: None,
            model: "llava".to_string(),
            keep_alive: "240m".to_string(),
            prompt_files: HashMap::new(),
            timeout_s: 5.0,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        timeout_from_secs(self.timeout_s)
    }

    pub fn validate(&self) -> NotifierResult<()> {
        if !self.enable {
            return Ok(());
        }
        if !is_http_url(&self.endpoint) {
            return Err(NotifierError::config(
                "enrichment.endpoint must start with http:// or https://",
            ));
        }
        if !is_valid_timeout(self.timeout_s) {
            return Err(NotifierError::config(format!(
                "enrichment.timeout_s must be positive and at most {}",
                MAX_TIMEOUT_S
            )));
        }
        for path in self.prompt_files.values() {
            std::fs::read_to_string(path).map_err(|e| {
                NotifierError::config(format!(
                    "enrichment.prompt_files: error reading file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

/// Health pinger configuration.
#[derive(Debug, Clone)]
pub struct HealthPingerConfig {
    pub req_timeout: Duration,
}

impl HealthPingerConfig {
    /// Ping timeout is one second shorter than the liveness tick.
    pub fn for_liveness_tick(liveness_tick_s: f64) -> Self {
        let secs = (liveness_tick_s - 1.0).floor().max(1.0);
        Self {
            req_timeout: timeout_from_secs(secs),
        }
    }
}

impl Default for HealthPingerConfig {
    fn default() -> Self {
        Self::for_liveness_tick(30.0)
    }
}

/// Longest accepted request timeout, in seconds.
pub const MAX_TIMEOUT_S: f64 = 3600.0;

fn is_valid_timeout(secs: f64) -> bool {
    secs > 0.0 && secs <= MAX_TIMEOUT_S
}

/// Request timeout from fractional seconds, clamped to `MAX_TIMEOUT_S`.
fn timeout_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_TIMEOUT_S)).unwrap_or_default()
}

/// Case-insensitive check for an http(s) URL prefix.
pub fn is_http_url(s: &str) -> bool {
    let lower = s.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
