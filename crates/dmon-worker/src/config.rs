//! Configuration file loading and validation.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;
use url::Url;

use dmon_api::WebConfig;
use dmon_notifier::{EnrichmentConfig, HealthPingerConfig, NotifierConfig};
use dmon_tracker::{CriteriaConfig, NotificationCriteria, TrackerConfig};

use crate::error::{WorkerError, WorkerResult};

/// Allowed liveness tick range, in seconds.
const MIN_LIVENESS_TICK_S: f64 = 5.0;
const MAX_LIVENESS_TICK_S: f64 = 24.0 * 60.0 * 60.0;

/// Detection source configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Seconds between liveness log lines and health pings
    pub liveness_tick_s: f64,
    /// GET this URL on every liveness tick
    pub healthcheck_ping_url: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            liveness_tick_s: 30.0,
            healthcheck_ping_url: None,
        }
    }
}

/// The complete configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub tracker: TrackerConfig,
    pub notification_criteria: CriteriaConfig,
    pub notifier: NotifierConfig,
    pub enrichment: EnrichmentConfig,
    pub web: WebConfig,
}

impl Config {
    /// Load, apply environment overrides and validate. Without a path every
    /// setting takes its default.
    pub fn load(path: Option<&Path>) -> WorkerResult<Self> {
        let mut config = match path {
            Some(path) => {
                let data = std::fs::read_to_string(path).map_err(|e| {
                    WorkerError::config_error(format!(
                        "error reading config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                Self::from_json(&data)?
            }
            None => Self::default(),
        };
        config.notifier.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration document without validating it.
    pub fn from_json(data: &str) -> WorkerResult<Self> {
        let mut config: Config = serde_json::from_str(data)
            .map_err(|e| WorkerError::config_error(format!("invalid config file: {}", e)))?;
        config.notifier.external_base_url = config.web.external_base_url.clone();
        Ok(config)
    }

    pub fn validate(&self) -> WorkerResult<()> {
        self.tracker.validate()?;

        if !(MIN_LIVENESS_TICK_S..=MAX_LIVENESS_TICK_S).contains(&self.model.liveness_tick_s) {
            return Err(WorkerError::config_error(format!(
                "model.liveness_tick_s must be between {} and {}",
                MIN_LIVENESS_TICK_S, MAX_LIVENESS_TICK_S
            )));
        }
        if let Some(ping_url) = &self.model.healthcheck_ping_url {
            parse_http_url("model.healthcheck_ping_url", ping_url)?;
        }

        let base_url = parse_http_url("web.external_base_url", &self.web.external_base_url)?;
        if base_url.scheme() == "http" {
            warn!(
                external_base_url = %self.web.external_base_url,
                "web.external_base_url is not https; ntfy action buttons may not work"
            );
        }
        self.web.socket_addr()?;

        self.notifier.validate()?;
        self.enrichment.validate()?;
        self.criteria()?;
        Ok(())
    }

    /// Compile the notification criteria.
    pub fn criteria(&self) -> WorkerResult<NotificationCriteria> {
        Ok(NotificationCriteria::new(self.notification_criteria.clone())?)
    }

    pub fn health_pinger(&self) -> HealthPingerConfig {
        HealthPingerConfig::for_liveness_tick(self.model.liveness_tick_s)
    }
}

fn parse_http_url(field: &str, value: &str) -> WorkerResult<Url> {
    let url = Url::parse(value)
        .map_err(|e| WorkerError::config_error(format!("{} is not a valid URL: {}", field, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(WorkerError::config_error(format!(
            "{} must start with http:// or https://",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use dmon_notifier::{ImageAttachMethod, NtfyPriority};

    fn invalid(json: &str) -> String {
        let config = Config::from_json(json).unwrap();
        config.validate().unwrap_err().to_string()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_json("{}").unwrap();
        config.validate().unwrap();

        assert_eq!(config.model.liveness_tick_s, 30.0);
        assert_eq!(config.tracker.track_connect_min_overlap, 0.2);
        assert_eq!(config.tracker.inactive_track_prune_s, 1.0);
        assert_eq!(config.notification_criteria.min_track_length_s, 1.0);
        assert_eq!(config.notifier.server, "https://ntfy.sh");
        assert_eq!(config.notifier.topic, "driveway-monitor");
        assert_eq!(config.notifier.debounce_threshold_s, 60.0);
        assert_eq!(config.web.port, 5550);
        assert!(!config.enrichment.enable);
        assert_eq!(config.enrichment.model, "llava");
        assert_eq!(config.health_pinger().req_timeout.as_secs(), 29);
    }

    #[test]
    fn test_full_document() {
        let config = Config::from_json(
            r#"{
                "model": {"liveness_tick_s": 10, "healthcheck_ping_url": "https://hc.example.com/ping/abc"},
                "tracker": {"inactive_track_prune_s": 2.5, "track_connect_min_overlap": 0.3},
                "notification_criteria": {
                    "classification_allowlist": ["car", "truck"],
                    "min_track_length_s_per_classification": {"truck": 3},
                    "track_cel": "track.last_box.b.y > 0.5"
                },
                "notifier": {
                    "topic": "my-driveway",
                    "priorities": {"car": "HIGH", "truck": "4"},
                    "image_method": "Click"
                },
                "web": {"port": 8080, "external_base_url": "https://dm.example.com/"}
            }"#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.tracker.track_connect_min_overlap, 0.3);
        assert_eq!(
            config.notification_criteria.classification_allowlist,
            Some(vec!["car".to_string(), "truck".to_string()])
        );
        assert_eq!(config.notifier.priority_for("car"), NtfyPriority::High);
        assert_eq!(config.notifier.priority_for("truck"), NtfyPriority::N4);
        assert_eq!(config.notifier.image_method, Some(ImageAttachMethod::Click));
        assert_eq!(config.notifier.base_url(), "https://dm.example.com");
        assert_eq!(config.health_pinger().req_timeout.as_secs(), 9);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(invalid(r#"{"tracker": {"track_connect_min_overlap": 1.5}}"#)
            .contains("track_connect_min_overlap"));
        assert!(invalid(r#"{"model": {"liveness_tick_s": 2}}"#).contains("liveness_tick_s"));
        assert!(invalid(r#"{"model": {"liveness_tick_s": 1e300}}"#).contains("liveness_tick_s"));
        assert!(invalid(r#"{"notifier": {"req_timeout_s": 1e300}}"#).contains("req_timeout_s"));
        assert!(invalid(
            r#"{"enrichment": {"enable": true, "endpoint": "http://ollama:11434/api/generate", "timeout_s": 1e300}}"#
        )
        .contains("enrichment.timeout_s"));
        assert!(invalid(r#"{"model": {"healthcheck_ping_url": "ftp://example.com"}}"#)
            .contains("healthcheck_ping_url"));
        assert!(invalid(r#"{"web": {"external_base_url": "dm.example.com"}}"#)
            .contains("external_base_url"));
        assert!(invalid(r#"{"notification_criteria": {"track_cel": "track.classification =="}}"#)
            .contains("track.classification =="));
        assert!(invalid(r#"{"enrichment": {"enable": true}}"#).contains("enrichment.endpoint"));
    }

    #[test]
    fn test_rejects_unknown_enum_values() {
        assert!(Config::from_json(r#"{"notifier": {"default_priority": "loud"}}"#).is_err());
        assert!(Config::from_json(r#"{"notifier": {"image_method": "embed"}}"#).is_err());
        assert!(Config::from_json(r#"{"enrichment": {"type": "gemini"}}"#).is_err());
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn test_enrichment_prompt_files_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = dir.path().join("car.txt");
        std::fs::write(&prompt, "Describe the car.").unwrap();

        let json = format!(
            r#"{{"enrichment": {{"enable": true, "endpoint": "http://ollama:11434/api/generate",
                "prompt_files": {{"car": "{}"}}}}}}"#,
            prompt.display()
        );
        Config::from_json(&json).unwrap().validate().unwrap();

        let missing = dir.path().join("truck.txt");
        let json = format!(
            r#"{{"enrichment": {{"enable": true, "endpoint": "http://ollama:11434/api/generate",
                "prompt_files": {{"truck": "{}"}}}}}}"#,
            missing.display()
        );
        assert!(invalid(&json).contains("truck.txt"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"notifier": {{"topic": "from-file"}}}}"#).unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.notifier.topic, "from-file");

        assert!(Config::load(Some(Path::new("/nonexistent/dmon.json"))).is_err());
        assert_eq!(Config::load(None).unwrap().web.port, 5550);
    }
}
