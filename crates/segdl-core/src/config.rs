use crate::downloader::PipelineConfig;
use crate::retry::RetryPolicy;
use crate::segment::DEFAULT_MAX_SEGMENT_ID;
use crate::transport::CurlOptions;
use crate::url_model::DEFAULT_PLACEHOLDER;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry policy parameters (optional `[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Consecutive unexpected statuses per fetcher before the download is aborted.
    pub max_errors: u32,
    /// Seconds to wait after a connection failure or timeout.
    pub transport_delay_secs: f64,
    /// Seconds to wait after HTTP 429.
    pub throttle_delay_secs: f64,
    /// Seconds to wait after any other unexpected status.
    pub error_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_errors: 10,
            transport_delay_secs: 10.0,
            throttle_delay_secs: 30.0,
            error_delay_secs: 8.0,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_errors: self.max_errors,
            transport_delay: secs(self.transport_delay_secs),
            throttle_delay: secs(self.throttle_delay_secs),
            error_delay: secs(self.error_delay_secs),
        }
    }
}

/// Global configuration loaded from `~/.config/segdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegdlConfig {
    /// Number of concurrent segment fetchers.
    pub workers: usize,
    /// First segment id to fetch.
    pub start_id: u64,
    /// Token in segment URL templates replaced by the segment id.
    pub placeholder: String,
    /// Ids at or above this are never requested.
    pub max_segment_id: u64,
    /// A 200 body smaller than this is treated as end of stream.
    pub min_segment_bytes: usize,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Seconds between ordered flushes to the output file.
    pub flush_interval_secs: f64,
    /// Completed segments that may queue between fetchers and the writer.
    pub channel_capacity: usize,
    /// Optional User-Agent for page and segment requests.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for SegdlConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            start_id: 1,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            max_segment_id: DEFAULT_MAX_SEGMENT_ID,
            min_segment_bytes: 600,
            request_timeout_secs: 10,
            flush_interval_secs: 5.0,
            channel_capacity: 64,
            user_agent: None,
            retry: None,
        }
    }
}

impl SegdlConfig {
    /// Pipeline parameters derived from this config.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            start_id: self.start_id,
            workers: self.workers,
            max_segment_id: self.max_segment_id,
            min_segment_bytes: self.min_segment_bytes,
            flush_interval: secs(self.flush_interval_secs),
            channel_capacity: self.channel_capacity,
            retry: self.retry.clone().unwrap_or_default().policy(),
        }
    }

    pub fn curl_options(&self) -> CurlOptions {
        CurlOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Negative or NaN seconds clamp to zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SegdlConfig> {
    load_or_init_at(&config_path()?)
}

/// Like [`load_or_init`] for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<SegdlConfig> {
    if !path.exists() {
        let default_cfg = SegdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)
            .with_context(|| format!("failed to write default config to {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: SegdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_defaults() {
        let cfg = SegdlConfig::default();
        assert_eq!(cfg.pipeline(), PipelineConfig::default());
        assert_eq!(cfg.placeholder, "{seg}");
        assert_eq!(cfg.curl_options().timeout, Duration::from_secs(10));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = SegdlConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SegdlConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            workers = 4
            start_id = 0
            placeholder = "$ID"
            max_segment_id = 5000
            min_segment_bytes = 1024
            request_timeout_secs = 20
            flush_interval_secs = 0.5
            channel_capacity = 8
            user_agent = "segdl-test"

            [retry]
            max_errors = 3
            transport_delay_secs = 1.5
            throttle_delay_secs = 60
            error_delay_secs = 0.25
        "#;
        let cfg: SegdlConfig = toml::from_str(toml).unwrap();
        let pipeline = cfg.pipeline();
        assert_eq!(pipeline.workers, 4);
        assert_eq!(pipeline.start_id, 0);
        assert_eq!(pipeline.max_segment_id, 5000);
        assert_eq!(pipeline.flush_interval, Duration::from_millis(500));
        assert_eq!(pipeline.retry.max_errors, 3);
        assert_eq!(pipeline.retry.transport_delay, Duration::from_millis(1500));
        assert_eq!(pipeline.retry.throttle_delay, Duration::from_secs(60));
        assert_eq!(pipeline.retry.error_delay, Duration::from_millis(250));
        assert_eq!(cfg.curl_options().user_agent.as_deref(), Some("segdl-test"));
    }

    #[test]
    fn load_or_init_creates_then_reads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, SegdlConfig::default());

        std::fs::write(
            &path,
            std::fs::read_to_string(&path)
                .unwrap()
                .replace("workers = 10", "workers = 3"),
        )
        .unwrap();
        assert_eq!(load_or_init_at(&path).unwrap().workers, 3);
    }

    #[test]
    fn negative_delay_clamps_to_zero() {
        let retry = RetryConfig {
            error_delay_secs: -1.0,
            ..RetryConfig::default()
        };
        assert_eq!(retry.policy().error_delay, Duration::ZERO);
    }
}
