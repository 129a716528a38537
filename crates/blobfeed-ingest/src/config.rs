//! Configuration management

use serde::{Deserialize, Serialize};
use std::env;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Default poll interval in seconds.
pub const DEFAULT_INTERVAL_SECS: u64 = 1;

/// Default number of ingestion workers.
pub const DEFAULT_WORKERS: usize = 20;

/// Default S3 region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
}

/// Storage account configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    pub container: String,
    pub access_key: String,
    pub secret_key: String,
    pub path_style: bool,
}

/// Ingestion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Seconds to sleep between poll cycles
    pub interval_secs: u64,
    /// Number of concurrent fetch/emit/delete workers
    pub workers: usize,
    /// Tags applied to every emitted event
    pub tags: Vec<String>,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// Required values (`BLOBFEED_CONTAINER`, access/secret key) fail fast
    /// here rather than at the first storage call.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            storage: StorageConfig {
                endpoint: env::var("BLOBFEED_ENDPOINT").ok(),
                region: env::var("BLOBFEED_REGION")
                    .unwrap_or_else(|_| DEFAULT_REGION.to_string()),
                container: env::var("BLOBFEED_CONTAINER").unwrap_or_default(),
                access_key: env::var("BLOBFEED_ACCESS_KEY")
                    .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                    .unwrap_or_default(),
                secret_key: env::var("BLOBFEED_SECRET_KEY")
                    .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                    .unwrap_or_default(),
                path_style: env::var("BLOBFEED_PATH_STYLE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(false),
            },
            ingest: IngestConfig {
                interval_secs: env::var("BLOBFEED_INTERVAL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_INTERVAL_SECS),
                workers: env::var("BLOBFEED_WORKERS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_WORKERS),
                tags: env::var("BLOBFEED_TAGS")
                    .map(|raw| {
                        raw.split(',')
                            .map(|s| s.trim().to_string())
                            .filter(|s| !s.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.storage.container.is_empty() {
            anyhow::bail!("Container name is required (BLOBFEED_CONTAINER)");
        }

        if self.storage.access_key.is_empty() {
            anyhow::bail!("Access key is required (BLOBFEED_ACCESS_KEY or AWS_ACCESS_KEY_ID)");
        }

        if self.storage.secret_key.is_empty() {
            anyhow::bail!(
                "Secret key is required (BLOBFEED_SECRET_KEY or AWS_SECRET_ACCESS_KEY)"
            );
        }

        if self.ingest.interval_secs == 0 {
            anyhow::bail!("Poll interval must be at least 1 second");
        }

        if self.ingest.workers == 0 {
            anyhow::bail!("Worker count must be greater than 0");
        }

        Ok(())
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            workers: DEFAULT_WORKERS,
            tags: Vec::new(),
        }
    }
}
