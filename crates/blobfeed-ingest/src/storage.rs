//! Container storage boundary
//!
//! The engine only ever talks to object storage through the [`BlobStore`]
//! trait: one paginated listing call, one fetch, one delete. The production
//! implementation is [`S3Container`] on top of the AWS SDK; tests substitute
//! an in-memory store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, primitives::DateTime as SmithyDateTime, Client};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::blob::BlobRef;
use crate::config::StorageConfig;

/// One page of a container listing.
#[derive(Debug, Default)]
pub struct BlobPage {
    pub entries: Vec<BlobRef>,
    /// Continuation token for the next page; `None` means the listing is
    /// complete.
    pub next_token: Option<String>,
}

/// Narrow contract the ingestion engine consumes from object storage.
///
/// All methods may fail transiently; the engine propagates failures
/// without retrying (the next poll cycle re-lists from scratch).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List up to `max_results` objects, resuming from `token` when given.
    async fn list_page(&self, token: Option<&str>, max_results: i32) -> Result<BlobPage>;

    /// Fetch the full content of the named object.
    async fn fetch(&self, name: &str) -> Result<Vec<u8>>;

    /// Delete the named object.
    async fn delete(&self, name: &str) -> Result<()>;
}

/// S3-backed container client.
#[derive(Clone)]
pub struct S3Container {
    client: Client,
    container: String,
}

impl S3Container {
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        debug!("Initializing container client for {}", config.container);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "blobfeed",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "Storage client initialized for container: {}",
            config.container
        );

        Ok(Self {
            client,
            container: config.container.clone(),
        })
    }

    pub fn container(&self) -> &str {
        &self.container
    }
}

#[async_trait]
impl BlobStore for S3Container {
    #[instrument(skip(self))]
    async fn list_page(&self, token: Option<&str>, max_results: i32) -> Result<BlobPage> {
        debug!(
            "Listing s3://{} (max: {}, token: {:?})",
            self.container, max_results, token
        );

        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.container)
            .max_keys(max_results);

        if let Some(token) = token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to list container objects")?;

        let entries = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let name = obj.key()?.to_string();
                let last_modified = match obj.last_modified().and_then(instant_from) {
                    Some(instant) => instant,
                    None => {
                        warn!(blob = %name, "No usable last-modified timestamp; sorting as epoch");
                        DateTime::<Utc>::default()
                    }
                };
                Some(BlobRef {
                    name,
                    last_modified,
                    size: obj.size().unwrap_or(0),
                })
            })
            .collect();

        Ok(BlobPage {
            entries,
            next_token: response.next_continuation_token().map(|t| t.to_string()),
        })
    }

    #[instrument(skip(self))]
    async fn fetch(&self, name: &str) -> Result<Vec<u8>> {
        debug!("Fetching s3://{}/{}", self.container, name);

        let response = self
            .client
            .get_object()
            .bucket(&self.container)
            .key(name)
            .send()
            .await
            .context(format!("Failed to fetch blob: {}", name))?;

        let data = response
            .body
            .collect()
            .await
            .context("Failed to read blob body")?
            .into_bytes()
            .to_vec();

        debug!(
            "Fetched {} bytes from s3://{}/{}",
            data.len(),
            self.container,
            name
        );

        Ok(data)
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> Result<()> {
        debug!("Deleting s3://{}/{}", self.container, name);

        self.client
            .delete_object()
            .bucket(&self.container)
            .key(name)
            .send()
            .await
            .context(format!("Failed to delete blob: {}", name))?;

        Ok(())
    }
}

/// Convert an SDK timestamp to a chrono instant without a string round trip.
///
/// Returns `None` when the value falls outside chrono's representable range.
fn instant_from(dt: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
