mod models;
pub use models::*;

use crate::error::GeneratorError;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};

/// Identifies the generator towards the statistics service.
pub const USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION_MAJOR"),
    " (+",
    env!("CARGO_PKG_REPOSITORY"),
    ")"
);

/// Client for the download counter of the plugin host.
#[derive(Debug, Clone)]
pub struct DownloadStatisticsApi {
    client: Client,
    downloads_url: Url,
}

impl DownloadStatisticsApi {
    /// Prepare the API client for `https://<hosting_domain>/`.
    pub fn new(hosting_domain: &str) -> Result<Self, GeneratorError> {
        let base = Url::parse(&format!("https://{hosting_domain}/")).map_err(|source| {
            GeneratorError::InvalidDomain {
                domain: hosting_domain.to_owned(),
                source,
            }
        })?;

        Self::with_base_url(base)
    }

    /// Prepare the API client against an arbitrary host root.
    pub fn with_base_url(base: Url) -> Result<Self, GeneratorError> {
        let downloads_url =
            base.join("plugins/downloads")
                .map_err(|source| GeneratorError::InvalidDomain {
                    domain: base.to_string(),
                    source,
                })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(10))
            .hickory_dns(true)
            .build()?;

        Ok(Self {
            client,
            downloads_url,
        })
    }

    pub fn downloads_url(&self) -> &Url {
        &self.downloads_url
    }

    /// Fetch the download counts. Transport failures, error statuses and bodies
    /// that are not a JSON object of integer counts fail the fetch.
    #[tracing::instrument(skip(self), fields(url = self.downloads_url.as_str()))]
    pub async fn fetch_download_counts(&self) -> Result<DownloadCounts, GeneratorError> {
        let response = self
            .client
            .get(self.downloads_url.clone())
            .send()
            .await?
            .error_for_status()?;

        let data = response.bytes().await?;

        let counts: DownloadCounts = serde_json::from_slice(&data)?;
        tracing::debug!("Received download counts for {} plugins", counts.0.len());

        Ok(counts)
    }
}
