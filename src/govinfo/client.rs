//! HTTP client for the GovInfo collections and packages endpoints.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use tracing::{debug, info};
use url::Url;

use super::response::{check_response, resolve_location, with_api_key, CollectionPage};
use super::retry::{with_retry, RetryConfig};
use super::{ArchiveError, DocumentArchive};
use crate::models::{Congress, DocumentId, FileFormat};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.govinfo.gov";

/// Document class of House hearings within the CHRG collection.
pub const DOC_CLASS: &str = "hhrg";

/// Collection listing start date; earlier than any hearing in the archive.
const LISTING_START: &str = "1997-01-01T00:00:00Z";

/// Session used by the credential check.
const KEY_CHECK_CONGRESS: u32 = 117;

/// Explicit connection settings for [`GovInfoClient`].
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub api_key: String,
    pub base_url: String,
    pub page_size: u32,
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryConfig,
}

impl ArchiveConfig {
    /// Settings for the production API with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 1000,
            timeout: Duration::from_secs(30),
            user_agent: format!("cht/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
        }
    }
}

/// GovInfo API client.
#[derive(Clone)]
pub struct GovInfoClient {
    config: ArchiveConfig,
    client: Client,
    /// Does not follow redirects, so content links can be resolved by hand.
    resolver: Client,
}

impl GovInfoClient {
    /// Create a client. Fails without an API key.
    pub fn new(config: ArchiveConfig) -> Result<Self, ArchiveError> {
        if config.api_key.trim().is_empty() {
            return Err(ArchiveError::MissingCredential);
        }

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .build()?;
        let resolver = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            config,
            client,
            resolver,
        })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// First page of the House hearing listing for a session.
    fn listing_url(&self, congress: u32, page_size: u32) -> Result<Url, ArchiveError> {
        let raw = format!(
            "{}/collections/CHRG/{}",
            self.config.base_url.trim_end_matches('/'),
            LISTING_START
        );
        let mut url = Url::parse(&raw).map_err(|e| ArchiveError::InvalidUrl(format!("{raw}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("pageSize", &page_size.to_string())
            .append_pair("congress", &congress.to_string())
            .append_pair("docClass", DOC_CLASS)
            .append_pair("offsetMark", "*")
            .append_pair("api_key", &self.config.api_key);
        Ok(url)
    }

    /// Content link for one rendition of a package.
    fn package_url(&self, id: &DocumentId, format: FileFormat) -> Result<Url, ArchiveError> {
        let raw = format!(
            "{}/packages/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            id,
            format.link_type()
        );
        let mut url = Url::parse(&raw).map_err(|e| ArchiveError::InvalidUrl(format!("{raw}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api_key", &self.config.api_key);
        Ok(url)
    }

    async fn fetch_page(&self, url: &Url) -> Result<CollectionPage, ArchiveError> {
        with_retry(&self.config.retry, "listing request", || async {
            let resp = check_response(self.client.get(url.clone()).send().await?).await?;
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| ArchiveError::Decode(e.to_string()))
        })
        .await
    }

    /// One attempt at resolving a content link and retrieving its bytes.
    async fn fetch_once(&self, link: &Url) -> Result<Vec<u8>, ArchiveError> {
        let resp = self.resolver.get(link.clone()).send().await?;

        let resp = if resp.status().is_redirection() {
            let location = resp
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| {
                    ArchiveError::Decode(format!("{} redirect without Location", resp.status()))
                })?;
            let target = resolve_location(link, location)?;
            debug!("Resolved content link to {}", target);
            check_response(self.client.get(target).send().await?).await?
        } else {
            check_response(resp).await?
        };

        Ok(resp.bytes().await?.to_vec())
    }

    /// Whether the configured key is accepted by the archive.
    pub async fn check_key(&self) -> Result<bool, ArchiveError> {
        let url = self.listing_url(KEY_CHECK_CONGRESS, 10)?;
        let resp = self.client.get(url).send().await?;
        debug!("Key check returned {}", resp.status());
        Ok(resp.status().is_success())
    }
}

#[async_trait]
impl DocumentArchive for GovInfoClient {
    async fn list_congress(&self, congress: Congress) -> Result<BTreeSet<DocumentId>, ArchiveError> {
        let mut ids = BTreeSet::new();
        let mut seen_pages = HashSet::new();
        let mut url = self.listing_url(congress.number(), self.config.page_size)?;
        let mut pages = 0;

        loop {
            if !seen_pages.insert(url.to_string()) {
                return Err(ArchiveError::Decode(format!(
                    "listing for the {} repeated page {}",
                    congress, pages
                )));
            }

            let page = self.fetch_page(&url).await?;
            pages += 1;
            ids.extend(page.identifiers_for(congress));
            debug!(
                "Listing page {} for the {}: {} packages ({} of {:?} kept so far)",
                pages,
                congress,
                page.packages.len(),
                ids.len(),
                page.count
            );

            match page.next_page.as_deref() {
                Some(next) if !next.is_empty() => {
                    url = with_api_key(next, &self.config.api_key)?;
                }
                _ => break,
            }
        }

        info!(
            "Listed {} documents for the {} in {} pages",
            ids.len(),
            congress,
            pages
        );
        Ok(ids)
    }

    async fn fetch_content(
        &self,
        id: &DocumentId,
        format: FileFormat,
    ) -> Result<Vec<u8>, ArchiveError> {
        let link = self.package_url(id, format)?;
        let what = format!("{} {} download", id, format);
        with_retry(&self.config.retry, &what, || self.fetch_once(&link)).await
    }
}
