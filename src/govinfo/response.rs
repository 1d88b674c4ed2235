//! Response helpers and wire types for the GovInfo API.

use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::ArchiveError;
use crate::models::{Congress, DocumentId};

/// Map a non-success response to [`ArchiveError::Api`] with its body.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ArchiveError> {
    if !resp.status().is_success() {
        return Err(ArchiveError::Api {
            status: resp.status().as_u16(),
            body: resp.text().await.unwrap_or_default(),
        });
    }
    Ok(resp)
}

/// One page of a collection listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionPage {
    #[serde(default)]
    pub count: Option<u64>,
    /// Absolute URL of the next page, absent on the last page.
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub packages: Vec<PackageSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PackageSummary {
    pub package_id: String,
}

impl CollectionPage {
    /// Identifiers on this page that belong to `congress`.
    ///
    /// The server-side filter is not trusted: identifiers that are malformed
    /// or encode another Congress are dropped.
    pub fn identifiers_for(&self, congress: Congress) -> impl Iterator<Item = DocumentId> + '_ {
        self.packages.iter().filter_map(move |p| {
            match DocumentId::parse(&p.package_id) {
                Ok(id) if id.belongs_to(congress) => Some(id),
                Ok(id) => {
                    debug!("Discarding {} listed under the {}", id, congress);
                    None
                }
                Err(e) => {
                    debug!("Discarding listing entry: {}", e);
                    None
                }
            }
        })
    }
}

/// Parse a next-page URL, re-attaching the API key if the server dropped it.
pub(crate) fn with_api_key(next: &str, api_key: &str) -> Result<Url, ArchiveError> {
    let mut url = Url::parse(next).map_err(|e| ArchiveError::InvalidUrl(format!("{next}: {e}")))?;
    if !url.query_pairs().any(|(k, _)| k == "api_key") {
        url.query_pairs_mut().append_pair("api_key", api_key);
    }
    Ok(url)
}

/// Resolve a `Location` header value against the URL that produced it.
pub(crate) fn resolve_location(base: &Url, location: &str) -> Result<Url, ArchiveError> {
    base.join(location)
        .map_err(|e| ArchiveError::InvalidUrl(format!("{location}: {e}")))
}
