//! Remote Asset Lookup
//!
//! The seam to the CMS content API: given an opaque ID, return the stored
//! URL or nothing. Not-found is a miss, never a fault; only transport and
//! server errors surface as errors, and the resolver swallows those into a
//! miss anyway.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::Result;

/// An asset document as the content API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetRecord {
    /// Displayable URL stored for the asset
    pub url: String,
}

// == Lookup Trait ==
/// Remote lookup against the source of truth.
#[async_trait]
pub trait AssetLookup: Send + Sync {
    /// Fetches the record for `id`, or None when the ID does not exist.
    async fn fetch_asset_by_id(&self, id: &str) -> Result<Option<AssetRecord>>;
}

// == HTTP Implementation ==
/// Lookup over the CMS content API: `GET <base>/<id>`.
#[derive(Debug, Clone)]
pub struct HttpAssetLookup {
    client: reqwest::Client,
    base: String,
}

impl HttpAssetLookup {
    /// Creates a lookup rooted at `base`, e.g. `https://site/api/assets/image`.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl AssetLookup for HttpAssetLookup {
    async fn fetch_asset_by_id(&self, id: &str) -> Result<Option<AssetRecord>> {
        let url = format!("{}/{}", self.base, id);
        let response = self.client.get(&url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let record = response.error_for_status()?.json::<AssetRecord>().await?;
        Ok(Some(record))
    }
}
