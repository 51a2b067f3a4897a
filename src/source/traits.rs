use async_trait::async_trait;
use bytes::Bytes;

use crate::error::LoadError;

/// Bytes fetched from a remote source, plus what the server said they are.
#[derive(Debug)]
pub struct FetchedResource {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Fetches a remote URL into memory. Errors propagate as task failures.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedResource, LoadError>;
}

/// Opens application-bundled data: raw resources by id, assets by name.
///
/// The engine never reads bundles itself; the embedding application injects
/// an implementation of this trait.
#[async_trait]
pub trait BundleProvider: Send + Sync {
    async fn load_resource(&self, id: u32) -> Result<Bytes, LoadError>;
    async fn load_asset(&self, name: &str) -> Result<Bytes, LoadError>;
}

/// Default provider for engines embedded without bundle support: every
/// lookup is a resolution failure.
pub struct NoBundles;

#[async_trait]
impl BundleProvider for NoBundles {
    async fn load_resource(&self, id: u32) -> Result<Bytes, LoadError> {
        Err(LoadError::resolution(format!(
            "no bundle provider configured (raw resource {id})"
        )))
    }

    async fn load_asset(&self, name: &str) -> Result<Bytes, LoadError> {
        Err(LoadError::resolution(format!(
            "no bundle provider configured (asset {name})"
        )))
    }
}
