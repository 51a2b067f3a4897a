// Resource descriptors — where an animation comes from, independent of how
// it is cached.

use std::path::PathBuf;

/// Describes where to load an animation resource from.
///
/// Two requests resolving to the same effective cache key are treated as the
/// same cacheable unit regardless of descriptor identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompositionSpec {
    /// A bundled raw resource, addressed by numeric id.
    RawResource(u32),
    /// A bundled asset, addressed by name.
    Asset(String),
    /// A local file. Requires read permission on the path; opening it is
    /// blocking I/O, so this variant is skipped by the warm-cache pass.
    LocalFile(PathBuf),
    /// A remote URL, fetched over HTTP.
    Url(String),
}

impl CompositionSpec {
    /// Resolve the effective cache key: the explicit key wins, otherwise a
    /// deterministic default derived from the descriptor.
    pub fn effective_cache_key(&self, explicit: Option<&str>) -> String {
        if let Some(key) = explicit {
            return key.to_string();
        }
        match self {
            Self::RawResource(id) => format!("resource_{id}"),
            Self::Asset(name) => format!("asset_{name}"),
            Self::LocalFile(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}

impl std::fmt::Display for CompositionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RawResource(id) => write!(f, "raw resource {id}"),
            Self::Asset(name) => write!(f, "asset {name}"),
            Self::LocalFile(path) => write!(f, "file {}", path.display()),
            Self::Url(url) => write!(f, "url {url}"),
        }
    }
}
