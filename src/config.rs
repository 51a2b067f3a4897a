use serde::Deserialize;

/// File extension for published cache entries. VAP animations are mp4 files.
pub const CACHE_FILE_EXTENSION: &str = ".mp4";

/// Suffix inserted before the extension while a download is being written.
/// A file carrying this suffix is never visible through cache lookup.
pub const TEMP_FILE_SUFFIX: &str = ".temp";

/// Maximum length of the sanitized cache-key portion of a filename.
pub const MAX_CACHE_FILENAME_LEN: usize = 160;

/// Default timeout for a single HTTP fetch, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration for the cache engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Directory used for published cache files.
    pub cache_dir: String,
    /// Timeout for a single HTTP fetch in seconds.
    pub http_timeout_secs: u64,
    /// User-Agent header sent with HTTP fetches, if any.
    pub user_agent: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: String::new(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

impl EngineConfig {
    /// Config with the given cache directory and defaults for the rest.
    pub fn with_cache_dir(cache_dir: impl Into<String>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }
}
