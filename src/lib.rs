// Animation resource cache engine — fetches animation files from remote URLs,
// bundled resources, bundled assets, or local paths into an on-disk cache,
// coalescing concurrent requests for the same logical resource into one fetch.

pub mod config;
pub mod engine;
pub mod error;
pub mod result;
pub mod source;
pub mod spec;

pub use config::EngineConfig;
pub use engine::factory::CompositionFactory;
pub use engine::registry::TaskRegistry;
pub use engine::store::DiskStore;
pub use engine::task::{FileTask, Task};
pub use error::{LoadError, SharedError};
pub use result::{load_composition, no_retry, CompositionResult};
pub use source::http_source::HttpFetcher;
pub use source::traits::{BundleProvider, FetchedResource, NoBundles, ResourceFetcher};
pub use spec::CompositionSpec;

use std::sync::Once;

use tracing::info;
use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Initialize tracing once for the whole process. Safe to call repeatedly.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();

        info!("anim cache engine tracing initialized");
    });
}
