// Resource resolution seams — pluggable backends for HTTP and bundled data.

pub mod http_source;
pub mod traits;
