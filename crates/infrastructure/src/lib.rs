pub mod cache;
pub mod http_endpoint;
pub mod observability;
pub mod timeout_handler;

pub use cache::{cache_key, spawn_sweeper, CacheEntry, CacheStats, ResultCache};
pub use http_endpoint::{HttpEndpointFactory, HttpServiceEndpoint};
pub use timeout_handler::{TimeoutConfig, TimeoutHandler, TimeoutUtils};
