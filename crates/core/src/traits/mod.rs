pub mod service_endpoint;

pub use service_endpoint::*;
