pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::HubConfig;
pub use errors::*;
pub use models::*;
pub use traits::*;
