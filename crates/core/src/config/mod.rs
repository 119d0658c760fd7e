//! 中枢配置
//!
//! 配置按以下顺序叠加，后者覆盖前者：
//!
//! 1. 内置默认值
//! 2. TOML 配置文件（显式指定，或依次搜索 `config/nexus.toml`、`nexus.toml`、`/etc/nexus/config.toml`）
//! 3. `NEXUS_` 前缀的环境变量，嵌套字段以 `__` 分隔，如 `NEXUS_HEALTH__CHECK_INTERVAL_SECONDS=5`
//!
//! ```rust,no_run
//! use nexus_core::config::HubConfig;
//!
//! let config = HubConfig::load(None)?;
//! println!("健康检查间隔: {:?}", config.health.check_interval());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod hub_config;
pub mod sections;

pub use hub_config::*;
pub use sections::*;

#[cfg(test)]
mod tests;
