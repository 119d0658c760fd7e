use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::sections::{
    CacheConfig, DispatcherConfig, EventsConfig, GatewayConfig, HealthConfig,
    ObservabilityConfig,
};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "NEXUS";

/// 默认配置文件搜索路径
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "config/nexus.toml",
    "nexus.toml",
    "/etc/nexus/config.toml",
];

/// 中枢配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub health: HealthConfig,
    pub cache: CacheConfig,
    pub dispatcher: DispatcherConfig,
    pub events: EventsConfig,
    pub gateway: GatewayConfig,
    pub observability: ObservabilityConfig,
}

impl HubConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: NEXUS_, nested keys separated by `__`)
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file path, if None use default paths
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = ConfigBuilder::try_from(&HubConfig::default())
            .context("构建默认配置失败")?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        // 1. 配置文件
        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else if let Some(path) = DEFAULT_CONFIG_PATHS
            .into_iter()
            .find(|path| Path::new(path).exists())
        {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        // 2. 环境变量覆盖，优先级最高
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: HubConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: HubConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn validate(&self) -> Result<()> {
        self.health.validate().context("健康检查配置验证失败")?;
        self.cache.validate().context("缓存配置验证失败")?;
        self.dispatcher
            .validate()
            .context("调度网关配置验证失败")?;
        self.events.validate().context("事件总线配置验证失败")?;
        self.gateway.validate().context("服务网关配置验证失败")?;
        self.observability
            .validate()
            .context("可观测性配置验证失败")?;

        Ok(())
    }
}
