use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::ServiceDefinition;

/// 健康检查配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// 健康检查间隔（秒）
    pub check_interval_seconds: u64,
    /// 单次探测超时（秒）
    pub probe_timeout_seconds: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 30,
            probe_timeout_seconds: 10,
        }
    }
}

impl HealthConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.check_interval_seconds == 0 {
            return Err(anyhow::anyhow!("健康检查间隔必须大于0"));
        }

        if self.probe_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("健康探测超时时间必须大于0"));
        }

        Ok(())
    }
}

/// 结果缓存配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 过期条目清理间隔（秒）
    pub sweep_interval_seconds: u64,
    /// 默认TTL（秒）
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: 1800, // 30分钟
            default_ttl_seconds: 1800,    // 30分钟
        }
    }
}

impl CacheConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sweep_interval_seconds == 0 {
            return Err(anyhow::anyhow!("缓存清理间隔必须大于0"));
        }

        if self.default_ttl_seconds == 0 {
            return Err(anyhow::anyhow!("缓存默认TTL必须大于0"));
        }

        Ok(())
    }
}

/// 调度网关配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// 下游调用超时（毫秒），未设置时由调用方自行控制
    pub call_timeout_ms: Option<u64>,
}

impl DispatcherConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.call_timeout_ms == Some(0) {
            return Err(anyhow::anyhow!("调用超时时间必须大于0"));
        }

        Ok(())
    }
}

/// 事件总线配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// 是否安装内置业务事件处理器
    pub install_default_handlers: bool,
    /// 高置信度预测通知阈值
    pub high_confidence_threshold: f64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            install_default_handlers: true,
            high_confidence_threshold: 0.9,
        }
    }
}

impl EventsConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(0.0..=1.0).contains(&self.high_confidence_threshold) {
            return Err(anyhow::anyhow!(
                "高置信度阈值必须在0到1之间: {}",
                self.high_confidence_threshold
            ));
        }

        Ok(())
    }
}

/// 下游服务网关配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// 下游服务基础地址
    pub base_url: String,
    /// HTTP请求超时（秒）
    pub request_timeout_seconds: u64,
    /// 是否注册默认服务目录
    pub use_default_catalog: bool,
    /// 额外注册的服务
    pub services: Vec<ServiceDefinition>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            request_timeout_seconds: 30,
            use_default_catalog: true,
            services: Vec::new(),
        }
    }
}

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "服务基础地址必须以 http:// 或 https:// 开头: {}",
                self.base_url
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("HTTP请求超时时间必须大于0"));
        }

        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(anyhow::anyhow!("服务名称不能为空"));
            }
        }

        Ok(())
    }
}

/// 可观测性配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
    /// 是否启用Prometheus指标导出
    pub metrics_enabled: bool,
    pub metrics_listen: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_listen: "0.0.0.0:9091".to_string(),
        }
    }
}

impl ObservabilityConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志级别: {}，支持的级别: {:?}",
                self.log_level,
                valid_levels
            ));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志格式: {}，支持的格式: {:?}",
                self.log_format,
                valid_formats
            ));
        }

        if self.metrics_enabled {
            self.metrics_listen
                .parse::<std::net::SocketAddr>()
                .map_err(|e| anyhow::anyhow!("指标监听地址无效: {} ({e})", self.metrics_listen))?;
        }

        Ok(())
    }
}
