use thiserror::Error;

use crate::models::ServiceStatus;

/// 中枢错误类型定义
#[derive(Debug, Error)]
pub enum HubError {
    #[error("服务未找到: {name}")]
    ServiceNotFound { name: String },

    #[error("服务不可用: {name} (当前状态: {status})")]
    ServiceUnavailable { name: String, status: ServiceStatus },

    #[error("服务重复注册: {name}")]
    DuplicateService { name: String },

    #[error("健康探测超时: {service} (超时时间: {timeout_ms}ms)")]
    ProbeTimeout { service: String, timeout_ms: u64 },

    #[error("健康探测失败: {service} - {message}")]
    ProbeFailure { service: String, message: String },

    #[error("事件订阅者执行失败: {event} - {message}")]
    SubscriberFailure { event: String, message: String },

    #[error("下游服务调用失败: {service} - {message}")]
    DownstreamCall { service: String, message: String },

    #[error("操作超时: {0}")]
    Timeout(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type HubResult<T> = std::result::Result<T, HubError>;

impl HubError {
    pub fn service_not_found<S: Into<String>>(name: S) -> Self {
        Self::ServiceNotFound { name: name.into() }
    }

    pub fn service_unavailable<S: Into<String>>(name: S, status: ServiceStatus) -> Self {
        Self::ServiceUnavailable {
            name: name.into(),
            status,
        }
    }

    pub fn duplicate_service<S: Into<String>>(name: S) -> Self {
        Self::DuplicateService { name: name.into() }
    }

    pub fn probe_failure<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::ProbeFailure {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn subscriber_failure<S: Into<String>, M: Into<String>>(event: S, message: M) -> Self {
        Self::SubscriberFailure {
            event: event.into(),
            message: message.into(),
        }
    }

    pub fn downstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::DownstreamCall {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn timeout_error<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 调用方误用（未知服务、服务不健康）才会以错误形式返回给调用方
    pub fn is_caller_facing(&self) -> bool {
        matches!(
            self,
            HubError::ServiceNotFound { .. } | HubError::ServiceUnavailable { .. }
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HubError::ServiceUnavailable { .. }
                | HubError::DownstreamCall { .. }
                | HubError::Network(_)
                | HubError::Timeout(_)
                | HubError::ProbeTimeout { .. }
        )
    }

    pub fn user_message(&self) -> &str {
        match self {
            HubError::ServiceNotFound { .. } => "请求的服务不存在",
            HubError::ServiceUnavailable { .. } => "服务暂时不可用，请稍后重试",
            HubError::DuplicateService { .. } => "服务已注册",
            HubError::Timeout(_) | HubError::ProbeTimeout { .. } => "操作超时，请稍后重试",
            HubError::Configuration(_) => "系统配置有误",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for HubError {
    fn from(err: serde_json::Error) -> Self {
        HubError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for HubError {
    fn from(err: anyhow::Error) -> Self {
        HubError::Internal(err.to_string())
    }
}
