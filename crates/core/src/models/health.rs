use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ServiceStatus;

/// 单次健康探测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub service: String,
    pub status: ServiceStatus,
    pub response_time_ms: Option<u64>,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthCheckResult {
    /// 探测在超时前返回了结果
    pub fn probed<S: Into<String>>(
        service: S,
        healthy: bool,
        response_time_ms: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            service: service.into(),
            status: if healthy {
                ServiceStatus::Healthy
            } else {
                ServiceStatus::Unhealthy
            },
            response_time_ms: Some(response_time_ms),
            timestamp,
            error: None,
        }
    }

    /// 探测报错或超时
    pub fn failed<S: Into<String>, E: Into<String>>(
        service: S,
        error: E,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            service: service.into(),
            status: ServiceStatus::Error,
            response_time_ms: None,
            timestamp,
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}
