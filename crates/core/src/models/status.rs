use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GlobalMetrics, ServiceMetrics, ServiceStatus, SystemMetrics};

/// 系统整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemState {
    /// 全部服务健康，或尚未完成首轮健康检查
    Operational,
    /// 部分服务不健康
    Degraded,
    /// 没有健康的服务
    Outage,
}

impl SystemState {
    pub fn from_global(global: &GlobalMetrics) -> Self {
        if global.total_services == 0 || global.healthy_services == global.total_services {
            SystemState::Operational
        } else if global.healthy_services == 0 {
            SystemState::Outage
        } else {
            SystemState::Degraded
        }
    }
}

/// 状态接口中的单个服务视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatusView {
    pub name: String,
    pub status: ServiceStatus,
    pub last_health_check: Option<DateTime<Utc>>,
    pub metrics: ServiceMetrics,
}

/// 状态接口返回的完整负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: SystemState,
    pub services: Vec<ServiceStatusView>,
    pub global_metrics: GlobalMetrics,
    pub system_metrics: SystemMetrics,
    pub timestamp: DateTime<Utc>,
}
