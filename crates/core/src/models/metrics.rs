use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个服务的调用指标
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetrics {
    pub requests: u64,
    pub errors: u64,
    pub avg_response_time_ms: f64,
    /// 首次被探测为健康的时间
    pub uptime_marker: Option<DateTime<Utc>>,
    pub last_request_at: Option<DateTime<Utc>>,
}

impl ServiceMetrics {
    /// 记录一次调用
    ///
    /// 平均值按 `avg + (sample - avg) / n` 增量更新，与
    /// `(avg * (n - 1) + sample) / n` 等价，但不会随 n 增长而放大误差。
    pub fn record(&mut self, response_time_ms: f64, is_error: bool, at: DateTime<Utc>) {
        self.requests = self.requests.saturating_add(1);
        if is_error {
            self.errors = self.errors.saturating_add(1);
        }

        let n = self.requests as f64;
        self.avg_response_time_ms += (response_time_ms - self.avg_response_time_ms) / n;
        self.last_request_at = Some(at);
    }

    pub fn error_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.errors as f64 / self.requests as f64
        }
    }
}

/// 全局健康指标，每轮健康检查后重新计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    pub system_health_percent: u8,
    pub healthy_services: usize,
    pub total_services: usize,
    pub last_update: Option<DateTime<Utc>>,
}

impl GlobalMetrics {
    /// 根据健康服务数和服务总数计算
    ///
    /// 没有任何服务时定义为100%。
    pub fn from_counts(healthy_services: usize, total_services: usize, at: DateTime<Utc>) -> Self {
        let healthy_services = healthy_services.min(total_services);
        let system_health_percent = if total_services == 0 {
            100
        } else {
            ((healthy_services as f64 * 100.0) / total_services as f64).round() as u8
        };

        Self {
            system_health_percent,
            healthy_services,
            total_services,
            last_update: Some(at),
        }
    }
}

impl Default for GlobalMetrics {
    fn default() -> Self {
        Self {
            system_health_percent: 100,
            healthy_services: 0,
            total_services: 0,
            last_update: None,
        }
    }
}

/// 系统级调用指标
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub total_requests: u64,
    pub total_errors: u64,
    pub avg_response_time_ms: f64,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
}

impl SystemMetrics {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            total_requests: 0,
            total_errors: 0,
            avg_response_time_ms: 0.0,
            started_at,
            uptime_seconds: 0,
        }
    }

    pub fn record(&mut self, response_time_ms: f64, is_error: bool) {
        self.total_requests = self.total_requests.saturating_add(1);
        if is_error {
            self.total_errors = self.total_errors.saturating_add(1);
        }
        let n = self.total_requests as f64;
        self.avg_response_time_ms += (response_time_ms - self.avg_response_time_ms) / n;
    }
}
