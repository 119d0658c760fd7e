use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use nexus_core::{
    models::{GlobalMetrics, HealthCheckResult, ServiceMetrics, SystemMetrics},
    HubResult,
};
use nexus_infrastructure::observability::metrics_recorder;

use crate::registry::ServiceRegistry;

/// 指标聚合器
///
/// 单服务指标保存在注册中心中与服务描述并列，全局健康指标和系统级
/// 调用指标由聚合器自身持有。
pub struct MetricsAggregator {
    registry: Arc<ServiceRegistry>,
    global: RwLock<GlobalMetrics>,
    system: RwLock<SystemMetrics>,
}

impl MetricsAggregator {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            registry,
            global: RwLock::new(GlobalMetrics::default()),
            system: RwLock::new(SystemMetrics::new(Utc::now())),
        }
    }

    /// 记录一次服务调用，返回更新后的服务指标
    pub fn record_call(
        &self,
        service: &str,
        response_time_ms: f64,
        is_error: bool,
    ) -> HubResult<ServiceMetrics> {
        let now = Utc::now();
        let updated = self.registry.update_metrics(service, |metrics| {
            metrics.record(response_time_ms, is_error, now);
            metrics.clone()
        })?;

        self.system.write().record(response_time_ms, is_error);
        metrics_recorder::record_service_call(service, response_time_ms, is_error);

        debug!(
            "记录服务调用: {} 耗时 {:.1}ms, 错误: {} (请求数: {}, 平均耗时: {:.1}ms)",
            service, response_time_ms, is_error, updated.requests, updated.avg_response_time_ms
        );
        Ok(updated)
    }

    pub fn snapshot(&self, service: &str) -> HubResult<ServiceMetrics> {
        self.registry.metrics(service)
    }

    pub fn global_snapshot(&self) -> GlobalMetrics {
        self.global.read().clone()
    }

    pub fn system_snapshot(&self) -> SystemMetrics {
        let mut system = self.system.read().clone();
        system.uptime_seconds = (Utc::now() - system.started_at).num_seconds().max(0);
        system
    }

    /// 根据一轮健康检查的结果重新计算全局健康指标
    pub fn update_global(&self, results: &[HealthCheckResult]) -> GlobalMetrics {
        let healthy = results.iter().filter(|result| result.is_healthy()).count();
        let global = GlobalMetrics::from_counts(healthy, results.len(), Utc::now());

        *self.global.write() = global.clone();
        global
    }
}
