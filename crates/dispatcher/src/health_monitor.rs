use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use serde_json::json;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use nexus_core::{
    models::{event_names, GlobalMetrics, HealthCheckResult},
    traits::SharedServiceEndpoint,
    HubConfig,
};
use nexus_infrastructure::{observability::metrics_recorder, TimeoutConfig, TimeoutHandler};

use crate::event_bus::{panic_message, EventBus};
use crate::metrics_aggregator::MetricsAggregator;
use crate::registry::ServiceRegistry;

/// 健康监控配置
#[derive(Debug, Clone)]
pub struct HealthMonitorConfig {
    /// 检查间隔
    pub check_interval: Duration,
    /// 单次探测超时
    pub probe_timeout: Duration,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(30), // 30秒检查一次
            probe_timeout: Duration::from_secs(10),  // 10秒探测超时
        }
    }
}

impl From<&HubConfig> for HealthMonitorConfig {
    fn from(config: &HubConfig) -> Self {
        Self {
            check_interval: config.health.check_interval(),
            probe_timeout: config.health.probe_timeout(),
        }
    }
}

/// 健康监控
///
/// 每轮检查并发探测所有已注册服务，探测结束后每个服务的状态只更新一次：
/// `Ok(true)` 为 healthy，`Ok(false)` 为 unhealthy，出错、超时或 panic 为 error。
pub struct HealthMonitor {
    registry: Arc<ServiceRegistry>,
    aggregator: Arc<MetricsAggregator>,
    event_bus: EventBus,
    timeout_handler: TimeoutHandler,
    config: HealthMonitorConfig,
    running: Arc<RwLock<bool>>,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        aggregator: Arc<MetricsAggregator>,
        event_bus: EventBus,
        config: Option<HealthMonitorConfig>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let timeout_handler = TimeoutHandler::new(TimeoutConfig {
            probe_timeout: config.probe_timeout,
            call_timeout: None,
        });

        Self {
            registry,
            aggregator,
            event_bus,
            timeout_handler,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// 执行一轮健康检查
    pub async fn run_sweep(&self) -> Vec<HealthCheckResult> {
        let started = Instant::now();
        let targets = self.registry.probe_targets();
        debug!("开始健康检查，共 {} 个服务", targets.len());

        let results = join_all(
            targets
                .into_iter()
                .map(|(name, endpoint)| self.probe(name, endpoint)),
        )
        .await;

        for result in &results {
            if let Err(e) = self
                .registry
                .set_status(&result.service, result.status, result.timestamp)
            {
                warn!("更新服务 {} 状态失败: {}", result.service, e);
                continue;
            }
            metrics_recorder::record_service_health(&result.service, result.is_healthy());

            match serde_json::to_value(result) {
                Ok(payload) => {
                    self.event_bus
                        .emit(event_names::SERVICE_HEALTH, payload)
                        .await;
                }
                Err(e) => error!("序列化健康检查结果失败: {}", e),
            }

            if let Some(error) = &result.error {
                self.event_bus
                    .emit(
                        event_names::SERVICE_ERROR,
                        json!({
                            "service": result.service,
                            "error": error,
                            "timestamp": result.timestamp,
                        }),
                    )
                    .await;
            }
        }

        let global = self.aggregator.update_global(&results);
        metrics_recorder::record_health_sweep(
            global.system_health_percent,
            started.elapsed().as_secs_f64() * 1000.0,
        );
        self.publish_global(&global).await;

        info!(
            "健康检查完成: {}/{} 个服务健康 ({}%)",
            global.healthy_services, global.total_services, global.system_health_percent
        );
        results
    }

    async fn probe(&self, service: String, endpoint: SharedServiceEndpoint) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = AssertUnwindSafe(
            self.timeout_handler
                .probe_operation(&service, endpoint.health_check()),
        )
        .catch_unwind()
        .await;
        let now = Utc::now();

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = format!("panic: {}", panic_message(panic.as_ref()));
                error!("服务 {} 健康检查出错: {}", service, message);
                return HealthCheckResult::failed(service, message, now);
            }
        };

        match outcome {
            Ok(healthy) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if !healthy {
                    warn!("服务 {} 健康检查未通过", service);
                }
                HealthCheckResult::probed(service, healthy, elapsed_ms, now)
            }
            Err(e) => {
                error!("服务 {} 健康检查出错: {}", service, e);
                HealthCheckResult::failed(service, e.to_string(), now)
            }
        }
    }

    async fn publish_global(&self, global: &GlobalMetrics) {
        match serde_json::to_value(global) {
            Ok(payload) => {
                self.event_bus
                    .emit(event_names::METRICS_GLOBAL, payload)
                    .await;
            }
            Err(e) => error!("序列化全局指标失败: {}", e),
        }
    }

    /// 启动健康检查循环，立即执行第一轮检查
    pub async fn start(
        self: &Arc<Self>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        *self.running.write().await = true;
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            info!(
                "启动健康检查循环 (间隔: {:?}, 探测超时: {:?})",
                monitor.config.check_interval, monitor.config.probe_timeout
            );

            let mut ticker = interval(monitor.config.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // 检查是否应该停止运行
                        if !*monitor.running.read().await {
                            info!("收到停止信号，退出健康检查循环");
                            break;
                        }
                        monitor.run_sweep().await;
                    }
                    _ = shutdown_rx.recv() => {
                        info!("健康检查循环关闭");
                        break;
                    }
                }
            }

            *monitor.running.write().await = false;
        })
    }

    /// 停止健康检查循环，正在进行的一轮检查会完整结束
    pub async fn stop(&self) {
        info!("停止健康检查");
        *self.running.write().await = false;
    }
}
