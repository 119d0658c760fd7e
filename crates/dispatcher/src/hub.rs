//! 服务编排中枢
//!
//! [`IntegrationHub`] 把注册中心、健康监控、结果缓存、指标聚合、调用网关
//! 和事件总线组装在一起，并负责它们的启动与关闭。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use nexus_core::{
    models::{
        event_names, BusinessEvent, CallResult, HealthCheckResult, HttpMethod, ServiceDefinition,
        ServiceDescriptor, SystemState, SystemStatus,
    },
    traits::SharedServiceEndpoint,
    HubConfig, HubError, HubResult,
};
use nexus_infrastructure::{spawn_sweeper, ResultCache, TimeoutConfig, TimeoutHandler};

use crate::catalog::{default_catalog, startup_order};
use crate::event_bus::{EventBus, EventSubscriber, PublishReport};
use crate::gateway::Dispatcher;
use crate::handlers;
use crate::health_monitor::{HealthMonitor, HealthMonitorConfig};
use crate::metrics_aggregator::MetricsAggregator;
use crate::registry::ServiceRegistry;

pub struct IntegrationHub {
    config: HubConfig,
    registry: Arc<ServiceRegistry>,
    aggregator: Arc<MetricsAggregator>,
    cache: ResultCache,
    event_bus: EventBus,
    dispatcher: Arc<Dispatcher>,
    health_monitor: Arc<HealthMonitor>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl IntegrationHub {
    pub fn new(config: HubConfig) -> Self {
        let registry = Arc::new(ServiceRegistry::new());
        let aggregator = Arc::new(MetricsAggregator::new(registry.clone()));
        let cache = ResultCache::new(config.cache.default_ttl());
        let event_bus = EventBus::new();

        let dispatcher = Arc::new(Dispatcher::new(
            registry.clone(),
            aggregator.clone(),
            cache.clone(),
            TimeoutHandler::new(TimeoutConfig::from(&config)),
        ));
        let health_monitor = Arc::new(HealthMonitor::new(
            registry.clone(),
            aggregator.clone(),
            event_bus.clone(),
            Some(HealthMonitorConfig::from(&config)),
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        let hub = Self {
            config,
            registry,
            aggregator,
            cache,
            event_bus,
            dispatcher,
            health_monitor,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        };

        if hub.config.events.install_default_handlers {
            hub.install_default_handlers();
        }
        hub
    }

    /// 安装内置事件处理器
    ///
    /// 配置中 `events.install_default_handlers` 为 true 时由 [`IntegrationHub::new`]
    /// 自动调用，重复调用会重复订阅。
    pub fn install_default_handlers(&self) {
        handlers::install_default_handlers(
            &self.event_bus,
            self.dispatcher.clone(),
            &self.config.events,
        );
    }

    /// 注册服务并发布 service.registered 事件
    pub async fn register_service(
        &self,
        definition: ServiceDefinition,
        endpoint: SharedServiceEndpoint,
    ) -> HubResult<ServiceDescriptor> {
        let descriptor = self.registry.register(definition, endpoint)?;

        self.event_bus
            .emit(
                event_names::SERVICE_REGISTERED,
                json!({
                    "name": descriptor.name,
                    "endpoint": descriptor.endpoint,
                    "dependencies": descriptor.dependencies,
                    "priority": descriptor.priority,
                }),
            )
            .await;
        Ok(descriptor)
    }

    /// 注册默认服务目录和配置中声明的服务
    ///
    /// 配置中的同名服务覆盖目录中的定义。服务按优先级注册，返回注册数量。
    pub async fn register_catalog<F>(&self, endpoint_factory: F) -> HubResult<usize>
    where
        F: Fn(&ServiceDefinition) -> SharedServiceEndpoint,
    {
        let mut definitions = if self.config.gateway.use_default_catalog {
            default_catalog()
        } else {
            Vec::new()
        };

        let positions: HashMap<String, usize> = definitions
            .iter()
            .enumerate()
            .map(|(i, definition)| (definition.name.clone(), i))
            .collect();
        for definition in &self.config.gateway.services {
            match positions.get(&definition.name) {
                Some(&i) => definitions[i] = definition.clone(),
                None => definitions.push(definition.clone()),
            }
        }

        let mut registered = 0;
        for definition in startup_order(definitions) {
            let endpoint = endpoint_factory(&definition);
            self.register_service(definition, endpoint).await?;
            registered += 1;
        }

        info!("服务目录注册完成，共 {} 个服务", registered);
        Ok(registered)
    }

    /// 启动健康检查循环和缓存清理任务，然后发布 system.startup 事件
    pub async fn start(&self) -> HubResult<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(HubError::Internal("服务中枢已经启动".to_string()));
        }

        info!(
            "启动服务中枢 ({} 个服务, 健康检查间隔 {:?})",
            self.registry.len(),
            self.health_monitor.config().check_interval
        );

        let monitor_handle = self
            .health_monitor
            .start(self.shutdown_tx.subscribe())
            .await;
        let sweeper_handle = spawn_sweeper(
            self.cache.clone(),
            self.config.cache.sweep_interval(),
            self.shutdown_tx.subscribe(),
        );
        self.tasks.lock().extend([monitor_handle, sweeper_handle]);

        self.event_bus
            .emit(
                event_names::SYSTEM_STARTUP,
                json!({
                    "services": self.registry.len(),
                    "timestamp": Utc::now(),
                }),
            )
            .await;
        Ok(())
    }

    /// 发布 system.shutdown 事件并停止所有后台任务
    ///
    /// 未启动时直接返回。
    pub async fn shutdown(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }

        info!("关闭服务中枢");
        self.event_bus
            .emit(
                event_names::SYSTEM_SHUTDOWN,
                json!({ "timestamp": Utc::now() }),
            )
            .await;

        self.health_monitor.stop().await;
        if self.shutdown_tx.send(()).is_err() {
            warn!("没有后台任务在监听关闭信号");
        }

        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                error!("后台任务退出异常: {}", e);
            }
        }
        info!("服务中枢已关闭");
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub async fn publish(&self, event: BusinessEvent) -> PublishReport {
        self.event_bus.publish(event).await
    }

    pub async fn emit(&self, event_name: &str, payload: Value) -> PublishReport {
        self.event_bus.emit(event_name, payload).await
    }

    pub fn subscribe(&self, event_name: &str, subscriber: Arc<dyn EventSubscriber>) {
        self.event_bus.subscribe(event_name, subscriber);
    }

    pub fn subscribe_fn<F, Fut>(&self, event_name: &str, subscriber_name: &str, handler: F)
    where
        F: Fn(BusinessEvent) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = HubResult<()>> + Send + 'static,
    {
        self.event_bus
            .subscribe_fn(event_name, subscriber_name, handler);
    }

    pub async fn invoke(
        &self,
        service: &str,
        method: HttpMethod,
        path: &str,
        payload: &Value,
    ) -> HubResult<CallResult> {
        self.dispatcher.invoke(service, method, path, payload).await
    }

    pub async fn invoke_cached(
        &self,
        service: &str,
        method: HttpMethod,
        path: &str,
        payload: &Value,
        ttl: Option<Duration>,
    ) -> HubResult<CallResult> {
        self.dispatcher
            .invoke_cached(service, method, path, payload, ttl)
            .await
    }

    /// 立即执行一轮健康检查，不影响后台循环的节奏
    pub async fn run_health_check(&self) -> Vec<HealthCheckResult> {
        self.health_monitor.run_sweep().await
    }

    /// 系统状态快照
    pub fn get_system_status(&self) -> SystemStatus {
        let global_metrics = self.aggregator.global_snapshot();
        SystemStatus {
            status: SystemState::from_global(&global_metrics),
            services: self.registry.status_views(),
            global_metrics,
            system_metrics: self.aggregator.system_snapshot(),
            timestamp: Utc::now(),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn aggregator(&self) -> &Arc<MetricsAggregator> {
        &self.aggregator
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn health_monitor(&self) -> &Arc<HealthMonitor> {
        &self.health_monitor
    }
}
