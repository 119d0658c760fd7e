//! 服务编排与健康中枢
//!
//! 本crate包含中枢的全部运行时组件：服务注册中心、健康监控、指标聚合、
//! 调用网关、事件总线及内置事件处理器，并由 [`IntegrationHub`] 统一组装。

pub mod catalog;
pub mod event_bus;
pub mod gateway;
pub mod handlers;
pub mod health_monitor;
pub mod hub;
pub mod metrics_aggregator;
pub mod registry;

pub use catalog::default_catalog;
pub use event_bus::{EventBus, EventSubscriber, PublishReport, WeakEventBus};
pub use gateway::Dispatcher;
pub use health_monitor::{HealthMonitor, HealthMonitorConfig};
pub use hub::IntegrationHub;
pub use metrics_aggregator::MetricsAggregator;
pub use registry::ServiceRegistry;
