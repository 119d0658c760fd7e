use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use nexus_core::{config::ObservabilityConfig, HubConfig};
use nexus_dispatcher::IntegrationHub;
use nexus_infrastructure::{observability::describe_metrics, HttpEndpointFactory};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// 主应用程序
pub struct Application {
    hub: Arc<IntegrationHub>,
}

impl Application {
    /// 创建中枢并注册服务目录
    pub async fn new(config: HubConfig) -> Result<Self> {
        install_metrics_exporter(&config.observability)?;

        let factory = HttpEndpointFactory::new(
            &config.gateway.base_url,
            config.gateway.request_timeout(),
        )
        .context("创建HTTP客户端失败")?;

        info!("服务网关地址: {}", config.gateway.base_url);
        let hub = Arc::new(IntegrationHub::new(config));
        let registered = hub
            .register_catalog(|definition| factory.endpoint(definition))
            .await
            .context("注册服务目录失败")?;
        info!("已注册 {} 个服务", registered);

        Ok(Self { hub })
    }

    pub fn hub(&self) -> &Arc<IntegrationHub> {
        &self.hub
    }

    /// 启动中枢，直到收到关闭信号
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        self.hub.start().await.context("启动服务中枢失败")?;

        let status = self.hub.get_system_status();
        info!(
            "服务中枢已就绪: {:?}, 健康度 {}% ({}/{})",
            status.status,
            status.global_metrics.system_health_percent,
            status.global_metrics.healthy_services,
            status.global_metrics.total_services
        );

        if let Err(e) = shutdown_rx.recv().await {
            warn!("关闭信号通道异常: {}", e);
        }

        self.hub.shutdown().await;
        match serde_json::to_string(&self.hub.get_system_status()) {
            Ok(status) => info!("最终系统状态: {}", status),
            Err(e) => warn!("序列化系统状态失败: {}", e),
        }
        Ok(())
    }
}

/// 启用时安装Prometheus导出器并注册指标说明
fn install_metrics_exporter(config: &ObservabilityConfig) -> Result<()> {
    if !config.metrics_enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .metrics_listen
        .parse()
        .with_context(|| format!("无效的指标监听地址: {}", config.metrics_listen))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("安装Prometheus导出器失败")?;
    describe_metrics();

    info!("Prometheus指标地址: http://{}/metrics", addr);
    Ok(())
}
