//! 内置业务事件处理器
//!
//! 每个业务事件扇出到若干下游服务调用。同一事件触发的调用之间互不依赖，
//! 并发执行；任何一个调用失败只记录日志，不影响其余调用。

use std::sync::Arc;

use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use nexus_core::{
    config::EventsConfig,
    models::{event_names, BusinessEvent, HttpMethod},
};

use crate::event_bus::EventBus;
use crate::gateway::Dispatcher;

/// 一次下游调用
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamCall {
    pub service: &'static str,
    pub path: &'static str,
    pub payload: Value,
}

impl DownstreamCall {
    fn post(service: &'static str, path: &'static str, payload: Value) -> Self {
        Self {
            service,
            path,
            payload,
        }
    }
}

/// 计算业务事件需要触发的下游调用
///
/// 未知事件返回空列表。
pub fn route_business_event(event: &BusinessEvent, high_confidence_threshold: f64) -> Vec<DownstreamCall> {
    let data = event.payload.clone();

    match event.name.as_str() {
        event_names::USER_CREATED => vec![
            DownstreamCall::post("notification-service", "/welcome", data.clone()),
            DownstreamCall::post(
                "analytics-service",
                "/track",
                json!({ "event": "user_created", "data": data }),
            ),
        ],
        event_names::TENANT_CREATED => vec![
            DownstreamCall::post("workflow-service", "/setup", data.clone()),
            DownstreamCall::post("ml-service", "/initialize", data),
        ],
        event_names::WORKFLOW_EXECUTED => vec![
            DownstreamCall::post("analytics-service", "/workflow-execution", data.clone()),
            DownstreamCall::post("ml-service", "/analyze-workflow", data),
        ],
        event_names::ML_PREDICTION => {
            let mut calls = vec![DownstreamCall::post(
                "analytics-service",
                "/ml-prediction",
                data.clone(),
            )];
            let confidence = event.payload_f64("confidence").unwrap_or(0.0);
            if confidence > high_confidence_threshold {
                calls.push(DownstreamCall::post(
                    "notification-service",
                    "/high-confidence-prediction",
                    data,
                ));
            }
            calls
        }
        event_names::QUANTUM_COMPUTATION => vec![
            DownstreamCall::post("analytics-service", "/quantum-result", data.clone()),
            DownstreamCall::post("ml-service", "/quantum-enhanced", data),
        ],
        _ => Vec::new(),
    }
}

/// 并发执行下游调用，失败只记录日志
pub async fn fan_out(dispatcher: &Dispatcher, event_name: &str, calls: Vec<DownstreamCall>) {
    let results = join_all(calls.iter().map(|call| {
        dispatcher.invoke(call.service, HttpMethod::Post, call.path, &call.payload)
    }))
    .await;

    for (call, result) in calls.iter().zip(results) {
        match result {
            Ok(result) if result.is_success() => {
                debug!("事件 {} 已转发到 {}{}", event_name, call.service, call.path);
            }
            Ok(result) => {
                error!(
                    "事件 {} 转发到 {}{} 失败: {}",
                    event_name,
                    call.service,
                    call.path,
                    result.error().unwrap_or("unknown")
                );
            }
            Err(e) => {
                warn!(
                    "事件 {} 无法转发到 {}{}: {}",
                    event_name, call.service, call.path, e
                );
            }
        }
    }
}

/// 业务事件日志中标识事件主体的载荷字段
fn subject_key(event_name: &str) -> Option<&'static str> {
    match event_name {
        event_names::USER_CREATED => Some("userId"),
        event_names::TENANT_CREATED => Some("tenantId"),
        event_names::WORKFLOW_EXECUTED => Some("workflowId"),
        event_names::ML_PREDICTION => Some("predictionId"),
        event_names::QUANTUM_COMPUTATION => Some("computationId"),
        _ => None,
    }
}

fn log_event(event: &BusinessEvent, description: &str) {
    match subject_key(&event.name) {
        Some(key) => info!(
            "{}: {}",
            description,
            event.payload_str(key).unwrap_or("-")
        ),
        None => info!("{}: {}", description, event.id),
    }
}

/// 安装内置事件处理器
pub fn install_default_handlers(bus: &EventBus, dispatcher: Arc<Dispatcher>, config: &EventsConfig) {
    let business_events = [
        (event_names::USER_CREATED, "用户创建"),
        (event_names::TENANT_CREATED, "租户创建"),
        (event_names::WORKFLOW_EXECUTED, "工作流执行"),
        (event_names::ML_PREDICTION, "ML预测完成"),
        (event_names::QUANTUM_COMPUTATION, "量子计算完成"),
    ];

    let threshold = config.high_confidence_threshold;
    for (name, description) in business_events {
        let dispatcher = dispatcher.clone();
        bus.subscribe_fn(name, "business-fan-out", move |event| {
            let dispatcher = dispatcher.clone();
            async move {
                log_event(&event, description);
                let calls = route_business_event(&event, threshold);
                fan_out(&dispatcher, &event.name, calls).await;
                Ok(())
            }
        });
    }

    let weak_bus = bus.downgrade();
    bus.subscribe_fn(event_names::SYSTEM_STARTUP, "lifecycle", move |_| {
        let weak_bus = weak_bus.clone();
        async move {
            info!("系统启动");
            if let Some(bus) = weak_bus.upgrade() {
                bus.emit(
                    event_names::SYSTEM_READY,
                    json!({ "timestamp": chrono::Utc::now() }),
                )
                .await;
            }
            Ok(())
        }
    });

    bus.subscribe_fn(event_names::SYSTEM_SHUTDOWN, "lifecycle", |_| async {
        info!("系统关闭");
        Ok(())
    });

    bus.subscribe_fn(event_names::SERVICE_HEALTH, "health-log", |event| async move {
        debug!(
            "服务健康: {} -> {}",
            event.payload_str("service").unwrap_or("-"),
            event.payload_str("status").unwrap_or("-")
        );
        Ok(())
    });

    bus.subscribe_fn(event_names::SERVICE_ERROR, "health-log", |event| async move {
        error!(
            "服务错误: {} - {}",
            event.payload_str("service").unwrap_or("-"),
            event.payload_str("error").unwrap_or("-")
        );
        Ok(())
    });

    info!("内置事件处理器已安装");
}
