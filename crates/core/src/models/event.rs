//! 业务事件
//!
//! 事件只在事件总线上流转，不做持久化。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 标准事件名称
pub mod event_names {
    pub const USER_CREATED: &str = "user.created";
    pub const TENANT_CREATED: &str = "tenant.created";
    pub const WORKFLOW_EXECUTED: &str = "workflow.executed";
    pub const ML_PREDICTION: &str = "ml.prediction";
    pub const QUANTUM_COMPUTATION: &str = "quantum.computation";

    pub const SERVICE_REGISTERED: &str = "service.registered";
    pub const SERVICE_HEALTH: &str = "service.health";
    pub const SERVICE_ERROR: &str = "service.error";
    pub const METRICS_GLOBAL: &str = "metrics.global";

    pub const SYSTEM_STARTUP: &str = "system.startup";
    pub const SYSTEM_READY: &str = "system.ready";
    pub const SYSTEM_SHUTDOWN: &str = "system.shutdown";
}

/// 业务事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessEvent {
    pub id: Uuid,
    pub name: String,
    pub payload: Value,
    pub occurred_at: DateTime<Utc>,
}

impl BusinessEvent {
    pub fn new<S: Into<String>>(name: S, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }

    /// 从负载中读取字符串字段，用于日志
    pub fn payload_str(&self, field: &str) -> Option<&str> {
        self.payload.get(field).and_then(Value::as_str)
    }

    /// 从负载中读取数值字段
    pub fn payload_f64(&self, field: &str) -> Option<f64> {
        self.payload.get(field).and_then(Value::as_f64)
    }
}
