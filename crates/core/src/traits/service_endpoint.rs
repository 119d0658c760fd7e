//! 服务端点接口定义
//!
//! 中枢不关心每个逻辑服务的具体业务逻辑，所有下游服务都通过
//! [`ServiceEndpoint`] 这一能力接口被调用和探测。真实实现（HTTP、IPC、
//! 进程内函数）可以直接替换，而无需改动中枢本身。
//!
//! ## 使用示例
//!
//! ```rust
//! use async_trait::async_trait;
//! use nexus_core::models::HttpMethod;
//! use nexus_core::traits::ServiceEndpoint;
//! use nexus_core::HubResult;
//! use serde_json::{json, Value};
//!
//! pub struct EchoEndpoint;
//!
//! #[async_trait]
//! impl ServiceEndpoint for EchoEndpoint {
//!     async fn call(&self, method: HttpMethod, path: &str, payload: &Value) -> HubResult<Value> {
//!         Ok(json!({ "method": method.as_str(), "path": path, "echo": payload }))
//!     }
//!
//!     async fn health_check(&self) -> HubResult<bool> {
//!         Ok(true)
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::HttpMethod;
use crate::HubResult;

/// 逻辑服务的调用与健康探测能力
#[async_trait]
pub trait ServiceEndpoint: Send + Sync {
    /// 调用服务
    async fn call(&self, method: HttpMethod, path: &str, payload: &Value) -> HubResult<Value>;

    /// 健康探测，`Ok(false)` 表示服务可达但报告不健康
    async fn health_check(&self) -> HubResult<bool>;

    /// 端点描述，用于日志
    fn describe(&self) -> String {
        "opaque".to_string()
    }
}

/// 注册中心、健康监控和调度网关之间共享的端点句柄
pub type SharedServiceEndpoint = Arc<dyn ServiceEndpoint>;
