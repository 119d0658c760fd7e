//! # 数据模型
//!
//! 定义服务编排中枢的核心数据结构：服务描述、服务指标、健康检查结果、
//! 全局指标、业务事件以及服务调用结果。
//!
//! ## 服务状态流转
//!
//! ```text
//! Initializing → Healthy ⇄ Unhealthy
//!                   ↕          ↕
//!                 Error  ⇄  Error
//! ```
//!
//! 进程运行期间没有终止状态，每一轮健康检查都可能改变服务状态。
//!
//! ## 设计原则
//!
//! - 所有时间字段使用 `DateTime<Utc>` 确保时区一致性
//! - 状态字段使用枚举类型，避免无效状态
//! - 所有模型实现 `Serialize`，状态接口可以直接渲染为JSON

pub mod call;
pub mod event;
pub mod health;
pub mod metrics;
pub mod service;
pub mod status;

pub use call::*;
pub use event::*;
pub use health::*;
pub use metrics::*;
pub use service::*;
pub use status::*;
