use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::HubError;

/// 服务调用方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(HubError::Internal(format!("不支持的调用方法: {s}"))),
        }
    }
}

/// 调用结果标记
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Success(Value),
    Failure(String),
}

/// 经由调度网关的一次服务调用结果
///
/// 下游失败同样以结果形式返回，网关本身不向调用方抛出下游错误。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub service: String,
    pub response_time_ms: u64,
    pub outcome: CallOutcome,
    /// 是否命中结果缓存
    #[serde(default)]
    pub cached: bool,
}

impl CallResult {
    pub fn success<S: Into<String>>(service: S, data: Value, response_time_ms: u64) -> Self {
        Self {
            service: service.into(),
            response_time_ms,
            outcome: CallOutcome::Success(data),
            cached: false,
        }
    }

    pub fn failure<S: Into<String>, E: Into<String>>(
        service: S,
        error: E,
        response_time_ms: u64,
    ) -> Self {
        Self {
            service: service.into(),
            response_time_ms,
            outcome: CallOutcome::Failure(error.into()),
            cached: false,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CallOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Success(data) => Some(data),
            CallOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            CallOutcome::Success(_) => None,
            CallOutcome::Failure(error) => Some(error),
        }
    }
}
