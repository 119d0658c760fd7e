use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 服务状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Initializing,
    Healthy,
    Unhealthy,
    Error,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Initializing => "initializing",
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Unhealthy => "unhealthy",
            ServiceStatus::Error => "error",
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceStatus::Healthy)
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 服务注册定义
///
/// 注册时由调用方提供，状态和时间戳由注册中心维护。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    pub endpoint: String,
    #[serde(default = "default_health_endpoint")]
    pub health_endpoint: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub priority: i32,
}

fn default_health_endpoint() -> String {
    "/health".to_string()
}

impl ServiceDefinition {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, endpoint: E) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            health_endpoint: default_health_endpoint(),
            dependencies: Vec::new(),
            priority: 0,
        }
    }

    pub fn with_health_endpoint<S: Into<String>>(mut self, health_endpoint: S) -> Self {
        self.health_endpoint = health_endpoint.into();
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// 服务描述（注册中心中的记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub endpoint: String,
    pub health_endpoint: String,
    pub dependencies: Vec<String>,
    pub priority: i32,
    pub status: ServiceStatus,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

impl ServiceDescriptor {
    /// 根据注册定义创建服务描述，初始状态为 Initializing
    pub fn from_definition(definition: ServiceDefinition, registered_at: DateTime<Utc>) -> Self {
        Self {
            name: definition.name,
            endpoint: definition.endpoint,
            health_endpoint: definition.health_endpoint,
            dependencies: definition.dependencies,
            priority: definition.priority,
            status: ServiceStatus::Initializing,
            last_health_check_at: None,
            registered_at,
        }
    }

    pub fn depends_on(&self, service: &str) -> bool {
        self.dependencies.iter().any(|d| d == service)
    }
}
