use nexus_core::models::ServiceDefinition;

/// 默认服务目录：(名称, 端点, 依赖, 优先级)
const CATALOG: [(&str, &str, &[&str], i32); 12] = [
    ("auth-service", "/api/auth", &["database"], 1),
    ("user-service", "/api/users", &["auth-service", "database"], 2),
    ("tenant-service", "/api/tenants", &["auth-service", "database"], 2),
    ("client-service", "/api/clients", &["auth-service", "tenant-service"], 3),
    ("workflow-service", "/api/workflows", &["auth-service", "client-service"], 3),
    ("ml-service", "/api/ml", &["auth-service", "data-service"], 4),
    ("quantum-service", "/api/quantum", &["ml-service"], 5),
    ("email-service", "/api/email", &["auth-service", "template-service"], 3),
    ("chat-service", "/api/chat", &["auth-service", "websocket-service"], 3),
    ("calendar-service", "/api/calendar", &["auth-service", "notification-service"], 3),
    ("notification-service", "/api/notifications", &["auth-service"], 2),
    ("analytics-service", "/api/analytics", &["auth-service", "data-service"], 4),
];

/// 默认的12个逻辑服务，按目录顺序
pub fn default_catalog() -> Vec<ServiceDefinition> {
    CATALOG
        .iter()
        .map(|(name, endpoint, dependencies, priority)| {
            ServiceDefinition::new(*name, *endpoint)
                .with_dependencies(dependencies.iter().copied())
                .with_priority(*priority)
        })
        .collect()
}

/// 按优先级排序（数值小的先注册），同优先级保持原有顺序
pub fn startup_order(mut definitions: Vec<ServiceDefinition>) -> Vec<ServiceDefinition> {
    definitions.sort_by_key(|definition| definition.priority);
    definitions
}
