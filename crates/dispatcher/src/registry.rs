//! 服务注册中心
//!
//! 保存所有逻辑服务的描述、端点句柄以及调用指标。所有操作都是同步的，
//! 由同一把读写锁保护，锁不会跨越 `.await` 持有，并发读者不会观察到
//! 更新到一半的记录。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use nexus_core::{
    models::{ServiceDefinition, ServiceDescriptor, ServiceMetrics, ServiceStatus, ServiceStatusView},
    traits::SharedServiceEndpoint,
    HubError, HubResult,
};

struct RegistryEntry {
    descriptor: ServiceDescriptor,
    endpoint: SharedServiceEndpoint,
    metrics: ServiceMetrics,
}

#[derive(Default)]
struct RegistryInner {
    /// 按注册顺序保存
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl RegistryInner {
    fn entry(&self, name: &str) -> HubResult<&RegistryEntry> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| HubError::service_not_found(name))
    }

    fn entry_mut(&mut self, name: &str) -> HubResult<&mut RegistryEntry> {
        match self.index.get(name) {
            Some(&i) => Ok(&mut self.entries[i]),
            None => Err(HubError::service_not_found(name)),
        }
    }
}

/// 服务注册中心
#[derive(Default)]
pub struct ServiceRegistry {
    inner: RwLock<RegistryInner>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册服务，初始状态为 initializing
    ///
    /// 同名服务已存在时返回 `DuplicateService`。
    pub fn register(
        &self,
        definition: ServiceDefinition,
        endpoint: SharedServiceEndpoint,
    ) -> HubResult<ServiceDescriptor> {
        let mut inner = self.inner.write();
        if inner.index.contains_key(&definition.name) {
            return Err(HubError::duplicate_service(definition.name));
        }

        let descriptor = ServiceDescriptor::from_definition(definition, Utc::now());
        let position = inner.entries.len();
        inner.index.insert(descriptor.name.clone(), position);
        inner.entries.push(RegistryEntry {
            descriptor: descriptor.clone(),
            endpoint,
            metrics: ServiceMetrics::default(),
        });

        info!(
            "注册服务: {} (端点: {}, 优先级: {})",
            descriptor.name, descriptor.endpoint, descriptor.priority
        );
        Ok(descriptor)
    }

    /// 注册或替换服务
    ///
    /// 替换时状态重置为 initializing，已累计的调用指标保留。
    pub fn register_or_replace(
        &self,
        definition: ServiceDefinition,
        endpoint: SharedServiceEndpoint,
    ) -> ServiceDescriptor {
        let mut inner = self.inner.write();
        let descriptor = ServiceDescriptor::from_definition(definition, Utc::now());

        match inner.index.get(&descriptor.name).copied() {
            Some(position) => {
                let entry = &mut inner.entries[position];
                entry.descriptor = descriptor.clone();
                entry.endpoint = endpoint;
                info!("替换服务: {}", descriptor.name);
            }
            None => {
                let position = inner.entries.len();
                inner.index.insert(descriptor.name.clone(), position);
                inner.entries.push(RegistryEntry {
                    descriptor: descriptor.clone(),
                    endpoint,
                    metrics: ServiceMetrics::default(),
                });
                info!("注册服务: {}", descriptor.name);
            }
        }

        descriptor
    }

    pub fn get(&self, name: &str) -> HubResult<ServiceDescriptor> {
        self.inner
            .read()
            .entry(name)
            .map(|entry| entry.descriptor.clone())
    }

    /// 按注册顺序返回所有服务描述的快照
    ///
    /// 返回的迭代器可以克隆，从而重复遍历同一快照。
    pub fn list(&self) -> impl Iterator<Item = ServiceDescriptor> + Clone {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| entry.descriptor.name.clone())
            .collect()
    }

    /// 更新服务状态和最近一次健康检查时间，返回之前的状态
    ///
    /// 服务首次变为 healthy 时记录在线时间标记。
    pub fn set_status(
        &self,
        name: &str,
        status: ServiceStatus,
        checked_at: DateTime<Utc>,
    ) -> HubResult<ServiceStatus> {
        let mut inner = self.inner.write();
        let entry = inner.entry_mut(name)?;

        let previous = entry.descriptor.status;
        entry.descriptor.status = status;
        entry.descriptor.last_health_check_at = Some(checked_at);

        if status.is_healthy() && entry.metrics.uptime_marker.is_none() {
            entry.metrics.uptime_marker = Some(checked_at);
        }

        if previous != status {
            debug!("服务 {} 状态变更: {} -> {}", name, previous, status);
        }

        Ok(previous)
    }

    pub fn endpoint(&self, name: &str) -> HubResult<SharedServiceEndpoint> {
        self.inner
            .read()
            .entry(name)
            .map(|entry| entry.endpoint.clone())
    }

    /// 在一次加锁中读取服务状态和端点句柄
    pub fn status_and_endpoint(
        &self,
        name: &str,
    ) -> HubResult<(ServiceStatus, SharedServiceEndpoint)> {
        self.inner
            .read()
            .entry(name)
            .map(|entry| (entry.descriptor.status, entry.endpoint.clone()))
    }

    /// 健康探测目标（服务名，端点），按注册顺序
    pub fn probe_targets(&self) -> Vec<(String, SharedServiceEndpoint)> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| (entry.descriptor.name.clone(), entry.endpoint.clone()))
            .collect()
    }

    pub fn metrics(&self, name: &str) -> HubResult<ServiceMetrics> {
        self.inner
            .read()
            .entry(name)
            .map(|entry| entry.metrics.clone())
    }

    /// 在写锁内原子地修改服务指标
    pub fn update_metrics<F, R>(&self, name: &str, update: F) -> HubResult<R>
    where
        F: FnOnce(&mut ServiceMetrics) -> R,
    {
        let mut inner = self.inner.write();
        let entry = inner.entry_mut(name)?;
        Ok(update(&mut entry.metrics))
    }

    /// 状态接口使用的服务视图快照
    pub fn status_views(&self) -> Vec<ServiceStatusView> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|entry| ServiceStatusView {
                name: entry.descriptor.name.clone(),
                status: entry.descriptor.status,
                last_health_check: entry.descriptor.last_health_check_at,
                metrics: entry.metrics.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().index.contains_key(name)
    }

    pub fn count_by_status(&self, status: ServiceStatus) -> usize {
        self.inner
            .read()
            .entries
            .iter()
            .filter(|entry| entry.descriptor.status == status)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_testing_utils::MockServiceEndpoint;

    fn definition(name: &str) -> ServiceDefinition {
        ServiceDefinition::new(name, format!("/api/{name}"))
    }

    #[test]
    fn test_register_and_get() {
        let registry = ServiceRegistry::new();
        let endpoint = MockServiceEndpoint::healthy("auth-service");

        let descriptor = registry
            .register(definition("auth-service").with_priority(1), endpoint.shared())
            .unwrap();

        assert_eq!(descriptor.status, ServiceStatus::Initializing);
        assert!(descriptor.last_health_check_at.is_none());
        assert_eq!(registry.get("auth-service").unwrap(), descriptor);
        assert!(registry.contains("auth-service"));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.endpoint("auth-service").unwrap().describe(),
            "mock auth-service"
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = ServiceRegistry::new();
        let endpoint = MockServiceEndpoint::healthy("a");

        registry.register(definition("a"), endpoint.shared()).unwrap();
        let result = registry.register(definition("a").with_priority(9), endpoint.shared());

        assert!(matches!(result, Err(HubError::DuplicateService { name }) if name == "a"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().priority, 0);
    }

    #[test]
    fn test_register_or_replace_keeps_metrics() {
        let registry = ServiceRegistry::new();
        let endpoint = MockServiceEndpoint::healthy("a");

        registry.register(definition("a"), endpoint.shared()).unwrap();
        registry
            .set_status("a", ServiceStatus::Healthy, Utc::now())
            .unwrap();
        registry
            .update_metrics("a", |m| m.record(10.0, false, Utc::now()))
            .unwrap();

        let replaced =
            registry.register_or_replace(definition("a").with_priority(4), endpoint.shared());

        assert_eq!(replaced.status, ServiceStatus::Initializing);
        assert_eq!(registry.get("a").unwrap().priority, 4);
        assert_eq!(registry.metrics("a").unwrap().requests, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_service() {
        let registry = ServiceRegistry::new();

        assert!(matches!(
            registry.get("missing"),
            Err(HubError::ServiceNotFound { .. })
        ));
        assert!(registry
            .set_status("missing", ServiceStatus::Healthy, Utc::now())
            .is_err());
        assert!(registry.metrics("missing").is_err());
        assert!(registry.update_metrics("missing", |_| ()).is_err());
        assert!(registry.endpoint("missing").is_err());
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let registry = ServiceRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(definition(name), MockServiceEndpoint::healthy(name).shared())
                .unwrap();
        }

        let listing = registry.list();
        let names: Vec<String> = listing.clone().map(|d| d.name).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);

        // 克隆的迭代器可以再次遍历
        assert_eq!(listing.count(), 3);
        assert_eq!(registry.names(), names);
    }

    #[test]
    fn test_set_status_stamps_uptime_once() {
        let registry = ServiceRegistry::new();
        registry
            .register(definition("a"), MockServiceEndpoint::healthy("a").shared())
            .unwrap();

        let first = Utc::now();
        let previous = registry
            .set_status("a", ServiceStatus::Healthy, first)
            .unwrap();
        assert_eq!(previous, ServiceStatus::Initializing);

        let later = first + chrono::Duration::seconds(30);
        registry
            .set_status("a", ServiceStatus::Unhealthy, later)
            .unwrap();
        registry.set_status("a", ServiceStatus::Healthy, later).unwrap();

        let descriptor = registry.get("a").unwrap();
        assert_eq!(descriptor.last_health_check_at, Some(later));
        assert_eq!(registry.metrics("a").unwrap().uptime_marker, Some(first));
        assert_eq!(registry.count_by_status(ServiceStatus::Healthy), 1);
    }
}
