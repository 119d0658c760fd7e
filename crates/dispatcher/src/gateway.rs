//! 服务调用网关
//!
//! 所有对下游服务的调用都经过 [`Dispatcher`]：先检查服务是否存在且健康，
//! 再委托给服务端点执行，最后记录一次调用指标。
//!
//! 只有调用方误用（未知服务、服务不健康）以 `Err` 返回，且不会改动指标；
//! 下游失败和超时以 `CallOutcome::Failure` 形式返回。

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use nexus_core::{
    models::{CallResult, HttpMethod},
    traits::SharedServiceEndpoint,
    HubError, HubResult,
};
use nexus_infrastructure::{
    cache_key, observability::metrics_recorder, ResultCache, TimeoutHandler,
};

use crate::event_bus::panic_message;
use crate::metrics_aggregator::MetricsAggregator;
use crate::registry::ServiceRegistry;

/// 服务调用网关
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    aggregator: Arc<MetricsAggregator>,
    cache: ResultCache,
    timeout_handler: TimeoutHandler,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        aggregator: Arc<MetricsAggregator>,
        cache: ResultCache,
        timeout_handler: TimeoutHandler,
    ) -> Self {
        Self {
            registry,
            aggregator,
            cache,
            timeout_handler,
        }
    }

    /// 调用服务
    #[instrument(skip(self, payload))]
    pub async fn invoke(
        &self,
        service: &str,
        method: HttpMethod,
        path: &str,
        payload: &Value,
    ) -> HubResult<CallResult> {
        let endpoint = self.guard(service)?;
        Ok(self.call_endpoint(service, endpoint, method, path, payload).await)
    }

    /// 调用服务并缓存成功结果
    ///
    /// 命中缓存时不会发起调用，也不会记录调用指标。`ttl` 为空时使用
    /// 缓存的默认TTL。
    #[instrument(skip(self, payload))]
    pub async fn invoke_cached(
        &self,
        service: &str,
        method: HttpMethod,
        path: &str,
        payload: &Value,
        ttl: Option<Duration>,
    ) -> HubResult<CallResult> {
        let endpoint = self.guard(service)?;

        let key = Self::call_cache_key(service, method, path, payload);
        if let Some(data) = self.cache.get(&key) {
            debug!("服务 {} 命中结果缓存: {}", service, key);
            let mut result = CallResult::success(service, data, 0);
            result.cached = true;
            return Ok(result);
        }

        let result = self
            .call_endpoint(service, endpoint, method, path, payload)
            .await;
        if let Some(data) = result.data() {
            self.cache
                .put(&key, data.clone(), ttl.unwrap_or(self.cache.default_ttl()));
        }

        Ok(result)
    }

    /// 调用前检查：服务必须存在且健康
    fn guard(&self, service: &str) -> HubResult<SharedServiceEndpoint> {
        let (status, endpoint) = self.registry.status_and_endpoint(service)?;
        if !status.is_healthy() {
            warn!("服务 {} 当前状态为 {}，拒绝调用", service, status);
            metrics_recorder::record_service_unavailable(service);
            return Err(HubError::service_unavailable(service, status));
        }
        Ok(endpoint)
    }

    async fn call_endpoint(
        &self,
        service: &str,
        endpoint: SharedServiceEndpoint,
        method: HttpMethod,
        path: &str,
        payload: &Value,
    ) -> CallResult {
        let started = Instant::now();
        // 端点 panic 按下游失败处理
        let outcome = AssertUnwindSafe(
            self.timeout_handler
                .call_operation(service, endpoint.call(method, path, payload)),
        )
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(HubError::downstream(
                service,
                format!("panic: {}", panic_message(panic.as_ref())),
            ))
        });
        let elapsed = started.elapsed();
        let response_time_ms = elapsed.as_secs_f64() * 1000.0;

        if let Err(e) = self
            .aggregator
            .record_call(service, response_time_ms, outcome.is_err())
        {
            warn!("记录服务 {} 调用指标失败: {}", service, e);
        }

        let elapsed_ms = elapsed.as_millis() as u64;
        match outcome {
            Ok(data) => CallResult::success(service, data, elapsed_ms),
            Err(e) => {
                warn!("服务 {} 调用失败 ({} {}): {}", service, method, path, e);
                CallResult::failure(service, e.to_string(), elapsed_ms)
            }
        }
    }

    fn call_cache_key(service: &str, method: HttpMethod, path: &str, payload: &Value) -> String {
        cache_key(
            &format!("{service}:{method}:{path}"),
            &json!({ "payload": payload }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nexus_core::models::{ServiceDefinition, ServiceStatus};
    use nexus_infrastructure::TimeoutConfig;
    use nexus_testing_utils::{CallBehavior, MockServiceEndpoint};

    struct Fixture {
        registry: Arc<ServiceRegistry>,
        aggregator: Arc<MetricsAggregator>,
        cache: ResultCache,
        dispatcher: Dispatcher,
    }

    fn fixture(call_timeout: Option<Duration>) -> Fixture {
        let registry = Arc::new(ServiceRegistry::new());
        let aggregator = Arc::new(MetricsAggregator::new(registry.clone()));
        let cache = ResultCache::new(Duration::from_secs(60));
        let dispatcher = Dispatcher::new(
            registry.clone(),
            aggregator.clone(),
            cache.clone(),
            TimeoutHandler::new(TimeoutConfig {
                probe_timeout: Duration::from_secs(10),
                call_timeout,
            }),
        );
        Fixture {
            registry,
            aggregator,
            cache,
            dispatcher,
        }
    }

    fn register(fixture: &Fixture, endpoint: &MockServiceEndpoint, name: &str, status: ServiceStatus) {
        fixture
            .registry
            .register(
                ServiceDefinition::new(name, format!("/api/{name}")),
                endpoint.shared(),
            )
            .unwrap();
        fixture.registry.set_status(name, status, Utc::now()).unwrap();
    }

    #[tokio::test]
    async fn test_invoke_healthy_service() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("ml-service");
        register(&fixture, &endpoint, "ml-service", ServiceStatus::Healthy);

        let result = fixture
            .dispatcher
            .invoke("ml-service", HttpMethod::Post, "/predict", &json!({"x": 1}))
            .await
            .unwrap();

        assert!(result.is_success());
        assert!(!result.cached);
        assert_eq!(result.data().unwrap()["path"], "/predict");
        assert_eq!(endpoint.call_count(), 1);
        assert_eq!(fixture.aggregator.snapshot("ml-service").unwrap().requests, 1);
    }

    #[tokio::test]
    async fn test_unknown_service_is_error() {
        let fixture = fixture(None);
        let result = fixture
            .dispatcher
            .invoke("ghost", HttpMethod::Get, "/x", &Value::Null)
            .await;
        assert!(matches!(result, Err(HubError::ServiceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_unhealthy_service_guard_leaves_metrics() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::unhealthy("B");
        register(&fixture, &endpoint, "B", ServiceStatus::Unhealthy);

        let result = fixture
            .dispatcher
            .invoke("B", HttpMethod::Get, "/x", &json!({}))
            .await;

        match result {
            Err(HubError::ServiceUnavailable { name, status }) => {
                assert_eq!(name, "B");
                assert_eq!(status, ServiceStatus::Unhealthy);
            }
            other => panic!("expected ServiceUnavailable, got {other:?}"),
        }
        assert_eq!(endpoint.call_count(), 0);
        assert_eq!(fixture.aggregator.snapshot("B").unwrap().requests, 0);
        assert_eq!(fixture.aggregator.system_snapshot().total_requests, 0);
    }

    #[tokio::test]
    async fn test_initializing_service_is_unavailable() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("A");
        register(&fixture, &endpoint, "A", ServiceStatus::Initializing);

        let result = fixture
            .dispatcher
            .invoke("A", HttpMethod::Get, "/x", &Value::Null)
            .await;
        assert!(matches!(result, Err(HubError::ServiceUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_downstream_failure_is_tagged_result() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("A").with_call(CallBehavior::Fail("db down".into()));
        register(&fixture, &endpoint, "A", ServiceStatus::Healthy);

        let result = fixture
            .dispatcher
            .invoke("A", HttpMethod::Post, "/x", &json!({}))
            .await
            .unwrap();

        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("db down"));

        let metrics = fixture.aggregator.snapshot("A").unwrap();
        assert_eq!(metrics.requests, 1);
        assert_eq!(metrics.errors, 1);
    }

    #[tokio::test]
    async fn test_panicking_endpoint_is_tagged_failure() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("A").with_call(CallBehavior::Panic);
        register(&fixture, &endpoint, "A", ServiceStatus::Healthy);

        let result = fixture
            .dispatcher
            .invoke("A", HttpMethod::Post, "/x", &json!({}))
            .await
            .unwrap();

        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("panic"));
        assert_eq!(endpoint.call_count(), 1);

        let metrics = fixture.aggregator.snapshot("A").unwrap();
        assert_eq!(metrics.requests, 1);
        assert_eq!(metrics.errors, 1);

        // 网关在 panic 之后仍可继续使用
        endpoint.set_call(CallBehavior::Echo);
        let result = fixture
            .dispatcher
            .invoke("A", HttpMethod::Get, "/y", &Value::Null)
            .await
            .unwrap();
        assert!(result.is_success());
        assert_eq!(fixture.aggregator.snapshot("A").unwrap().requests, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_counts_as_failure() {
        let fixture = fixture(Some(Duration::from_millis(100)));
        let endpoint = MockServiceEndpoint::healthy("A")
            .with_call(CallBehavior::Delay(Duration::from_secs(5), json!("late")));
        register(&fixture, &endpoint, "A", ServiceStatus::Healthy);

        let result = fixture
            .dispatcher
            .invoke("A", HttpMethod::Get, "/slow", &Value::Null)
            .await
            .unwrap();

        assert!(!result.is_success());
        assert!(result.error().unwrap().contains("超时"));
        assert_eq!(fixture.aggregator.snapshot("A").unwrap().errors, 1);
    }

    #[tokio::test]
    async fn test_invoke_cached_short_circuits() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("quantum-service")
            .with_call(CallBehavior::Respond(json!({"energy": -1.5})));
        register(&fixture, &endpoint, "quantum-service", ServiceStatus::Healthy);

        let payload = json!({"qubits": 4, "depth": 2});
        let first = fixture
            .dispatcher
            .invoke_cached("quantum-service", HttpMethod::Post, "/optimize", &payload, None)
            .await
            .unwrap();
        let second = fixture
            .dispatcher
            .invoke_cached("quantum-service", HttpMethod::Post, "/optimize", &payload, None)
            .await
            .unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.data(), first.data());
        assert_eq!(endpoint.call_count(), 1);
        assert_eq!(
            fixture.aggregator.snapshot("quantum-service").unwrap().requests,
            1
        );
        assert_eq!(fixture.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_cached_does_not_store_failures() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("A").with_call(CallBehavior::Fail("nope".into()));
        register(&fixture, &endpoint, "A", ServiceStatus::Healthy);

        for _ in 0..2 {
            let result = fixture
                .dispatcher
                .invoke_cached("A", HttpMethod::Post, "/x", &json!({}), None)
                .await
                .unwrap();
            assert!(!result.is_success());
        }

        assert_eq!(endpoint.call_count(), 2);
        assert!(fixture.cache.is_empty());
    }

    #[tokio::test]
    async fn test_invoke_cached_still_guards() {
        let fixture = fixture(None);
        let endpoint = MockServiceEndpoint::healthy("A");
        register(&fixture, &endpoint, "A", ServiceStatus::Healthy);

        fixture
            .dispatcher
            .invoke_cached("A", HttpMethod::Get, "/x", &Value::Null, None)
            .await
            .unwrap();

        fixture
            .registry
            .set_status("A", ServiceStatus::Error, Utc::now())
            .unwrap();
        let result = fixture
            .dispatcher
            .invoke_cached("A", HttpMethod::Get, "/x", &Value::Null, None)
            .await;
        assert!(matches!(result, Err(HubError::ServiceUnavailable { .. })));
    }
}
