//! Timeout handling for health probes and downstream service calls
//!
//! Every probe is bounded by the probe timeout. Downstream calls are bounded
//! only when a call timeout is configured; otherwise the caller's own context
//! decides how long to wait.

use std::future::Future;
use std::time::Duration;

use nexus_core::{HubConfig, HubError, HubResult};
use tokio::time::timeout;
use tracing::{instrument, warn};

/// Timeout values for the operations the hub performs
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Health probe timeout
    pub probe_timeout: Duration,
    /// Downstream call timeout, unbounded when `None`
    pub call_timeout: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(10),
            call_timeout: None,
        }
    }
}

impl From<&HubConfig> for TimeoutConfig {
    fn from(config: &HubConfig) -> Self {
        Self {
            probe_timeout: config.health.probe_timeout(),
            call_timeout: config.dispatcher.call_timeout(),
        }
    }
}

/// Timeout handler for async hub operations
#[derive(Debug, Clone, Default)]
pub struct TimeoutHandler {
    config: TimeoutConfig,
}

impl TimeoutHandler {
    pub fn new(config: TimeoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TimeoutConfig {
        &self.config
    }

    /// Run a health probe, failing with `ProbeTimeout` once the probe timeout elapses
    #[instrument(skip(self, probe))]
    pub async fn probe_operation<F, T>(&self, service: &str, probe: F) -> HubResult<T>
    where
        F: Future<Output = HubResult<T>>,
    {
        let limit = self.config.probe_timeout;
        match timeout(limit, probe).await {
            Ok(result) => result,
            Err(_) => {
                warn!("服务 {} 健康探测超时 (超时时间: {:?})", service, limit);
                Err(HubError::ProbeTimeout {
                    service: service.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        }
    }

    /// Run a downstream call, bounded by the call timeout when one is configured
    #[instrument(skip(self, call))]
    pub async fn call_operation<F, T>(&self, service: &str, call: F) -> HubResult<T>
    where
        F: Future<Output = HubResult<T>>,
    {
        match self.config.call_timeout {
            Some(limit) => TimeoutUtils::custom(call, limit, service).await,
            None => call.await,
        }
    }
}

/// Convenience functions for one-off timeouts
pub struct TimeoutUtils;

impl TimeoutUtils {
    /// Execute with a custom timeout duration
    pub async fn custom<F, T>(
        operation: F,
        timeout_duration: Duration,
        operation_name: &str,
    ) -> HubResult<T>
    where
        F: Future<Output = HubResult<T>>,
    {
        match timeout(timeout_duration, operation).await {
            Ok(result) => result,
            Err(_) => {
                let error_msg =
                    format!("操作 '{operation_name}' 超时 (超时时间: {timeout_duration:?})");
                warn!("{}", error_msg);
                Err(HubError::timeout_error(error_msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_probe_success() {
        let handler = TimeoutHandler::default();

        let result = handler.probe_operation("auth-service", async { Ok(true) }).await;
        assert!(result.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout() {
        let handler = TimeoutHandler::new(TimeoutConfig {
            probe_timeout: Duration::from_millis(100),
            call_timeout: None,
        });

        let result = handler
            .probe_operation("slow-service", async {
                sleep(Duration::from_millis(200)).await;
                Ok(true)
            })
            .await;

        match result {
            Err(HubError::ProbeTimeout { service, timeout_ms }) => {
                assert_eq!(service, "slow-service");
                assert_eq!(timeout_ms, 100);
            }
            other => panic!("expected probe timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_without_timeout_waits() {
        let handler = TimeoutHandler::default();

        let result = handler
            .call_operation("ml-service", async {
                sleep(Duration::from_secs(120)).await;
                Ok("done")
            })
            .await;
        assert_eq!(result.unwrap(), "done");
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout() {
        let handler = TimeoutHandler::new(TimeoutConfig {
            probe_timeout: Duration::from_secs(10),
            call_timeout: Some(Duration::from_millis(50)),
        });

        let result = handler
            .call_operation("ml-service", async {
                sleep(Duration::from_millis(200)).await;
                Ok("should_timeout")
            })
            .await;

        let error = result.unwrap_err();
        assert!(matches!(error, HubError::Timeout(_)));
        assert!(error.to_string().contains("超时"));
    }

    #[test]
    fn test_config_from_hub_config() {
        let mut hub_config = HubConfig::default();
        hub_config.health.probe_timeout_seconds = 3;
        hub_config.dispatcher.call_timeout_ms = Some(250);

        let config = TimeoutConfig::from(&hub_config);
        assert_eq!(config.probe_timeout, Duration::from_secs(3));
        assert_eq!(config.call_timeout, Some(Duration::from_millis(250)));
    }
}
