use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nexus_core::models::{HttpMethod, ServiceDefinition};
use nexus_core::traits::ServiceEndpoint;
use nexus_core::{HubError, HubResult};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// `ServiceEndpoint` backed by an HTTP service.
///
/// Calls go to `{base_url}{endpoint}{path}`, probes to
/// `{base_url}{endpoint}{health_endpoint}`. A probe answering with a non-2xx
/// status reports the service as unhealthy; a transport failure is an error.
pub struct HttpServiceEndpoint {
    service: String,
    service_url: String,
    health_url: String,
    http_client: reqwest::Client,
}

impl HttpServiceEndpoint {
    pub fn new(base_url: &str, definition: &ServiceDefinition, http_client: reqwest::Client) -> Self {
        let service_url = format!("{}{}", base_url.trim_end_matches('/'), definition.endpoint);
        let health_url = format!("{}{}", service_url, definition.health_endpoint);

        Self {
            service: definition.name.clone(),
            service_url,
            health_url,
            http_client,
        }
    }

    pub fn health_url(&self) -> &str {
        &self.health_url
    }

    fn request(&self, method: HttpMethod, url: &str) -> reqwest::RequestBuilder {
        match method {
            HttpMethod::Get => self.http_client.get(url),
            HttpMethod::Post => self.http_client.post(url),
            HttpMethod::Put => self.http_client.put(url),
            HttpMethod::Patch => self.http_client.patch(url),
            HttpMethod::Delete => self.http_client.delete(url),
        }
    }
}

#[async_trait]
impl ServiceEndpoint for HttpServiceEndpoint {
    #[instrument(skip(self, payload), fields(service = %self.service))]
    async fn call(&self, method: HttpMethod, path: &str, payload: &Value) -> HubResult<Value> {
        let url = format!("{}{}", self.service_url, path);
        let mut request = self.request(method, &url);
        if matches!(method, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch) {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            warn!("Failed to reach {}: {}", url, e);
            HubError::Network(format!("{url}: {e}"))
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HubError::Network(format!("{url}: {e}")))?;

        if !status.is_success() {
            return Err(HubError::downstream(
                &self.service,
                format!("HTTP {status} - {body}"),
            ));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }

    #[instrument(skip(self), fields(service = %self.service))]
    async fn health_check(&self) -> HubResult<bool> {
        let response = self
            .http_client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| HubError::probe_failure(&self.service, e.to_string()))?;

        let healthy = response.status().is_success();
        if !healthy {
            debug!("Health endpoint {} answered HTTP {}", self.health_url, response.status());
        }

        Ok(healthy)
    }

    fn describe(&self) -> String {
        format!("http {}", self.service_url)
    }
}

/// Builds `HttpServiceEndpoint`s that share one connection pool
#[derive(Clone)]
pub struct HttpEndpointFactory {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpEndpointFactory {
    pub fn new(base_url: &str, request_timeout: Duration) -> HubResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HubError::config_error(format!("无法创建HTTP客户端: {e}")))?;

        Ok(Self {
            base_url: base_url.to_string(),
            http_client,
        })
    }

    pub fn endpoint(&self, definition: &ServiceDefinition) -> Arc<dyn ServiceEndpoint> {
        Arc::new(HttpServiceEndpoint::new(
            &self.base_url,
            definition,
            self.http_client.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_from_definition() {
        let definition = ServiceDefinition::new("auth-service", "/api/auth");
        let endpoint =
            HttpServiceEndpoint::new("http://localhost:3000/", &definition, reqwest::Client::new());

        assert_eq!(endpoint.health_url(), "http://localhost:3000/api/auth/health");
        assert_eq!(endpoint.describe(), "http http://localhost:3000/api/auth");
    }
}
