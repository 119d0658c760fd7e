//! In-memory `ServiceEndpoint` doubles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nexus_core::models::HttpMethod;
use nexus_core::traits::{ServiceEndpoint, SharedServiceEndpoint};
use nexus_core::{HubError, HubResult};
use serde_json::{json, Value};

/// What the next health probe reports
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    Healthy,
    Unhealthy,
    Fail(String),
    /// Never resolves; only a timeout ends the probe
    Hang,
    Panic,
}

/// What the next call returns
#[derive(Debug, Clone)]
pub enum CallBehavior {
    /// `{"service", "method", "path", "payload"}`
    Echo,
    Respond(Value),
    Fail(String),
    Delay(Duration, Value),
    Panic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub payload: Value,
}

/// Mock endpoint recording every call it receives
#[derive(Debug, Clone)]
pub struct MockServiceEndpoint {
    name: String,
    probe: Arc<Mutex<ProbeBehavior>>,
    call: Arc<Mutex<CallBehavior>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    probes: Arc<AtomicUsize>,
}

impl MockServiceEndpoint {
    pub fn new(name: &str, probe: ProbeBehavior) -> Self {
        Self {
            name: name.to_string(),
            probe: Arc::new(Mutex::new(probe)),
            call: Arc::new(Mutex::new(CallBehavior::Echo)),
            calls: Arc::new(Mutex::new(Vec::new())),
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn healthy(name: &str) -> Self {
        Self::new(name, ProbeBehavior::Healthy)
    }

    pub fn unhealthy(name: &str) -> Self {
        Self::new(name, ProbeBehavior::Unhealthy)
    }

    pub fn failing(name: &str, message: &str) -> Self {
        Self::new(name, ProbeBehavior::Fail(message.to_string()))
    }

    pub fn with_call(self, behavior: CallBehavior) -> Self {
        self.set_call(behavior);
        self
    }

    pub fn set_probe(&self, behavior: ProbeBehavior) {
        *self.probe.lock().unwrap() = behavior;
    }

    pub fn set_call(&self, behavior: CallBehavior) {
        *self.call.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.path == path)
            .collect()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// A shared handle for registration; the mock keeps observing calls
    pub fn shared(&self) -> SharedServiceEndpoint {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl ServiceEndpoint for MockServiceEndpoint {
    async fn call(&self, method: HttpMethod, path: &str, payload: &Value) -> HubResult<Value> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: path.to_string(),
            payload: payload.clone(),
        });

        let behavior = self.call.lock().unwrap().clone();
        match behavior {
            CallBehavior::Echo => Ok(json!({
                "service": self.name,
                "method": method.as_str(),
                "path": path,
                "payload": payload,
            })),
            CallBehavior::Respond(value) => Ok(value),
            CallBehavior::Fail(message) => Err(HubError::downstream(&self.name, message)),
            CallBehavior::Delay(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            CallBehavior::Panic => panic!("mock endpoint {} panicked", self.name),
        }
    }

    async fn health_check(&self) -> HubResult<bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        let behavior = self.probe.lock().unwrap().clone();
        match behavior {
            ProbeBehavior::Healthy => Ok(true),
            ProbeBehavior::Unhealthy => Ok(false),
            ProbeBehavior::Fail(message) => Err(HubError::probe_failure(&self.name, message)),
            ProbeBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(false)
            }
            ProbeBehavior::Panic => panic!("mock endpoint {} health check panicked", self.name),
        }
    }

    fn describe(&self) -> String {
        format!("mock {}", self.name)
    }
}
