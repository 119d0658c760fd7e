//! 事件总线
//!
//! 按事件名称分发业务事件。同一事件的订阅者按订阅顺序依次执行，
//! 任一订阅者返回错误或发生 panic 都只会被记录，不影响其余订阅者。

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use nexus_core::{models::BusinessEvent, HubError, HubResult};
use nexus_infrastructure::observability::metrics_recorder;

/// 事件订阅者
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn handle(&self, event: &BusinessEvent) -> HubResult<()>;

    /// 订阅者名称，用于日志
    fn name(&self) -> &str {
        "anonymous"
    }
}

struct FnSubscriber<F> {
    name: String,
    handler: F,
}

#[async_trait]
impl<F, Fut> EventSubscriber for FnSubscriber<F>
where
    F: Fn(BusinessEvent) -> Fut + Send + Sync,
    Fut: Future<Output = HubResult<()>> + Send + 'static,
{
    async fn handle(&self, event: &BusinessEvent) -> HubResult<()> {
        (self.handler)(event.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 一次发布的投递结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// 成功处理事件的订阅者数
    pub delivered: usize,
    /// 返回错误或 panic 的订阅者数
    pub failed: usize,
}

impl PublishReport {
    pub fn subscribers(&self) -> usize {
        self.delivered + self.failed
    }
}

type SubscriberList = Vec<Arc<dyn EventSubscriber>>;

/// 事件总线，克隆后共享同一组订阅者
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<HashMap<String, SubscriberList>>>,
}

/// 不持有订阅表的事件总线句柄，供订阅者向总线回发事件
#[derive(Clone)]
pub struct WeakEventBus {
    subscribers: Weak<RwLock<HashMap<String, SubscriberList>>>,
}

impl WeakEventBus {
    pub fn upgrade(&self) -> Option<EventBus> {
        self.subscribers
            .upgrade()
            .map(|subscribers| EventBus { subscribers })
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub fn subscribe(&self, event_name: &str, subscriber: Arc<dyn EventSubscriber>) {
        debug!("订阅事件: {} (订阅者: {})", event_name, subscriber.name());
        self.subscribers
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push(subscriber);
    }

    /// 以闭包形式订阅事件
    pub fn subscribe_fn<F, Fut>(&self, event_name: &str, subscriber_name: &str, handler: F)
    where
        F: Fn(BusinessEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HubResult<()>> + Send + 'static,
    {
        self.subscribe(
            event_name,
            Arc::new(FnSubscriber {
                name: subscriber_name.to_string(),
                handler,
            }),
        );
    }

    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.subscribers
            .read()
            .get(event_name)
            .map_or(0, Vec::len)
    }

    /// 发布事件，按订阅顺序等待每个订阅者处理完成
    pub async fn publish(&self, event: BusinessEvent) -> PublishReport {
        // 先复制订阅者列表，处理期间不持有锁，订阅者可以再次发布事件
        let subscribers: SubscriberList = self
            .subscribers
            .read()
            .get(&event.name)
            .cloned()
            .unwrap_or_default();

        let mut report = PublishReport::default();
        if subscribers.is_empty() {
            debug!("事件 {} 没有订阅者", event.name);
            metrics_recorder::record_event_published(&event.name, 0);
            return report;
        }

        for subscriber in subscribers {
            let outcome = AssertUnwindSafe(subscriber.handle(&event))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    report.failed += 1;
                    let failure = HubError::subscriber_failure(&event.name, e.to_string());
                    error!("订阅者 {} 处理失败: {}", subscriber.name(), failure);
                }
                Err(panic) => {
                    report.failed += 1;
                    let failure =
                        HubError::subscriber_failure(&event.name, panic_message(panic.as_ref()));
                    error!("订阅者 {} 发生panic: {}", subscriber.name(), failure);
                }
            }
        }

        if report.failed > 0 {
            warn!(
                "事件 {} 投递完成: 成功 {}, 失败 {}",
                event.name, report.delivered, report.failed
            );
        } else {
            debug!("事件 {} 投递完成: {} 个订阅者", event.name, report.delivered);
        }
        metrics_recorder::record_event_published(&event.name, report.failed);

        report
    }

    /// 以名称和负载构造事件并发布
    pub async fn emit(&self, event_name: &str, payload: Value) -> PublishReport {
        self.publish(BusinessEvent::new(event_name, payload)).await
    }

    /// 在后台任务中发布事件，调用方无需等待订阅者
    pub fn spawn_publish(&self, event: BusinessEvent) -> JoinHandle<PublishReport> {
        let bus = self.clone();
        tokio::spawn(async move { bus.publish(event).await })
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct PanickingSubscriber;

    #[async_trait]
    impl EventSubscriber for PanickingSubscriber {
        async fn handle(&self, _event: &BusinessEvent) -> HubResult<()> {
            panic!("subscriber exploded")
        }
    }

    #[tokio::test]
    async fn test_subscribers_run_in_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = order.clone();
            bus.subscribe_fn("user.created", label, move |event| {
                let order = order.clone();
                async move {
                    order
                        .lock()
                        .unwrap()
                        .push((label, event.payload_str("userId").map(str::to_string)));
                    Ok(())
                }
            });
        }

        let report = bus.emit("user.created", json!({"userId": "u1"})).await;

        assert_eq!(report, PublishReport { delivered: 3, failed: 0 });
        let seen = order.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                ("first", Some("u1".to_string())),
                ("second", Some("u1".to_string())),
                ("third", Some("u1".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_subscriber_is_isolated() {
        let bus = EventBus::new();
        let after = Arc::new(AtomicUsize::new(0));

        bus.subscribe_fn("tenant.created", "broken", |_| async {
            Err::<(), _>(HubError::Internal("boom".to_string()))
        });
        bus.subscribe("tenant.created", Arc::new(PanickingSubscriber));
        let counter = after.clone();
        bus.subscribe_fn("tenant.created", "healthy", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let report = bus.emit("tenant.created", json!({"tenantId": "t1"})).await;

        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 2);
        assert_eq!(report.subscribers(), 3);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        let report = bus.emit("quantum.computation", Value::Null).await;
        assert_eq!(report, PublishReport::default());
        assert_eq!(bus.subscriber_count("quantum.computation"), 0);
    }

    #[tokio::test]
    async fn test_subscriber_can_publish_again() {
        let bus = EventBus::new();
        let ready = Arc::new(AtomicUsize::new(0));

        let weak = bus.downgrade();
        bus.subscribe_fn("system.startup", "relay", move |_| {
            let weak = weak.clone();
            async move {
                if let Some(bus) = weak.upgrade() {
                    bus.emit("system.ready", Value::Null).await;
                }
                Ok(())
            }
        });
        let counter = ready.clone();
        bus.subscribe_fn("system.ready", "counter", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        bus.emit("system.startup", Value::Null).await;
        assert_eq!(ready.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawn_publish() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        bus.subscribe_fn("ml.prediction", "counter", move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let report = bus
            .spawn_publish(BusinessEvent::new("ml.prediction", json!({"confidence": 0.5})))
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_handle_does_not_keep_bus_alive() {
        let bus = EventBus::new();
        let weak = bus.downgrade();
        assert!(weak.upgrade().is_some());
        drop(bus);
        assert!(weak.upgrade().is_none());
    }
}
