use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// 优雅关闭管理器
#[derive(Clone)]
pub struct ShutdownManager {
    shutdown_tx: broadcast::Sender<()>,
    is_shutdown: Arc<AtomicBool>,
    /// 等待应用退出的最长时间
    grace_period: Duration,
}

impl ShutdownManager {
    pub fn new(grace_period: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            is_shutdown: Arc::new(AtomicBool::new(false)),
            grace_period,
        }
    }

    /// 订阅关闭信号，已关闭时返回的接收器会立即收到信号
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        if self.is_shutdown() {
            let (tx, rx) = broadcast::channel(1);
            let _ = tx.send(());
            return rx;
        }
        self.shutdown_tx.subscribe()
    }

    /// 触发关闭，只生效一次
    pub fn shutdown(&self) {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            debug!("关闭管理器已经触发过关闭");
            return;
        }

        info!(
            "触发系统关闭，通知 {} 个订阅者",
            self.shutdown_tx.receiver_count()
        );
        let _ = self.shutdown_tx.send(());
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// 触发关闭并在宽限期内等待 `finished` 完成
    ///
    /// 超时返回 false。
    pub async fn graceful<F>(&self, finished: F) -> bool
    where
        F: Future,
    {
        self.shutdown();
        match timeout(self.grace_period, finished).await {
            Ok(_) => true,
            Err(_) => {
                warn!("等待应用关闭超时 ({:?})", self.grace_period);
                false
            }
        }
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
