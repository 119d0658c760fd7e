use std::time::Duration;

use nexus_core::HubConfig;

/// Hub configuration with short intervals and no built-in handlers
pub fn test_hub_config() -> HubConfig {
    let mut config = HubConfig::default();
    config.health.check_interval_seconds = 1;
    config.health.probe_timeout_seconds = 1;
    config.cache.sweep_interval_seconds = 60;
    config.cache.default_ttl_seconds = 60;
    config.events.install_default_handlers = false;
    config
}

/// Let spawned tasks run until they block
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Advance paused time in small steps so timers and spawned tasks interleave
pub async fn advance(total: Duration) {
    let step = Duration::from_millis(10);
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        tokio::time::advance(step).await;
        settle().await;
        elapsed += step;
    }
}

/// Install a test subscriber once; later calls are no-ops
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}
