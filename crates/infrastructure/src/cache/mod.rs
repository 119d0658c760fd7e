//! In-memory result cache with per-entry TTL.
//!
//! The cache is a pure memoization layer: it is never the source of truth and
//! is lost on restart. Expired entries are removed lazily on `get` and
//! proactively by the background sweeper.

mod result_cache;
mod stats;
mod sweeper;

pub use result_cache::{CacheEntry, ResultCache};
pub use stats::CacheStats;
pub use sweeper::spawn_sweeper;

use serde_json::Value;

/// Build a cache key from an operation name and its constraints.
///
/// `serde_json` objects keep their keys sorted, so two constraint maps with
/// the same content always produce the same key.
pub fn cache_key(operation: &str, constraints: &Value) -> String {
    format!("{operation}:{constraints}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_key_is_order_independent() {
        let a = json!({"qubits": 8, "depth": 3});
        let b = json!({"depth": 3, "qubits": 8});

        assert_eq!(cache_key("optimize", &a), cache_key("optimize", &b));
        assert_eq!(cache_key("optimize", &a), r#"optimize:{"depth":3,"qubits":8}"#);
        assert_ne!(cache_key("optimize", &a), cache_key("simulate", &a));
    }
}
