use serde::Serialize;

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub invalidations: u64,
    /// Entries removed because their TTL elapsed, lazily or by a sweep
    pub expirations: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Hit rate in `[0, 1]`, `0.0` before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
