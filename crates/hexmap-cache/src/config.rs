//! Cache configuration.

/// Tuning knobs for the map cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Generations fetched around the center by `load_region`.
    pub region_depth: usize,
    /// Generations fetched by background `prefetch_region` calls.
    pub prefetch_depth: usize,
    /// Bounded history of reducer actions kept for diagnostics and replay.
    pub action_log_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            region_depth: 3,
            prefetch_depth: 2,
            action_log_capacity: 512,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn with_region_depth(mut self, depth: usize) -> Self {
        self.region_depth = depth;
        self
    }

    #[must_use]
    pub fn with_prefetch_depth(mut self, depth: usize) -> Self {
        self.prefetch_depth = depth;
        self
    }

    #[must_use]
    pub fn with_action_log_capacity(mut self, capacity: usize) -> Self {
        self.action_log_capacity = capacity;
        self
    }
}
