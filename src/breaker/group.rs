//! A keyed registry of breakers, one per named downstream call.
//!
//! Backed by `dashmap::DashMap`: the read path (`get_or_create` when the
//! breaker already exists) takes a lock-free read, and creation takes
//! `DashMap::entry`, which double-checks under its own shard lock so two
//! threads racing to create the same breaker never allocate two.

use super::{CircuitBreaker, CircuitState, ExecuteError};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Per-breaker configuration. Copied into each breaker a group creates; a
/// group never hands out a shared mutable config instance.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Consecutive closed-state failures before tripping to open.
    pub max_failures: u32,
    /// How long the breaker stays open before admitting a half-open probe.
    pub open_timeout: Duration,
    /// Maximum concurrent probes admitted while half-open.
    pub half_open_budget: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        BreakerConfig {
            max_failures: 5,
            open_timeout: Duration::from_secs(30),
            half_open_budget: 1,
        }
    }
}

/// A named registry of [`CircuitBreaker`]s, one per downstream call site.
pub struct BreakerGroup {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerGroup {
    /// Builds an empty group; every breaker it creates uses `config`.
    pub fn new(config: BreakerConfig) -> Self {
        BreakerGroup {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Returns the named breaker, creating it with the group's config on
    /// first use.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(&existing);
        }
        let config = self.config;
        Arc::clone(self.breakers.entry(name.to_string()).or_insert_with(|| {
            Arc::new(CircuitBreaker::new(
                name.to_string(),
                config.max_failures,
                config.open_timeout,
                config.half_open_budget,
            ))
        }))
    }

    /// Runs `f` through the named breaker, creating it on first use.
    pub fn execute<T, E>(&self, name: &str, f: impl FnOnce() -> Result<T, E>) -> Result<T, ExecuteError<E>>
    where
        E: std::fmt::Display,
    {
        self.get_or_create(name).execute(f)
    }

    /// Snapshot of every breaker's current state, for health reporting.
    pub fn states(&self) -> Vec<(String, CircuitState)> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().state()))
            .collect()
    }
}
