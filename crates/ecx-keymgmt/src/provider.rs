//! Provider context.
//!
//! The provider context replaces process-global state: it carries the running
//! flag checked by entry points, the configuration and lifecycle counters.
//! Key objects only hold a `Weak` reference to it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use ecx_common::ProviderConfig;
use tracing::{debug, info};

/// Lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderStats {
    pub keys_created: u64,
    pub keys_destroyed: u64,
}

impl ProviderStats {
    /// Keys created and not yet destroyed.
    pub fn live_keys(&self) -> u64 {
        self.keys_created - self.keys_destroyed
    }
}

/// Shared provider state.
#[derive(Debug)]
pub struct ProviderContext {
    config: ProviderConfig,
    running: AtomicBool,
    keys_created: AtomicU64,
    keys_destroyed: AtomicU64,
}

impl ProviderContext {
    pub fn new(config: ProviderConfig) -> Arc<Self> {
        info!(
            provider = %config.name,
            running = config.start_running,
            "provider context created"
        );
        Arc::new(Self {
            running: AtomicBool::new(config.start_running),
            config,
            keys_created: AtomicU64::new(0),
            keys_destroyed: AtomicU64::new(0),
        })
    }

    /// A running provider with the default configuration.
    pub fn with_defaults() -> Arc<Self> {
        Self::new(ProviderConfig::default())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop accepting work. Existing keys stay alive until released.
    pub fn teardown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!(provider = %self.config.name, "provider torn down");
        }
    }

    pub fn restart(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            debug!(provider = %self.config.name, "provider restarted");
        }
    }

    pub fn stats(&self) -> ProviderStats {
        ProviderStats {
            keys_created: self.keys_created.load(Ordering::Acquire),
            keys_destroyed: self.keys_destroyed.load(Ordering::Acquire),
        }
    }

    pub(crate) fn record_created(&self) {
        self.keys_created.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_destroyed(&self) {
        self.keys_destroyed.fetch_add(1, Ordering::AcqRel);
    }
}
