//! Shared agent state: the sysinfo handle and the last collected sample.

use std::sync::Arc;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tokio::sync::{Mutex, RwLock};

use crate::types::MetricsSample;

pub type SharedSystem = Arc<Mutex<System>>;

#[derive(Clone)]
pub struct AppState {
    pub sys: SharedSystem,
    // Filled by the sampler; None until the first refresh completes
    pub latest: Arc<RwLock<Option<MetricsSample>>>,
}

impl AppState {
    pub fn new() -> Self {
        // Only CPU usage and RAM are ever read
        let kind = RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
            .with_memory(MemoryRefreshKind::nothing().with_ram());
        Self {
            sys: Arc::new(Mutex::new(System::new_with_specifics(kind))),
            latest: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
