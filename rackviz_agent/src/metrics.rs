//! Metrics collection using sysinfo for rackviz_agent.

use sysinfo::System;

use crate::state::AppState;
use crate::types::MetricsSample;

/// Used share of RAM, counting reclaimable memory as free.
pub fn ram_percent(total: u64, available: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    let used = total.saturating_sub(available);
    (used as f64 / total as f64 * 100.0) as f32
}

pub fn unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Refresh CPU and memory and read one sample. CPU usage is measured since
/// the previous refresh, so the first call on a fresh `System` reads 0.
pub fn collect_sample(sys: &mut System) -> MetricsSample {
    sys.refresh_cpu_usage();
    sys.refresh_memory();
    MetricsSample {
        cpu: sys.global_cpu_usage().clamp(0.0, 100.0),
        ram: ram_percent(sys.total_memory(), sys.available_memory()),
        timestamp: unix_seconds(),
    }
}

/// Cached sample if the sampler has produced one, otherwise collect now.
pub async fn current_sample(state: &AppState) -> MetricsSample {
    if let Some(s) = *state.latest.read().await {
        return s;
    }
    let mut sys = state.sys.lock().await;
    collect_sample(&mut sys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_percent_bounds() {
        assert_eq!(ram_percent(0, 0), 0.0);
        assert_eq!(ram_percent(1000, 1000), 0.0);
        assert_eq!(ram_percent(1000, 0), 100.0);
        assert!((ram_percent(1000, 250) - 75.0).abs() < 1e-4);
        // available can briefly exceed total on some kernels
        assert_eq!(ram_percent(1000, 1200), 0.0);
    }

    #[test]
    fn collected_sample_is_in_range() {
        let mut sys = System::new();
        let s = collect_sample(&mut sys);
        assert!((0.0..=100.0).contains(&s.cpu));
        assert!((0.0..=100.0).contains(&s.ram));
        assert!(s.timestamp > 1.6e9);
    }

    #[tokio::test]
    async fn falls_back_to_live_collection_before_first_tick() {
        let state = AppState::new();
        let s = current_sample(&state).await;
        assert!((0.0..=100.0).contains(&s.ram));

        let cached = MetricsSample {
            cpu: 1.0,
            ram: 2.0,
            timestamp: 3.0,
        };
        *state.latest.write().await = Some(cached);
        assert_eq!(current_sample(&state).await, cached);
    }
}
