//! Background sampler: refreshes sysinfo on a fixed period and caches the
//! result, so request handlers only read the cache.

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::debug;

use crate::metrics::collect_sample;
use crate::state::AppState;

pub const SAMPLE_PERIOD: Duration = Duration::from_millis(500);

pub fn spawn_sampler(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let sample = {
                let mut sys = state.sys.lock().await;
                collect_sample(&mut sys)
            };
            debug!(cpu = sample.cpu, ram = sample.ram, "sampled");
            *state.latest.write().await = Some(sample);
        }
    })
}
