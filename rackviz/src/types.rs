//! Types that mirror the agent's JSON schema, plus the sample the mapper consumes.

use serde::Deserialize;

/// Body of `GET /metrics` (and of a `get_metrics` reply on the WebSocket).
/// Extra fields such as `timestamp` are ignored.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct MetricsPayload {
    pub cpu: f32,
    pub ram: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    Live,
    Synthetic,
}

/// One {cpu, ram} pair per poll tick, real or synthetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub cpu: f32,
    pub ram: f32,
    pub source: SampleSource,
}

impl Sample {
    pub fn live(p: MetricsPayload) -> Self {
        Self {
            cpu: p.cpu,
            ram: p.ram,
            source: SampleSource::Live,
        }
    }

    /// Stand-in signal used when the endpoint can't be reached.
    /// CPU swings 0..60%, RAM 10..70%, both continuous in `now_ms`.
    pub fn synthetic(now_ms: f64) -> Self {
        Self {
            cpu: (30.0 + (now_ms * 0.001).sin() * 30.0) as f32,
            ram: (40.0 + (now_ms * 0.0005).sin() * 30.0) as f32,
            source: SampleSource::Synthetic,
        }
    }

    pub fn cpu_pct(&self) -> f32 {
        clamp_pct(self.cpu)
    }

    pub fn ram_pct(&self) -> f32 {
        clamp_pct(self.ram)
    }

    /// Mean of the clamped metrics; drives links and particles.
    pub fn activity(&self) -> f32 {
        (self.cpu_pct() + self.ram_pct()) / 2.0
    }
}

/// Clamp a percentage-like value into 0..=100 (NaN maps to 0).
pub fn clamp_pct(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}
