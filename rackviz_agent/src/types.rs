//! Wire format served on /metrics and /ws.

use serde::Serialize;

/// One reading. `cpu` and `ram` are percentages in [0, 100];
/// `timestamp` is Unix seconds.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct MetricsSample {
    pub cpu: f32,
    pub ram: f32,
    pub timestamp: f64,
}
