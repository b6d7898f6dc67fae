//! Visual mapper: turns the latest {cpu, ram} sample into node attributes.
//!
//! Split in two steps:
//! - [`apply_levels`] sets absolute attributes (color, opacity, scale, label text)
//!   and is a pure function of the sample and the wall-clock time, so calling it
//!   twice with the same inputs leaves the scene unchanged.
//! - [`advance`] integrates the motion that accumulates per call: the slow turn
//!   of the assembly and the falling particles.

use rand::Rng;

use crate::scene::builder::{GaugeHandles, GaugeKind, SceneHandles};
use crate::scene::color::Rgb;
use crate::scene::{Scene, Shape};
use crate::types::{clamp_pct, Sample};

/// Opacity of a lit / unlit status light.
pub const LIGHT_FULL: f32 = 1.0;
pub const LIGHT_DIM: f32 = 0.3;
/// Load above which each of the three status lights turns on.
pub const LIGHT_THRESHOLDS: [f32; 3] = [30.0, 60.0, 85.0];
/// Load subtracted per rack slot when spreading the CPU across servers.
pub const LOAD_STEP_PER_SERVER: f32 = 5.0;
/// Radians added to the assembly's Y rotation on every sample.
pub const ROTATION_STEP: f32 = 0.002;
const SPOT_RADIUS: f32 = 8.0;

/// Hue range a value sweeps as it goes 0 → 100: `start` down to `start - span`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueRange {
    pub start: f32,
    pub span: f32,
}

impl HueRange {
    pub fn at(&self, value: f32) -> f32 {
        self.start - clamp_pct(value) / 100.0 * self.span
    }

    pub fn contains(&self, hue: f32) -> bool {
        let lo = self.start - self.span;
        hue >= lo - 1e-6 && hue <= self.start + 1e-6
    }
}

/// Blue at idle, red when saturated.
pub const LOAD_HUES: HueRange = HueRange {
    start: 0.6,
    span: 0.6,
};
/// Green at idle, red when saturated.
pub const RAM_HUES: HueRange = HueRange {
    start: 0.3,
    span: 0.3,
};

pub fn gauge_hues(kind: GaugeKind) -> HueRange {
    match kind {
        GaugeKind::Cpu => LOAD_HUES,
        GaugeKind::Ram => RAM_HUES,
    }
}

/// Share of the CPU attributed to the server in rack slot `index`.
pub fn server_load(cpu: f32, index: usize) -> f32 {
    clamp_pct(cpu - LOAD_STEP_PER_SERVER * index as f32)
}

pub fn light_levels(load: f32) -> [f32; 3] {
    LIGHT_THRESHOLDS.map(|t| if load > t { LIGHT_FULL } else { LIGHT_DIM })
}

/// Horizontal scale of a server's activity bar.
pub fn activity_scale(load: f32) -> f32 {
    0.1 + clamp_pct(load) / 100.0 * 0.9
}

/// Y-scale of gauge bar `index`: a travelling wave on top of the value.
pub fn bar_height(index: usize, value: f32, now_ms: f64) -> f32 {
    let wave = (now_ms * 0.002 + index as f64 * 0.5).sin() as f32;
    0.2 + wave * 0.3 + clamp_pct(value) / 100.0 * 0.8
}

pub fn bar_opacity(value: f32) -> f32 {
    0.4 + clamp_pct(value) / 100.0 * 0.6
}

/// Shell opacity pulses harder the higher the value.
pub fn shell_opacity(value: f32, now_ms: f64) -> f32 {
    let intensity = clamp_pct(value) / 100.0;
    let pulse = 0.1 + 0.1 * (now_ms * 0.003).sin() as f32 * intensity;
    0.1 + pulse
}

pub fn link_hue(activity: f32) -> f32 {
    LOAD_HUES.at(activity)
}

pub fn link_opacity(index: usize, activity: f32, now_ms: f64) -> f32 {
    let base = 0.3 + clamp_pct(activity) / 100.0 * 0.7;
    let flicker = (now_ms * 0.005 + index as f64 * 0.2).sin() as f32;
    base * (0.7 + 0.3 * flicker)
}

/// Horizontal positions of the two spotlights at `now_ms`.
pub fn spotlight_positions(now_ms: f64) -> [(f32, f32); 2] {
    let s = now_ms * 0.001;
    let orbit = |phase: f64| {
        (
            (phase.sin() * SPOT_RADIUS as f64) as f32,
            (phase.cos() * SPOT_RADIUS as f64) as f32,
        )
    };
    [orbit(s * 0.3), orbit(s * 0.4 + 2.0)]
}

pub fn format_value(value: f32) -> String {
    format!("{value:.1}%")
}

fn hsl(hue: f32) -> Rgb {
    Rgb::from_hsl(hue, 1.0, 0.5)
}

fn apply_gauge(scene: &mut Scene, gauge: &GaugeHandles, value: f32, now_ms: f64) {
    let hues = gauge_hues(gauge.kind);
    let color = hsl(hues.at(value));

    for (i, bar) in gauge.bars.iter().enumerate() {
        scene.transform_mut(*bar).scale.y = bar_height(i, value, now_ms);
        if let Some(m) = scene.material_mut(*bar) {
            m.color = color;
            m.opacity = bar_opacity(value);
        }
    }

    if let Some(m) = scene.material_mut(gauge.shell) {
        m.color = color;
        m.opacity = shell_opacity(value, now_ms);
    }

    if let Some(Shape::Label { text }) = scene.shape_mut(gauge.value_label) {
        *text = format_value(clamp_pct(value));
    }
}

/// Set every absolute attribute from `sample` at `now_ms`.
pub fn apply_levels(scene: &mut Scene, handles: &SceneHandles, sample: &Sample, now_ms: f64) {
    let cpu = sample.cpu_pct();
    let ram = sample.ram_pct();
    let activity = sample.activity();

    apply_gauge(scene, &handles.cpu_gauge, cpu, now_ms);
    apply_gauge(scene, &handles.ram_gauge, ram, now_ms);

    for (i, server) in handles.servers.iter().enumerate() {
        let load = server_load(cpu, i);
        for (light, level) in server.lights.iter().zip(light_levels(load)) {
            if let Some(m) = scene.material_mut(*light) {
                m.opacity = level;
            }
        }
        scene.transform_mut(server.activity).scale.x = activity_scale(load);
        if let Some(m) = scene.material_mut(server.activity) {
            m.color = hsl(LOAD_HUES.at(load));
        }
    }

    let link_color = hsl(link_hue(activity));
    for (i, link) in handles.links.iter().enumerate() {
        if let Some(m) = scene.material_mut(*link) {
            m.color = link_color;
            m.opacity = link_opacity(i, activity, now_ms);
        }
    }

    for (spot, (x, z)) in handles.spotlights.iter().zip(spotlight_positions(now_ms)) {
        let t = scene.transform_mut(*spot);
        t.position.x = x;
        t.position.z = z;
    }
}

/// Integrate per-call motion: rotation step and particle fall/recycle.
/// Returns the number of particles recycled.
pub fn advance<R: Rng + ?Sized>(
    scene: &mut Scene,
    handles: &SceneHandles,
    sample: &Sample,
    rng: &mut R,
) -> usize {
    scene.transform_mut(handles.assembly).rotation.y += ROTATION_STEP;
    match scene.shape_mut(handles.particles) {
        Some(Shape::Points(cloud)) => cloud.advance(sample.activity(), rng),
        _ => 0,
    }
}

/// Full update for one poll tick.
pub fn apply<R: Rng + ?Sized>(
    scene: &mut Scene,
    handles: &SceneHandles,
    sample: &Sample,
    now_ms: f64,
    rng: &mut R,
) -> usize {
    apply_levels(scene, handles, sample, now_ms);
    advance(scene, handles, sample, rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_load_examples() {
        assert_eq!(server_load(50.0, 0), 50.0);
        assert_eq!(server_load(50.0, 3), 35.0);
        assert_eq!(server_load(20.0, 7), 0.0);
        assert_eq!(server_load(130.0, 1), 100.0);
    }

    #[test]
    fn light_threshold_boundaries() {
        let dim = LIGHT_DIM;
        let full = LIGHT_FULL;
        assert_eq!(light_levels(30.0), [dim, dim, dim]);
        assert_eq!(light_levels(30.01), [full, dim, dim]);
        assert_eq!(light_levels(29.99), [dim, dim, dim]);
        assert_eq!(light_levels(60.0), [full, dim, dim]);
        assert_eq!(light_levels(60.01), [full, full, dim]);
        assert_eq!(light_levels(59.99), [full, dim, dim]);
        assert_eq!(light_levels(85.0), [full, full, dim]);
        assert_eq!(light_levels(85.01), [full, full, full]);
        assert_eq!(light_levels(84.99), [full, full, dim]);
    }

    #[test]
    fn hue_ranges_run_from_cool_to_red() {
        assert!((LOAD_HUES.at(0.0) - 0.6).abs() < 1e-6);
        assert!(LOAD_HUES.at(100.0).abs() < 1e-6);
        assert!((RAM_HUES.at(0.0) - 0.3).abs() < 1e-6);
        assert!(RAM_HUES.at(250.0).abs() < 1e-6);
    }

    #[test]
    fn activity_scale_spans_tenth_to_full() {
        assert!((activity_scale(0.0) - 0.1).abs() < 1e-6);
        assert!((activity_scale(100.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bar_height_wave_has_per_bar_phase() {
        let t = 1_000.0;
        assert_ne!(bar_height(0, 50.0, t), bar_height(1, 50.0, t));
        // value term dominates the envelope
        for i in 0..12 {
            let h = bar_height(i, 100.0, t);
            assert!((0.7..=1.3).contains(&h), "{h}");
        }
    }

    #[test]
    fn shell_is_steady_at_zero_value() {
        assert!((shell_opacity(0.0, 0.0) - 0.2).abs() < 1e-6);
        assert!((shell_opacity(0.0, 12345.0) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn spotlights_orbit_at_fixed_radius() {
        for t in [0.0, 1_234.0, 98_765.0] {
            for (x, z) in spotlight_positions(t) {
                assert!(((x * x + z * z).sqrt() - 8.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn value_text_has_one_decimal() {
        assert_eq!(format_value(42.0), "42.0%");
        assert_eq!(format_value(7.26), "7.3%");
    }
}
