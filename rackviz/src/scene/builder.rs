//! Builds the data-center assembly once at startup and hands back the handles
//! the mapper mutates on every sample.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use glam::Vec3;
use rand::Rng;

use super::particles::ParticleCloud;
use super::{Material, NodeId, Scene, Shape, Transform};

pub const RACK_GREY: u32 = 0x333333;
pub const CASE_GREY: u32 = 0x222222;
pub const CYAN: u32 = 0x00b7eb;
pub const GREEN: u32 = 0x00ff00;
pub const ALERT_RED: u32 = 0xff3300;
pub const WHITE: u32 = 0xffffff;

/// Status light colors, left to right: healthy, busy, saturated.
pub const LIGHT_COLORS: [u32; 3] = [GREEN, CYAN, ALERT_RED];

const SERVER_BASE_Y: f32 = -2.2;
const SERVER_PITCH: f32 = 0.55;
const BAR_RING_RADIUS: f32 = 0.4;
const LINK_SEGMENTS: usize = 12;

/// Fixed counts of the assembly, read once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub server_count: usize,
    pub bar_count: usize,
    pub particle_count: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            server_count: 8,
            bar_count: 12,
            particle_count: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeKind {
    Cpu,
    Ram,
}

impl GaugeKind {
    pub fn label(self) -> &'static str {
        match self {
            GaugeKind::Cpu => "CPU",
            GaugeKind::Ram => "RAM",
        }
    }

    pub fn base_color(self) -> u32 {
        match self {
            GaugeKind::Cpu => CYAN,
            GaugeKind::Ram => GREEN,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerHandles {
    pub group: NodeId,
    pub lights: [NodeId; 3],
    pub activity: NodeId,
}

#[derive(Debug, Clone)]
pub struct GaugeHandles {
    pub kind: GaugeKind,
    pub group: NodeId,
    pub bars: Vec<NodeId>,
    pub shell: NodeId,
    pub value_label: NodeId,
}

/// Everything the mapper touches after construction.
#[derive(Debug, Clone)]
pub struct SceneHandles {
    /// Rotating parent of the rack, gauges, links and particles.
    pub assembly: NodeId,
    pub servers: Vec<ServerHandles>,
    pub cpu_gauge: GaugeHandles,
    pub ram_gauge: GaugeHandles,
    pub links: Vec<NodeId>,
    pub particles: NodeId,
    pub spotlights: [NodeId; 2],
}

/// Height of server `index` inside the rack.
pub fn server_y(index: usize) -> f32 {
    SERVER_BASE_Y + index as f32 * SERVER_PITCH
}

pub fn build_data_center<R: Rng + ?Sized>(layout: &Layout, rng: &mut R) -> (Scene, SceneHandles) {
    let mut scene = Scene::default();
    let assembly = scene.add_group(scene.root(), "assembly", Transform::default());

    scene.add_drawable(
        assembly,
        "rack",
        Transform::default(),
        Shape::Cuboid {
            size: Vec3::new(4.0, 5.0, 2.0),
        },
        Material::solid(RACK_GREY),
    );

    let servers: Vec<ServerHandles> = (0..layout.server_count)
        .map(|i| add_server(&mut scene, assembly, i))
        .collect();

    let cpu_gauge = add_gauge(
        &mut scene,
        assembly,
        GaugeKind::Cpu,
        Transform::at(0.0, 3.0, 2.0),
        layout.bar_count,
        rng,
    );
    let ram_gauge = add_gauge(
        &mut scene,
        assembly,
        GaugeKind::Ram,
        Transform::at(-2.5, 0.0, 3.0).rotated(0.0, FRAC_PI_4, 0.0),
        layout.bar_count,
        rng,
    );

    let links = add_links(&mut scene, assembly, layout.server_count);

    let particles = scene.add_drawable(
        assembly,
        "particles",
        Transform::default(),
        Shape::Points(ParticleCloud::scatter(layout.particle_count, rng)),
        Material::translucent(WHITE, 0.7),
    );

    // Spotlights sweep around the rack independently of its rotation.
    let spotlights = [
        scene.add_drawable(
            scene.root(),
            "spotlight-cyan",
            Transform::at(0.0, 10.0, 0.0),
            Shape::Disc { radius: 0.15 },
            Material::solid(CYAN),
        ),
        scene.add_drawable(
            scene.root(),
            "spotlight-green",
            Transform::at(-8.0, 5.0, 5.0),
            Shape::Disc { radius: 0.15 },
            Material::translucent(GREEN, 0.8),
        ),
    ];

    let handles = SceneHandles {
        assembly,
        servers,
        cpu_gauge,
        ram_gauge,
        links,
        particles,
        spotlights,
    };
    (scene, handles)
}

fn add_server(scene: &mut Scene, parent: NodeId, index: usize) -> ServerHandles {
    let group = scene.add_group(
        parent,
        &format!("server-{index}"),
        Transform::at(0.0, server_y(index), 0.0),
    );
    scene.add_drawable(
        group,
        "case",
        Transform::default(),
        Shape::Cuboid {
            size: Vec3::new(3.8, 0.4, 1.9),
        },
        Material::solid(CASE_GREY),
    );

    let lights_group = scene.add_group(group, "lights", Transform::default());
    let lights = [0, 1, 2].map(|j| {
        scene.add_drawable(
            lights_group,
            &format!("light-{j}"),
            Transform::at(1.7, 0.0, 0.8 - j as f32 * 0.3).rotated(0.0, FRAC_PI_2, 0.0),
            Shape::Disc { radius: 0.05 },
            Material::solid(LIGHT_COLORS[j]),
        )
    });

    let activity = scene.add_drawable(
        group,
        "activity",
        Transform::at(0.0, 0.0, 1.0).rotated(FRAC_PI_2, 0.0, 0.0),
        Shape::Plane {
            width: 1.6,
            height: 0.2,
        },
        Material::translucent(CYAN, 0.7),
    );

    ServerHandles {
        group,
        lights,
        activity,
    }
}

fn add_gauge<R: Rng + ?Sized>(
    scene: &mut Scene,
    parent: NodeId,
    kind: GaugeKind,
    placement: Transform,
    bar_count: usize,
    rng: &mut R,
) -> GaugeHandles {
    let color = kind.base_color();
    let group = scene.add_group(parent, &format!("gauge-{}", kind.label()), placement);

    scene.add_drawable(
        group,
        "base",
        Transform::default(),
        Shape::Cylinder {
            radius: 0.8,
            height: 0.1,
            segments: 32,
            open_ended: false,
        },
        Material::solid(RACK_GREY),
    );

    let shell = scene.add_drawable(
        group,
        "shell",
        Transform::at(0.0, 1.0, 0.0),
        Shape::Cylinder {
            radius: 0.6,
            height: 2.0,
            segments: 32,
            open_ended: true,
        },
        Material::translucent(color, 0.15),
    );

    let bars_group = scene.add_group(group, "bars", Transform::at(0.0, 1.0, 0.0));
    let bars = (0..bar_count)
        .map(|i| {
            let angle = i as f32 / bar_count as f32 * TAU;
            let mut t = Transform::at(angle.sin() * BAR_RING_RADIUS, 0.5, angle.cos() * BAR_RING_RADIUS);
            t.scale.y = 0.2 + rng.gen::<f32>() * 0.8;
            scene.add_drawable(
                bars_group,
                &format!("bar-{i}"),
                t,
                Shape::Cuboid {
                    size: Vec3::new(0.1, 1.0, 0.1),
                },
                Material::translucent(color, 0.7),
            )
        })
        .collect();

    scene.add_drawable(
        group,
        "label",
        Transform::at(-0.2, 2.2, 0.0),
        Shape::Label {
            text: kind.label().to_string(),
        },
        Material::solid(color),
    );
    let value_label = scene.add_drawable(
        group,
        "value",
        Transform::at(-0.1, 0.2, 0.0),
        Shape::Label { text: "0%".into() },
        Material::solid(WHITE),
    );

    GaugeHandles {
        kind,
        group,
        bars,
        shell,
        value_label,
    }
}

/// Points of a quadratic Bezier from `a` to `c` pulled toward `b`.
pub fn bezier_points(a: Vec3, b: Vec3, c: Vec3, segments: usize) -> Vec<Vec3> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|s| {
            let t = s as f32 / segments as f32;
            let u = 1.0 - t;
            a * (u * u) + b * (2.0 * u * t) + c * (t * t)
        })
        .collect()
}

fn add_links(scene: &mut Scene, parent: NodeId, server_count: usize) -> Vec<NodeId> {
    let group = scene.add_group(parent, "links", Transform::default());
    (0..server_count.saturating_sub(1))
        .map(|i| {
            let (y1, y2) = (server_y(i), server_y(i + 1));
            let a = Vec3::new(-1.0, y1, 0.0);
            let b = Vec3::new(-1.5, (y1 + y2) / 2.0, 0.5);
            let c = Vec3::new(-1.0, y2, 0.0);
            scene.add_drawable(
                group,
                &format!("link-{i}"),
                Transform::default(),
                Shape::Polyline {
                    points: bezier_points(a, b, c, LINK_SEGMENTS),
                },
                Material::translucent(CYAN, 0.5),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build() -> (Scene, SceneHandles) {
        let mut rng = StdRng::seed_from_u64(42);
        build_data_center(&Layout::default(), &mut rng)
    }

    #[test]
    fn counts_follow_layout() {
        let (scene, h) = build();
        assert_eq!(h.servers.len(), 8);
        assert_eq!(h.links.len(), 7);
        assert_eq!(h.cpu_gauge.bars.len(), 12);
        assert_eq!(h.ram_gauge.bars.len(), 12);
        match &scene.node(h.particles).drawable.as_ref().unwrap().shape {
            Shape::Points(cloud) => assert_eq!(cloud.len(), 300),
            other => panic!("particles node holds {other:?}"),
        }
    }

    #[test]
    fn servers_stack_bottom_to_top() {
        let (scene, h) = build();
        for (i, s) in h.servers.iter().enumerate() {
            let y = scene.node(s.group).transform.position.y;
            assert!((y - server_y(i)).abs() < 1e-6);
        }
        assert!((server_y(7) - 1.65).abs() < 1e-5);
    }

    #[test]
    fn initial_bar_heights_are_in_range() {
        let (scene, h) = build();
        for bar in &h.cpu_gauge.bars {
            let sy = scene.node(*bar).transform.scale.y;
            assert!((0.2..=1.0).contains(&sy), "{sy}");
        }
    }

    #[test]
    fn gauges_are_placed_and_labelled() {
        let (scene, h) = build();
        let cpu = scene.node(h.cpu_gauge.group);
        assert_eq!(cpu.transform.position, Vec3::new(0.0, 3.0, 2.0));
        let ram = scene.node(h.ram_gauge.group);
        assert!((ram.transform.rotation.y - FRAC_PI_4).abs() < 1e-6);
        assert!(scene.find("gauge-CPU").is_some());
        assert!(scene.find("gauge-RAM").is_some());
    }

    #[test]
    fn bezier_hits_endpoints_and_bends_toward_control() {
        let a = Vec3::new(-1.0, 0.0, 0.0);
        let b = Vec3::new(-1.5, 0.5, 0.5);
        let c = Vec3::new(-1.0, 1.0, 0.0);
        let pts = bezier_points(a, b, c, 4);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], a);
        assert_eq!(pts[4], c);
        assert!(pts[2].x < -1.0 && pts[2].z > 0.0);
    }

    #[test]
    fn single_server_has_no_links() {
        let mut rng = StdRng::seed_from_u64(0);
        let layout = Layout {
            server_count: 1,
            ..Layout::default()
        };
        let (_, h) = build_data_center(&layout, &mut rng);
        assert!(h.links.is_empty());
    }
}
