//! Scene canvas: projects the scene graph through the camera and draws it as a
//! Braille wireframe. Far primitives are drawn first so near ones win a cell.

use glam::{Mat4, Vec3};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::canvas::{Canvas, Line as CanvasLine, Points},
};

use crate::scene::color::Rgb;
use crate::scene::{Drawable, Scene, Shape};
use crate::viewport::{Camera, Viewport};

const RING_SEGMENTS: u32 = 16;
const DISC_SEGMENTS: u32 = 8;

/// One screen-space drawing command, in canvas coordinates ([-1, 1] on both axes).
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Color,
        depth: f32,
    },
    Point {
        at: (f64, f64),
        color: Color,
        depth: f32,
    },
    Text {
        at: (f64, f64),
        text: String,
        color: Color,
        depth: f32,
    },
}

impl Primitive {
    fn depth(&self) -> f32 {
        match self {
            Primitive::Line { depth, .. }
            | Primitive::Point { depth, .. }
            | Primitive::Text { depth, .. } => *depth,
        }
    }
}

struct Projector<'a> {
    camera: &'a Camera,
    view_projection: Mat4,
    background: Rgb,
    out: Vec<Primitive>,
}

impl Projector<'_> {
    fn line(&mut self, world: &Mat4, a: Vec3, b: Vec3, color: Color) {
        let pa = self.camera.project(&self.view_projection, world.transform_point3(a));
        let pb = self.camera.project(&self.view_projection, world.transform_point3(b));
        if let (Some(pa), Some(pb)) = (pa, pb) {
            self.out.push(Primitive::Line {
                from: (pa.x, pa.y),
                to: (pb.x, pb.y),
                color,
                depth: (pa.depth + pb.depth) / 2.0,
            });
        }
    }

    fn loop_through(&mut self, world: &Mat4, pts: &[Vec3], color: Color) {
        for (i, a) in pts.iter().enumerate() {
            let b = pts[(i + 1) % pts.len()];
            self.line(world, *a, b, color);
        }
    }

    fn point(&mut self, world: &Mat4, p: Vec3, color: Color) {
        if let Some(pp) = self.camera.project(&self.view_projection, world.transform_point3(p)) {
            self.out.push(Primitive::Point {
                at: (pp.x, pp.y),
                color,
                depth: pp.depth,
            });
        }
    }

    fn drawable(&mut self, d: &Drawable, world: &Mat4) {
        let color = d.material.color.over(self.background, d.material.opacity).to_color();
        match &d.shape {
            Shape::Cuboid { size } => {
                let h = *size / 2.0;
                let corner = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);
                let bottom = [
                    corner(-1.0, -1.0, -1.0),
                    corner(1.0, -1.0, -1.0),
                    corner(1.0, -1.0, 1.0),
                    corner(-1.0, -1.0, 1.0),
                ];
                let top = bottom.map(|c| Vec3::new(c.x, h.y, c.z));
                self.loop_through(world, &bottom, color);
                self.loop_through(world, &top, color);
                for (b, t) in bottom.iter().zip(top.iter()) {
                    self.line(world, *b, *t, color);
                }
            }
            Shape::Cylinder {
                radius,
                height,
                segments,
                ..
            } => {
                let n = (*segments).clamp(3, RING_SEGMENTS);
                let ring = |y: f32| -> Vec<Vec3> {
                    (0..n)
                        .map(|i| {
                            let a = i as f32 / n as f32 * std::f32::consts::TAU;
                            Vec3::new(a.sin() * radius, y, a.cos() * radius)
                        })
                        .collect()
                };
                let lower = ring(-height / 2.0);
                let upper = ring(height / 2.0);
                self.loop_through(world, &lower, color);
                self.loop_through(world, &upper, color);
                for k in (0..n as usize).step_by((n as usize / 4).max(1)) {
                    self.line(world, lower[k], upper[k], color);
                }
            }
            Shape::Disc { radius } => {
                let rim: Vec<Vec3> = (0..DISC_SEGMENTS)
                    .map(|i| {
                        let a = i as f32 / DISC_SEGMENTS as f32 * std::f32::consts::TAU;
                        Vec3::new(a.cos() * radius, a.sin() * radius, 0.0)
                    })
                    .collect();
                self.loop_through(world, &rim, color);
                self.point(world, Vec3::ZERO, color);
            }
            Shape::Plane { width, height } => {
                let (w, h) = (width / 2.0, height / 2.0);
                let rect = [
                    Vec3::new(-w, -h, 0.0),
                    Vec3::new(w, -h, 0.0),
                    Vec3::new(w, h, 0.0),
                    Vec3::new(-w, h, 0.0),
                ];
                self.loop_through(world, &rect, color);
                self.line(world, Vec3::new(-w, 0.0, 0.0), Vec3::new(w, 0.0, 0.0), color);
            }
            Shape::Polyline { points } => {
                for pair in points.windows(2) {
                    self.line(world, pair[0], pair[1], color);
                }
            }
            Shape::Points(cloud) => {
                for p in &cloud.particles {
                    let c = p.color.over(self.background, d.material.opacity).to_color();
                    self.point(world, p.position, c);
                }
            }
            Shape::Label { text } => {
                if let Some(pp) =
                    self.camera.project(&self.view_projection, world.transform_point3(Vec3::ZERO))
                {
                    self.out.push(Primitive::Text {
                        at: (pp.x, pp.y),
                        text: text.clone(),
                        color,
                        depth: pp.depth,
                    });
                }
            }
        }
    }
}

/// Flatten the scene into depth-sorted primitives, farthest first.
pub fn rasterize(scene: &Scene, camera: &Camera) -> Vec<Primitive> {
    let mut p = Projector {
        camera,
        view_projection: camera.view_projection(),
        background: scene.background,
        out: Vec::new(),
    };
    scene.visit_drawables(|d, world| p.drawable(d, world));
    let mut out = p.out;
    out.sort_by(|a, b| b.depth().total_cmp(&a.depth()));
    out
}

pub fn draw_scene(f: &mut ratatui::Frame<'_>, area: Rect, scene: &Scene, viewport: &Viewport) {
    let prims = rasterize(scene, &viewport.camera);
    let canvas = Canvas::default()
        .background_color(scene.background.to_color())
        .marker(Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            for prim in &prims {
                match prim {
                    Primitive::Line {
                        from, to, color, ..
                    } => ctx.draw(&CanvasLine {
                        x1: from.0,
                        y1: from.1,
                        x2: to.0,
                        y2: to.1,
                        color: *color,
                    }),
                    Primitive::Point { at, color, .. } => ctx.draw(&Points {
                        coords: &[*at],
                        color: *color,
                    }),
                    Primitive::Text { .. } => {}
                }
            }
            // labels go on top of the wireframe
            ctx.layer();
            for prim in &prims {
                if let Primitive::Text { at, text, color, .. } = prim {
                    ctx.print(at.0, at.1, Span::styled(text.clone(), Style::default().fg(*color)));
                }
            }
        });
    f.render_widget(canvas, area);
}
