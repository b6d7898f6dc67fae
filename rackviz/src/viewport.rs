//! Camera, render-surface sizing and debounced resize handling.

use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};

use crate::error::SurfaceError;

/// Where the camera sits whenever the surface is (re)built.
pub const CAMERA_HOME: Vec3 = Vec3::new(8.0, 5.0, 12.0);
pub const FOV_Y_DEG: f32 = 60.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
/// Terminal cells are roughly twice as tall as they are wide.
pub const CELL_ASPECT: f32 = 0.5;
/// Rows reserved above the canvas for the readout header.
pub const HEADER_ROWS: u16 = 1;
pub const RESIZE_QUIET: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: u16,
    pub height: u16,
}

impl Bounds {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

/// A point mapped onto the canvas: x and y in [-1, 1], depth in view space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub depth: f32,
}

impl Camera {
    pub fn looking_at(position: Vec3, target: Vec3, aspect: f32) -> Self {
        Self {
            position,
            target,
            fov_y_deg: FOV_Y_DEG,
            aspect,
            near: NEAR,
            far: FAR,
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Project a world-space point; `None` when it falls behind the near plane.
    pub fn project(&self, view_projection: &Mat4, p: Vec3) -> Option<Projected> {
        let clip = *view_projection * p.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        Some(Projected {
            x: (clip.x / clip.w) as f64,
            y: (clip.y / clip.w) as f64,
            depth: clip.w,
        })
    }
}

/// The current render surface: terminal bounds plus a camera fitted to them.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub bounds: Bounds,
    pub camera: Camera,
    /// Bumped on every successful rebuild.
    pub generation: u64,
}

impl Viewport {
    /// Build a surface for `bounds`, camera reset to its home pose facing `target`.
    pub fn build(bounds: Bounds, target: Vec3) -> Result<Self, SurfaceError> {
        let canvas_rows = bounds.height.saturating_sub(HEADER_ROWS);
        if bounds.width == 0 || canvas_rows == 0 {
            return Err(SurfaceError::Unavailable {
                width: bounds.width,
                height: bounds.height,
            });
        }
        let aspect = bounds.width as f32 * CELL_ASPECT / canvas_rows as f32;
        Ok(Self {
            bounds,
            camera: Camera::looking_at(CAMERA_HOME, target, aspect),
            generation: 0,
        })
    }

    /// Replace this surface with one sized for `bounds`. On failure the current
    /// surface is left as it was.
    pub fn rebuild(&mut self, bounds: Bounds) -> Result<(), SurfaceError> {
        let mut next = Self::build(bounds, self.camera.target)?;
        next.generation = self.generation + 1;
        *self = next;
        Ok(())
    }
}

/// Collapses bursts of resize events into one rebuild once the burst has
/// been quiet for `quiet`.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer {
    quiet: Duration,
    pending: Option<(Bounds, Instant)>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(RESIZE_QUIET)
    }
}

impl ResizeDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    /// Record a resize; any pending one is superseded and its timer restarted.
    pub fn note(&mut self, bounds: Bounds, now: Instant) {
        self.pending = Some((bounds, now + self.quiet));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The settled bounds, once the quiet period after the last event has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<Bounds> {
        match self.pending {
            Some((bounds, at)) if now >= at => {
                self.pending = None;
                Some(bounds)
            }
            _ => None,
        }
    }
}
