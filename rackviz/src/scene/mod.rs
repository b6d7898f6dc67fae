//! Scene graph: an arena of nodes with transforms and optional drawables.
//!
//! Nodes are owned by the [`Scene`] and addressed through [`NodeId`] handles.
//! Children inherit their parent's transform; the renderer walks the tree from
//! the root and composes world matrices on the way down.

pub mod builder;
pub mod color;
pub mod particles;

use glam::{EulerRot, Mat4, Quat, Vec3};

use color::Rgb;
use particles::ParticleCloud;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Self::default()
        }
    }

    pub fn rotated(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vec3::new(x, y, z);
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let q = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, q, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
}

impl Material {
    pub fn solid(hex: u32) -> Self {
        Self {
            color: Rgb::from_hex(hex),
            opacity: 1.0,
        }
    }

    pub fn translucent(hex: u32, opacity: f32) -> Self {
        Self {
            color: Rgb::from_hex(hex),
            opacity,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Shape {
    /// Axis-aligned box centered on the origin.
    Cuboid { size: Vec3 },
    /// Upright cylinder centered on the origin.
    Cylinder {
        radius: f32,
        height: f32,
        segments: u32,
        open_ended: bool,
    },
    /// Flat disc in the XY plane.
    Disc { radius: f32 },
    /// Rectangle in the XY plane.
    Plane { width: f32, height: f32 },
    Polyline { points: Vec<Vec3> },
    Points(ParticleCloud),
    Label { text: String },
}

#[derive(Debug, Clone)]
pub struct Drawable {
    pub shape: Shape,
    pub material: Material,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub drawable: Option<Drawable>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    root: NodeId,
    pub background: Rgb,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Rgb::from_hex(0x111111))
    }
}

impl Scene {
    pub fn new(background: Rgb) -> Self {
        let root = Node {
            name: "root".into(),
            transform: Transform::default(),
            drawable: None,
            parent: None,
            children: Vec::new(),
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            background,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn insert(&mut self, parent: NodeId, name: &str, transform: Transform, drawable: Option<Drawable>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name: name.to_string(),
            transform,
            drawable,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Add an empty grouping node under `parent`.
    pub fn add_group(&mut self, parent: NodeId, name: &str, transform: Transform) -> NodeId {
        self.insert(parent, name, transform, None)
    }

    pub fn add_drawable(
        &mut self,
        parent: NodeId,
        name: &str,
        transform: Transform,
        shape: Shape,
        material: Material,
    ) -> NodeId {
        self.insert(parent, name, transform, Some(Drawable { shape, material }))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn transform_mut(&mut self, id: NodeId) -> &mut Transform {
        &mut self.nodes[id.0].transform
    }

    pub fn material(&self, id: NodeId) -> Option<&Material> {
        self.nodes[id.0].drawable.as_ref().map(|d| &d.material)
    }

    pub fn material_mut(&mut self, id: NodeId) -> Option<&mut Material> {
        self.nodes[id.0].drawable.as_mut().map(|d| &mut d.material)
    }

    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut Shape> {
        self.nodes[id.0].drawable.as_mut().map(|d| &mut d.shape)
    }

    /// Transform from `id`'s local space to world space.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut m = self.nodes[id.0].transform.matrix();
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            m = self.nodes[p.0].transform.matrix() * m;
            cur = self.nodes[p.0].parent;
        }
        m
    }

    /// Depth-first walk over every reachable drawable, parents before children.
    pub fn visit_drawables<F: FnMut(&Drawable, &Mat4)>(&self, mut f: F) {
        let mut stack: Vec<(NodeId, Mat4)> = vec![(self.root, Mat4::IDENTITY)];
        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();
            if let Some(d) = &node.drawable {
                f(d, &world);
            }
            // reversed so siblings come out in insertion order
            for child in node.children.iter().rev() {
                stack.push((*child, world));
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }
}
