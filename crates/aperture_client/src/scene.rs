use std::collections::BTreeMap;
use std::fmt;

use aperture_shared::error::GeometryError;
use aperture_shared::portal::Portal;
use aperture_shared::quad::{MeshVertex, Quad, QUAD_LINE_ELEMENTS, QUAD_STRIP_ELEMENTS};
use glam::{Mat4, Vec3};
use tracing::{info, warn};

const PORTAL_NODE_PREFIX: &str = "Portal_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    TriangleStrip,
    Lines,
}

impl Primitive {
    pub fn is_lines(self) -> bool {
        matches!(self, Self::Lines)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawElements {
    pub primitive: Primitive,
    pub indices: Vec<u16>,
}

impl DrawElements {
    pub fn new(primitive: Primitive, indices: impl Into<Vec<u16>>) -> Self {
        Self {
            primitive,
            indices: indices.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub elements: Vec<DrawElements>,
}

impl Geometry {
    pub fn new(name: impl Into<String>, vertices: Vec<MeshVertex>, elements: Vec<DrawElements>) -> Self {
        Self {
            name: name.into(),
            vertices,
            elements,
        }
    }

    /// Surface strip plus wireframe for a quad.
    pub fn from_quad(name: impl Into<String>, quad: &Quad) -> Self {
        Self::new(
            name,
            quad.mesh().vertices().to_vec(),
            vec![
                DrawElements::new(Primitive::TriangleStrip, QUAD_STRIP_ELEMENTS),
                DrawElements::new(Primitive::Lines, QUAD_LINE_ELEMENTS),
            ],
        )
    }

    pub fn is_drawable(&self) -> bool {
        !self.vertices.is_empty() && self.elements.iter().any(|e| !e.indices.is_empty())
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Node of the scene graph handed over by the asset importer.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub transform: Mat4,
    pub geometry: Vec<Geometry>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Mat4::IDENTITY,
            geometry: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry.push(geometry);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn geometry_count(&self) -> usize {
        self.geometry.len()
            + self
                .children
                .iter()
                .map(SceneNode::geometry_count)
                .sum::<usize>()
    }

    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpAxis {
    X,
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// Rotation that brings an asset authored with this up axis into the
    /// Y-up world.
    pub fn correction(self) -> Mat4 {
        match self {
            Self::X | Self::Y => Mat4::IDENTITY,
            Self::Z => {
                Mat4::from_rotation_x((-90.0_f32).to_radians())
                    * Mat4::from_rotation_z(90.0_f32.to_radians())
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalLink {
    pub entry: u32,
    pub exit: u32,
}

/// Reads `Portal_<entry>_<exit>` off the front of a node name.
pub fn parse_portal_name(name: &str) -> Option<PortalLink> {
    let (entry, exit) = split_portal_name(name)?;
    Some(PortalLink {
        entry: entry.parse().ok()?,
        exit: exit.parse().ok()?,
    })
}

/// True for any `Portal_<digits>_<digits>` name, including indices too large
/// to parse.
pub fn is_portal_placeholder(name: &str) -> bool {
    split_portal_name(name).is_some()
}

fn split_portal_name(name: &str) -> Option<(&str, &str)> {
    let rest = name.strip_prefix(PORTAL_NODE_PREFIX)?;
    let (entry, rest) = split_leading_digits(rest)?;
    let rest = rest.strip_prefix('_')?;
    let (exit, _) = split_leading_digits(rest)?;
    Some((entry, exit))
}

fn split_leading_digits(s: &str) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (end > 0).then(|| s.split_at(end))
}

/// Quad spanned by a placeholder's unit square: local +Z is the normal, local
/// +X the in-plane axis, and the column lengths give the scale.
pub fn quad_from_transform(m: &Mat4) -> Quad {
    Quad {
        center: m.transform_point3(Vec3::ZERO),
        normal: m.transform_vector3(Vec3::Z).normalize_or_zero(),
        plane_v: m.transform_vector3(Vec3::X).normalize_or_zero(),
        scale: Vec3::new(
            m.x_axis.truncate().length(),
            m.y_axis.truncate().length(),
            m.z_axis.truncate().length(),
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SceneWarning {
    UnmatchedPortal { entry: u32, exit: u32 },
    DuplicatePortalIndex { entry: u32, node: String },
    PortalIndexOutOfRange { node: String },
    EmptyGeometry { node: String, geometry: String },
}

impl fmt::Display for SceneWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedPortal { entry, exit } => {
                write!(f, "no exit for portal {entry} (expected portal {exit})")
            }
            Self::DuplicatePortalIndex { entry, node } => {
                write!(f, "portal index {entry} defined again by node '{node}'")
            }
            Self::PortalIndexOutOfRange { node } => {
                write!(f, "portal node '{node}' has an index that does not fit in u32")
            }
            Self::EmptyGeometry { node, geometry } => {
                write!(f, "geometry '{geometry}' on node '{node}' has nothing to draw")
            }
        }
    }
}

#[derive(Debug)]
pub enum SceneError {
    Portal { node: String, source: GeometryError },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Portal { node, source } => {
                write!(f, "portal node '{node}' has invalid geometry: {source}")
            }
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Portal { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedScene {
    pub root: SceneNode,
    pub portals: Vec<Portal>,
    pub warnings: Vec<SceneWarning>,
}

struct Placeholder {
    node: String,
    exit: u32,
    quad: Quad,
}

#[derive(Default)]
struct Importer {
    placeholders: BTreeMap<u32, Placeholder>,
    warnings: Vec<SceneWarning>,
}

impl Importer {
    fn warn(&mut self, warning: SceneWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    fn import_node(&mut self, node: &SceneNode, parent: Mat4) -> Option<SceneNode> {
        let world = parent * node.transform;

        if let Some(link) = parse_portal_name(&node.name) {
            let placeholder = Placeholder {
                node: node.name.clone(),
                exit: link.exit,
                quad: quad_from_transform(&world),
            };
            if self.placeholders.insert(link.entry, placeholder).is_some() {
                self.warn(SceneWarning::DuplicatePortalIndex {
                    entry: link.entry,
                    node: node.name.clone(),
                });
            }
            return None;
        }
        if is_portal_placeholder(&node.name) {
            self.warn(SceneWarning::PortalIndexOutOfRange {
                node: node.name.clone(),
            });
            return None;
        }

        let mut imported = SceneNode::new(node.name.clone()).with_transform(node.transform);
        for geometry in &node.geometry {
            if geometry.is_drawable() {
                imported.geometry.push(geometry.clone());
            } else {
                self.warn(SceneWarning::EmptyGeometry {
                    node: node.name.clone(),
                    geometry: geometry.name.clone(),
                });
            }
        }
        for child in &node.children {
            if let Some(child) = self.import_node(child, world) {
                imported.children.push(child);
            }
        }

        (!imported.geometry.is_empty() || !imported.children.is_empty()).then_some(imported)
    }

    fn link_portals(&mut self) -> Result<Vec<Portal>, SceneError> {
        let mut portals = Vec::new();
        let mut unmatched = Vec::new();

        for (&entry, placeholder) in &self.placeholders {
            let Some(exit) = self.placeholders.get(&placeholder.exit) else {
                unmatched.push(SceneWarning::UnmatchedPortal {
                    entry,
                    exit: placeholder.exit,
                });
                continue;
            };

            let portal = Portal::link(&placeholder.quad, &exit.quad).map_err(|source| {
                SceneError::Portal {
                    node: placeholder.node.clone(),
                    source,
                }
            })?;
            portals.push(portal);
        }

        for warning in unmatched {
            self.warn(warning);
        }
        Ok(portals)
    }
}

/// Splits an imported asset into drawable scene and linked portals.
///
/// Nodes named `Portal_<entry>_<exit>` are placeholders: they draw nothing and
/// their world transform becomes the portal quad. Links resolve in ascending
/// entry order.
pub fn load_scene(asset: &SceneNode, up_axis: UpAxis) -> Result<LoadedScene, SceneError> {
    let correction = up_axis.correction();
    let mut importer = Importer::default();

    let mut root = SceneNode::new("scene").with_transform(correction);
    if let Some(imported) = importer.import_node(asset, correction) {
        root.children.push(imported);
    }

    let portals = importer.link_portals()?;
    info!(
        geometry = root.geometry_count(),
        portals = portals.len(),
        warnings = importer.warnings.len(),
        "scene loaded"
    );

    Ok(LoadedScene {
        root,
        portals,
        warnings: importer.warnings,
    })
}
