//! Geometric transforms on resolved meshes
//!
//! Each transform consumes a mesh and returns the transformed mesh. Whenever
//! normals change, the normal-X slot of every vertex is re-synced.

use anyhow::bail;
use glam::DVec3;
use std::fmt;
use std::str::FromStr;

use super::types::ResolvedMesh;
use crate::bounds::ModelBounds;

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        };
        f.write_str(name)
    }
}

impl FromStr for Axis {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            _ => bail!("Invalid axis {:?} (expected x, y or z)", s),
        }
    }
}

/// Any combination of axes, parsed from strings like `"xz"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisSet {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisSet {
    pub fn is_empty(&self) -> bool {
        !(self.x || self.y || self.z)
    }

    /// -1 on chosen axes, +1 elsewhere.
    fn signs(&self) -> DVec3 {
        let sign = |flip: bool| if flip { -1.0 } else { 1.0 };
        DVec3::new(sign(self.x), sign(self.y), sign(self.z))
    }
}

impl From<Axis> for AxisSet {
    fn from(axis: Axis) -> Self {
        Self {
            x: axis == Axis::X,
            y: axis == Axis::Y,
            z: axis == Axis::Z,
        }
    }
}

impl FromStr for AxisSet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut set = Self::default();
        for c in s.chars() {
            match c.to_ascii_lowercase() {
                'x' => set.x = true,
                'y' => set.y = true,
                'z' => set.z = true,
                _ => bail!("Invalid axis {:?} in {:?} (expected a combination of x, y, z)", c, s),
            }
        }
        Ok(set)
    }
}

/// Transforms applied after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub center: bool,
    pub flip_vertices: AxisSet,
    pub flip_normals: AxisSet,
    pub flip_faces: bool,
    pub mirror: Option<Axis>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            center: true,
            flip_vertices: AxisSet::default(),
            flip_normals: AxisSet::default(),
            flip_faces: false,
            mirror: None,
        }
    }
}

/// Apply transforms in pipeline order: center, flip vertices, flip normals,
/// flip winding, mirror.
///
/// Centering uses `bounds` when given, else the mesh's own bounds.
pub fn apply_transforms(
    mut mesh: ResolvedMesh,
    options: &TransformOptions,
    bounds: Option<&ModelBounds>,
) -> ResolvedMesh {
    if options.center {
        match bounds.copied().or_else(|| mesh.bounds()) {
            Some(bounds) => mesh = center(mesh, &bounds),
            None => tracing::warn!("Nothing to center: mesh has no vertices"),
        }
    }
    if !options.flip_vertices.is_empty() {
        mesh = flip_vertices(mesh, options.flip_vertices);
    }
    if !options.flip_normals.is_empty() {
        mesh = flip_normals(mesh, options.flip_normals);
    }
    if options.flip_faces {
        mesh = flip_face_winding(mesh);
    }
    if let Some(axis) = options.mirror {
        mesh = mirror(mesh, axis);
    }
    mesh
}

/// Translate positions so the center of `bounds` lands on the origin.
///
/// Centering against the same bounds twice moves the mesh only once.
pub fn center(mut mesh: ResolvedMesh, bounds: &ModelBounds) -> ResolvedMesh {
    let target = bounds.center();
    let applied = mesh.centered_on.map(DVec3::from_array).unwrap_or(DVec3::ZERO);
    let delta = target - applied;

    for vertex in &mut mesh.vertices {
        vertex.position = (DVec3::from_array(vertex.position) - delta).to_array();
    }
    mesh.centered_on = Some(target.to_array());

    tracing::info!("Centered on {:?}", target.to_array());
    mesh
}

/// Negate the chosen position coordinates.
///
/// An applied center is flipped with the positions, so later centering works
/// in the flipped frame.
pub fn flip_vertices(mut mesh: ResolvedMesh, axes: AxisSet) -> ResolvedMesh {
    let signs = axes.signs();
    for vertex in &mut mesh.vertices {
        vertex.position = (DVec3::from_array(vertex.position) * signs).to_array();
    }
    mesh.centered_on = mesh
        .centered_on
        .map(|applied| (DVec3::from_array(applied) * signs).to_array());
    tracing::debug!("Flipped vertices: {:?}", axes);
    mesh
}

/// Negate the chosen normal components.
pub fn flip_normals(mut mesh: ResolvedMesh, axes: AxisSet) -> ResolvedMesh {
    let signs = axes.signs();
    for normal in &mut mesh.normals {
        *normal = (DVec3::from_array(*normal) * signs).to_array();
    }
    mesh.sync_normal_x();
    tracing::debug!("Flipped normals: {:?}", axes);
    mesh
}

/// Reverse the vertex order of every face.
pub fn flip_face_winding(mut mesh: ResolvedMesh) -> ResolvedMesh {
    for face in &mut mesh.faces {
        face.reverse();
    }
    tracing::debug!("Flipped winding of {} faces", mesh.faces.len());
    mesh
}

/// Reflect across the plane orthogonal to `axis`.
///
/// Positions and normals are negated on that axis and windings reversed so
/// faces keep pointing outwards.
pub fn mirror(mesh: ResolvedMesh, axis: Axis) -> ResolvedMesh {
    let axes = AxisSet::from(axis);
    let mesh = flip_normals(flip_vertices(mesh, axes), axes);
    let mesh = flip_face_winding(mesh);
    tracing::info!("Mirrored across {} axis", axis);
    mesh
}
