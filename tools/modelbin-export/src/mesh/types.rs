//! Types shared by the mesh pipeline stages

use std::collections::BTreeSet;

use hashbrown::HashMap;

use crate::bounds::ModelBounds;

/// Name of the partition that collects faces declared before any `o` / `g`
pub const DEFAULT_PARTITION: &str = "default";

/// `(face index, position index)` -> attribute index, all 0-based.
///
/// Keyed per face corner because OBJ lets the same position carry different
/// normals and UVs in different faces.
pub type AttributeMap = HashMap<(usize, u32), u32>;

/// Named set of face indices (an OBJ object or group).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    pub faces: Vec<usize>,
}

impl Partition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }
}

/// Multi-indexed mesh as read from OBJ text.
///
/// Positions, normals and UVs are independent streams. Faces index positions
/// only; the per-corner normal and UV indices live in the attribute maps.
#[derive(Debug, Clone, Default)]
pub struct ParsedMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    /// V already flipped (`1 - v`)
    pub uvs: Vec<[f64; 2]>,
    /// 0-based position indices per face
    pub faces: Vec<Vec<u32>>,
    pub normal_map: AttributeMap,
    pub uv_map: AttributeMap,
    /// Objects in declaration order; the first is always `default`
    pub objects: Vec<Partition>,
    /// Groups in declaration order; the first is always `default`
    pub groups: Vec<Partition>,
    /// Group name -> owning object name
    pub group_to_object: HashMap<String, String>,
}

impl ParsedMesh {
    /// Bounds over every parsed position.
    pub fn bounds(&self) -> Option<ModelBounds> {
        ModelBounds::from_points(self.positions.iter().copied())
    }

    pub fn object(&self, name: &str) -> Option<&Partition> {
        self.objects.iter().find(|p| p.name == name)
    }

    pub fn group(&self, name: &str) -> Option<&Partition> {
        self.groups.iter().find(|p| p.name == name)
    }

    /// Groups attached to an object, in declaration order.
    pub fn groups_of<'a>(&'a self, object: &'a str) -> impl Iterator<Item = &'a Partition> + 'a {
        self.groups.iter().filter(move |g| {
            self.group_to_object
                .get(&g.name)
                .is_some_and(|owner| owner == object)
        })
    }
}

/// Set of face indices chosen for export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<usize>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend<I: IntoIterator<Item = usize>>(&mut self, faces: I) {
        self.0.extend(faces);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Face indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Shared-index vertex.
///
/// `normal_x` mirrors the X component of the vertex normal; it is stored next
/// to the position in the vertex record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f64; 3],
    pub normal_x: f64,
}

/// Mesh with exactly one normal and one UV per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedMesh {
    pub vertices: Vec<Vertex>,
    pub normals: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
    /// Indices into `vertices`
    pub faces: Vec<Vec<u32>>,
    /// Center already subtracted from the positions, if any
    pub centered_on: Option<[f64; 3]>,
}

impl ResolvedMesh {
    pub fn bounds(&self) -> Option<ModelBounds> {
        ModelBounds::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Copy each normal's X component into its vertex record.
    pub(crate) fn sync_normal_x(&mut self) {
        for (vertex, normal) in self.vertices.iter_mut().zip(&self.normals) {
            vertex.normal_x = normal[0];
        }
    }
}
