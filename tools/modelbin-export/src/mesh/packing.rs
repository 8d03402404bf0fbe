//! Buffer assembly for resolved meshes
//!
//! Produces the three payloads stored in the container:
//! - positions: X, Y, Z quantized against a symmetric range + normal X
//! - normals/UVs: normal Y, Z + UV pair replicated across the UV channels
//! - indices: triangle list, fan-triangulated from the faces

use glam::DVec3;

use super::types::ResolvedMesh;
use crate::bounds::ModelBounds;
use modelbin_common::{
    normalize_or_up, pack_index_i32, pack_normal_snorm16, pack_uv_unorm16, quantize_position,
    write_swapped16, INDEX_STRIDE, NORMAL_UV_STRIDE, POSITION_STRIDE, UV_EXTRA_CHANNELS,
};

/// Headroom applied to the session extent when deriving the quantization range
pub const SESSION_RANGE_PADDING: f64 = 1.10;

/// Range used when there is nothing to measure
pub const FALLBACK_POSITION_RANGE: f64 = 2.0;

/// Packed payloads for one mesh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuantizedMesh {
    pub vertex_count: u32,
    /// Source faces that made it into the index buffer
    pub face_count: u32,
    /// Indices in the triangle list (3 per triangle)
    pub index_count: u32,
    pub positions: Vec<u8>,
    pub normals_uvs: Vec<u8>,
    pub indices: Vec<u8>,
}

impl QuantizedMesh {
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

/// Pick the symmetric quantization range `R`.
///
/// Session bounds win (largest extent plus headroom), then a caller-supplied
/// range, then the mesh's own extent over all coordinates.
pub fn position_range(
    session: Option<&ModelBounds>,
    supplied: Option<f64>,
    mesh: &ResolvedMesh,
) -> f64 {
    if let Some(bounds) = session {
        return bounds.max_extent() * SESSION_RANGE_PADDING;
    }
    if let Some(range) = supplied {
        return range;
    }

    let mut coords = mesh.vertices.iter().flat_map(|v| v.position);
    let Some(first) = coords.next() else {
        return FALLBACK_POSITION_RANGE;
    };
    let (min, max) = coords.fold((first, first), |(min, max), c| (min.min(c), max.max(c)));
    max - min
}

/// Quantize a resolved mesh against range `range`.
pub fn quantize_mesh(mesh: &ResolvedMesh, range: f64) -> QuantizedMesh {
    let positions = pack_positions(mesh, range);
    let normals_uvs = pack_normals_uvs(mesh);
    let (indices, face_count) = pack_indices(&mesh.faces);
    let index_count = (indices.len() / INDEX_STRIDE) as u32;

    tracing::info!(
        "Quantized {} vertices (range {:.4}), {} indices",
        mesh.vertices.len(),
        range,
        index_count
    );

    QuantizedMesh {
        vertex_count: mesh.vertices.len() as u32,
        face_count,
        index_count,
        positions,
        normals_uvs,
        indices,
    }
}

fn pack_positions(mesh: &ResolvedMesh, range: f64) -> Vec<u8> {
    let mut out = Vec::with_capacity(mesh.vertices.len() * POSITION_STRIDE);
    for vertex in &mesh.vertices {
        for coord in vertex.position {
            write_swapped16(&mut out, quantize_position(coord, range) as u16);
        }
        write_swapped16(&mut out, pack_normal_snorm16(vertex.normal_x) as u16);
    }
    out
}

fn pack_normals_uvs(mesh: &ResolvedMesh) -> Vec<u8> {
    let (uv_min, uv_max) = uv_bounds(&mesh.uvs);
    let mut out = Vec::with_capacity(mesh.normals.len() * NORMAL_UV_STRIDE);

    for (normal, uv) in mesh.normals.iter().zip(&mesh.uvs) {
        let normal = normalize_or_up(DVec3::from_array(*normal));
        write_swapped16(&mut out, pack_normal_snorm16(normal.y) as u16);
        write_swapped16(&mut out, pack_normal_snorm16(normal.z) as u16);

        let u = pack_uv_unorm16(uv[0], uv_min[0], uv_max[0]);
        let v = pack_uv_unorm16(uv[1], uv_min[1], uv_max[1]);
        for _ in 0..=UV_EXTRA_CHANNELS {
            write_swapped16(&mut out, u);
            write_swapped16(&mut out, v);
        }
    }
    out
}

/// Per-component UV min and max; `[0, 0]` twice when there are no UVs.
fn uv_bounds(uvs: &[[f64; 2]]) -> ([f64; 2], [f64; 2]) {
    let Some(&first) = uvs.first() else {
        return ([0.0; 2], [0.0; 2]);
    };
    uvs.iter().fold((first, first), |(min, max), uv| {
        (
            [min[0].min(uv[0]), min[1].min(uv[1])],
            [max[0].max(uv[0]), max[1].max(uv[1])],
        )
    })
}

/// Fan-triangulate every face into a little-endian i32 triangle list.
///
/// Returns the packed indices and the number of faces emitted.
fn pack_indices(faces: &[Vec<u32>]) -> (Vec<u8>, u32) {
    let mut out = Vec::new();
    let mut emitted = 0u32;

    for (i, face) in faces.iter().enumerate() {
        if face.len() < 3 {
            tracing::warn!("Face {} has {} vertices, skipping", i, face.len());
            continue;
        }
        for triangle in triangulate(face) {
            for index in triangle {
                out.extend_from_slice(&pack_index_i32(index));
            }
        }
        emitted += 1;
    }

    (out, emitted)
}

/// Fan triangulation: `(v0, vi, vi+1)` for each `i`.
pub fn triangulate(face: &[u32]) -> impl Iterator<Item = [u32; 3]> + '_ {
    (1..face.len().saturating_sub(1)).map(move |i| [face[0], face[i], face[i + 1]])
}
