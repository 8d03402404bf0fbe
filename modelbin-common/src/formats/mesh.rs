//! Mesh descriptor patch block
//!
//! Mesh descriptors are opaque templates, except for a 16-byte block of
//! geometry counts patched into every LOD copy at a fixed sub-offset.
//!
//! # Layout (relative to the descriptor start)
//! ```text
//! 0x27: index_count u32
//! 0x2B: triangle_count u32
//! 0x2F: vertices_per_triangle f32
//! 0x33: vertex_count u32
//! ```

/// Number of mesh LOD descriptors in a container
pub const MESH_LOD_COUNT: usize = 6;

/// Default sub-offset of the counts block inside a mesh descriptor
pub const MESH_COUNTS_OFFSET: u64 = 0x27;

/// Geometry counts broadcast into every mesh descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct MeshCounts {
    pub index_count: u32,
    pub triangle_count: u32,
    pub vertices_per_triangle: f32,
    pub vertex_count: u32,
}

impl MeshCounts {
    pub const SIZE: usize = 16;

    /// Derive counts from the index and vertex totals.
    ///
    /// The ratio falls back to 1.0 for meshes without triangles.
    pub fn new(index_count: u32, vertex_count: u32) -> Self {
        let triangle_count = index_count / 3;
        let vertices_per_triangle = if triangle_count > 0 {
            vertex_count as f32 / triangle_count as f32
        } else {
            1.0
        };
        Self {
            index_count,
            triangle_count,
            vertices_per_triangle,
            vertex_count,
        }
    }

    /// Write counts to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.triangle_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.vertices_per_triangle.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes
    }

    /// Read counts from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            index_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            triangle_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            vertices_per_triangle: f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            vertex_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }
}
