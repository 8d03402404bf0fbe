//! Static section directory
//!
//! Each table entry carries two absolute slots that the writer patches once
//! the section has been appended:
//! - the metadata slot receives the offset of the section's metadata blob
//! - the data slot receives `(offset, size, size)` of the section payload
//!
//! The table is ordered exactly as the entries appear in the front matter.

use super::buffer::BufferKind;
use std::fmt;

/// Sections addressable through the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Skeleton,
    Morph,
    /// Mesh descriptor for LOD 0-5
    Mesh(u8),
    Material,
    IndexBuffer,
    /// Vertex layout 0 (positions) or 1 (normals/UVs)
    VertexLayout(u8),
    /// Vertex buffer 0 (positions) or 1 (normals/UVs)
    VertexBuffer(u8),
    Model,
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skeleton => write!(f, "skeleton"),
            Self::Morph => write!(f, "morph"),
            Self::Mesh(lod) => write!(f, "mesh_lod{lod}"),
            Self::Material => write!(f, "material"),
            Self::IndexBuffer => write!(f, "index_buffer"),
            Self::VertexLayout(i) => write!(f, "vertex_layout{i}"),
            Self::VertexBuffer(i) => write!(f, "vertex_buffer{i}"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// One row of the directory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub section: SectionId,
    /// Absolute offset receiving the metadata blob offset (u32)
    pub metadata_slot: u64,
    /// Absolute offset receiving `(offset, size, size)` (3 × u32)
    pub data_slot: u64,
    /// Header written in front of the payload, for buffer sections
    pub buffer: Option<BufferKind>,
}

const fn entry(
    section: SectionId,
    metadata_slot: u64,
    data_slot: u64,
    buffer: Option<BufferKind>,
) -> DirectoryEntry {
    DirectoryEntry {
        section,
        metadata_slot,
        data_slot,
        buffer,
    }
}

/// Directory table, in front-matter order.
pub const DIRECTORY: [DirectoryEntry; 15] = [
    entry(SectionId::Skeleton, 0x1C, 0x20, None),
    entry(SectionId::Morph, 0x34, 0x38, None),
    entry(SectionId::Mesh(0), 0x4C, 0x50, None),
    entry(SectionId::Mesh(1), 0x64, 0x68, None),
    entry(SectionId::Mesh(2), 0x7C, 0x80, None),
    entry(SectionId::Mesh(3), 0x94, 0x98, None),
    entry(SectionId::Mesh(4), 0xAC, 0xB0, None),
    entry(SectionId::Mesh(5), 0xC4, 0xC8, None),
    entry(SectionId::Material, 0xDC, 0xE0, None),
    entry(SectionId::IndexBuffer, 0xF4, 0xF8, Some(BufferKind::Indices)),
    entry(SectionId::VertexLayout(0), 0x10C, 0x110, None),
    entry(SectionId::VertexLayout(1), 0x124, 0x128, None),
    entry(SectionId::VertexBuffer(0), 0x13C, 0x140, Some(BufferKind::Positions)),
    entry(SectionId::VertexBuffer(1), 0x154, 0x158, Some(BufferKind::NormalsUvs)),
    entry(SectionId::Model, 0x16C, 0x170, None),
];

impl DirectoryEntry {
    /// Look up the directory row for a section.
    pub fn for_section(section: SectionId) -> Option<&'static DirectoryEntry> {
        DIRECTORY.iter().find(|e| e.section == section)
    }

    /// Encode the `(offset, size, size)` triple for the data slot.
    pub fn data_triple(offset: u32, size: u32) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&offset.to_le_bytes());
        bytes[4..8].copy_from_slice(&size.to_le_bytes());
        bytes[8..12].copy_from_slice(&size.to_le_bytes());
        bytes
    }
}
