//! Shared types and utilities for the modelbin container format
//!
//! This crate provides the layout knowledge shared between:
//! - `modelbin-export` (asset pipeline)
//! - anything that needs to read back or verify a written container
//!
//! # Modules
//!
//! - [`packing`] - Attribute quantization (f64 → swapped 16-bit fields, i32 indices)
//! - [`formats`] - Front matter, buffer headers, the static directory table and
//!   the append-and-patch [`ContainerWriter`]

pub mod formats;
pub mod packing;

// Re-export commonly used packing items
pub use packing::{
    DEFAULT_NORMAL, DEFAULT_UV, INDEX_STRIDE, NORMAL_UV_STRIDE, POSITION_STRIDE,
    UV_EXTRA_CHANNELS, normalize_or_up, pack_index_i32, pack_normal_snorm16, pack_uv_unorm16,
    quantize_position, round_half_even, swap16, unswap16, write_swapped16,
};

// Re-export commonly used format items
pub use formats::{
    BUNDLE_HEADER_SIZE, BUNDLE_HEADER_TEMPLATE, BinarySerializable, BufferHeader, BufferKind,
    ContainerError, ContainerWriter, DIRECTORY, DirectoryEntry, FILE_SIZE_OFFSET, FRONT_MATTER_SIZE,
    MESH_LOD_COUNT, MeshCounts, SectionId, SectionSpan, TABLE_ENTRY_COUNT, TABLE_ENTRY_SIZE,
};
