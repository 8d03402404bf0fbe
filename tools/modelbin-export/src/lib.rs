//! modelbin-export library
//!
//! Converts OBJ meshes into quantized modelbin containers. Exposed as a library
//! so batch tools can share one [`BoundsSession`] across many exports.

pub mod bounds;
pub mod export;
pub mod formats;
pub mod mesh;
pub mod templates;

// Re-export packing primitives from modelbin-common
pub use modelbin_common::{
    pack_index_i32, pack_normal_snorm16, pack_uv_unorm16, quantize_position, swap16, unswap16,
};

// Re-export key types for mesh conversion
pub use bounds::{BoundsSession, ModelBounds};
pub use export::{
    convert_mesh, convert_obj, convert_obj_to_memory, export_mesh, export_to_writer,
    ExportOptions, ExportSummary,
};
pub use mesh::{ParsedMesh, QuantizedMesh, ResolvedMesh, Selection};
pub use templates::{ContainerTemplates, MaterialLibrary, MaterialRegistry};
