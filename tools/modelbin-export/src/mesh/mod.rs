//! Mesh pipeline (OBJ -> resolved -> transformed -> quantized)

mod obj;
mod packing;
mod resolve;
mod transform;
mod types;

// Re-export public API
pub use obj::{load_obj, parse_obj_reader, parse_obj_str, select_by_names};
pub use packing::{
    position_range, quantize_mesh, triangulate, QuantizedMesh, FALLBACK_POSITION_RANGE,
    SESSION_RANGE_PADDING,
};
pub use resolve::{enforce_attribute_counts, resolve};
pub use transform::{
    apply_transforms, center, flip_face_winding, flip_normals, flip_vertices, mirror, Axis,
    AxisSet, TransformOptions,
};
pub use types::{
    AttributeMap, ParsedMesh, Partition, ResolvedMesh, Selection, Vertex, DEFAULT_PARTITION,
};
