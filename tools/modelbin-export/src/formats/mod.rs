//! modelbin container assembly
//!
//! Re-exports the layout definitions from modelbin-common and sequences a
//! complete container from templates plus quantized mesh buffers.

pub use modelbin_common::formats::*;

use anyhow::{Context, Result};
use std::io::{Seek, Write};

use crate::mesh::QuantizedMesh;
use crate::templates::{ContainerTemplates, MaterialRegistry};

/// Optional per-export values written into every mesh descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DescriptorFields {
    pub vertex_scale: Option<[f32; 3]>,
    pub vertex_position: Option<[f32; 3]>,
}

/// Write a complete modelbin container.
///
/// Sections are appended in the fixed body order: front matter, material
/// and mesh metadata, buffer/layout/model metadata, skeleton and morph data,
/// material data, the six patched mesh descriptors, then the index, layout,
/// vertex, normal/UV and model data. The file size is written last.
///
/// An unknown `material` key only skips the material blobs.
pub fn write_modelbin<W: Write + Seek>(
    sink: W,
    templates: &ContainerTemplates,
    materials: &dyn MaterialRegistry,
    material: Option<&str>,
    mesh: &QuantizedMesh,
    fields: &DescriptorFields,
) -> Result<W> {
    let mut w = ContainerWriter::new(sink)?;

    w.write_front_matter(templates.header.as_bytes(), &templates.table_entries())
        .context("Failed to write front matter")?;

    let material = match material {
        Some(key) => {
            let blobs = materials.lookup(key);
            if blobs.is_none() {
                tracing::warn!("Material not found: {} (material sections left empty)", key);
            }
            blobs
        }
        None => {
            tracing::info!("No material selected");
            None
        }
    };

    // Metadata
    if let Some(blobs) = material {
        w.append_metadata(SectionId::Material, blobs.metadata.as_bytes())?;
    }
    for (lod, metadata) in templates.mesh.metadata.iter().enumerate() {
        w.append_metadata(SectionId::Mesh(lod as u8), metadata.as_bytes())?;
    }
    w.append_metadata(SectionId::IndexBuffer, templates.index_buffer.metadata.as_bytes())?;
    for (i, layout) in templates.vertex_layouts.iter().enumerate() {
        w.append_metadata(SectionId::VertexLayout(i as u8), layout.metadata.as_bytes())?;
    }
    for (i, buffer) in templates.vertex_buffers.iter().enumerate() {
        w.append_metadata(SectionId::VertexBuffer(i as u8), buffer.metadata.as_bytes())?;
    }
    w.append_metadata(SectionId::Model, templates.model.metadata.as_bytes())?;

    // Data
    w.append_section(SectionId::Skeleton, templates.skeleton.data.as_bytes())?;
    w.append_section(SectionId::Morph, templates.morph.data.as_bytes())?;
    if let Some(blobs) = material {
        w.append_section(SectionId::Material, blobs.data.as_bytes())?;
    }

    let counts = MeshCounts::new(mesh.index_count, mesh.vertex_count);
    let scale = descriptor_patch("vertex scale", templates.mesh.scale_offset, fields.vertex_scale);
    let position = descriptor_patch(
        "vertex position",
        templates.mesh.position_offset,
        fields.vertex_position,
    );
    for (lod, descriptor) in templates.mesh.descriptors.iter().enumerate() {
        let span = w.append_section(SectionId::Mesh(lod as u8), descriptor.as_bytes())?;
        w.patch_block(span.offset + templates.mesh.counts_offset, &counts)?;
        for (offset, value) in scale.iter().chain(&position) {
            w.patch(span.offset + offset, &vec3_bytes(*value))?;
        }
    }

    w.append_buffer(SectionId::IndexBuffer, &mesh.indices)?;
    for (i, layout) in templates.vertex_layouts.iter().enumerate() {
        w.append_section(SectionId::VertexLayout(i as u8), layout.data.as_bytes())?;
    }
    w.append_buffer(SectionId::VertexBuffer(0), &mesh.positions)?;
    w.append_buffer(SectionId::VertexBuffer(1), &mesh.normals_uvs)?;
    w.append_section(SectionId::Model, templates.model.data.as_bytes())?;

    let size = w.len();
    let sink = w.finish()?;
    tracing::debug!("Container complete: {} bytes", size);
    Ok(sink)
}

/// Pair a configured descriptor offset with a supplied value.
fn descriptor_patch(
    name: &str,
    offset: Option<u64>,
    value: Option<[f32; 3]>,
) -> Option<(u64, [f32; 3])> {
    match (offset, value) {
        (Some(offset), Some(value)) => Some((offset, value)),
        (None, Some(_)) => {
            tracing::warn!("No {} offset configured for mesh descriptors, value ignored", name);
            None
        }
        _ => None,
    }
}

fn vec3_bytes(value: [f32; 3]) -> [u8; 12] {
    let mut bytes = [0u8; 12];
    for (chunk, component) in bytes.chunks_exact_mut(4).zip(value) {
        chunk.copy_from_slice(&component.to_le_bytes());
    }
    bytes
}
