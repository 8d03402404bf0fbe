//! OBJ -> modelbin export pipeline
//!
//! parse -> resolve -> transform -> quantize -> write. Bounds come from the
//! shared [`BoundsSession`] when one has been recorded.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use crate::bounds::BoundsSession;
use crate::formats::{write_modelbin, DescriptorFields};
use crate::mesh::{
    apply_transforms, load_obj, position_range, quantize_mesh, resolve, ParsedMesh,
    QuantizedMesh, Selection, TransformOptions,
};
use crate::templates::ContainerTemplates;

/// Per-export settings.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Faces to export; `None` (or an empty selection) exports everything
    pub selection: Option<Selection>,
    pub transform: TransformOptions,
    /// Material key looked up in the template material library
    pub material: Option<String>,
    /// Quantization range used when no session bounds exist
    pub position_range: Option<f64>,
    pub descriptor: DescriptorFields,
}

/// What an export produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub vertex_count: u32,
    pub face_count: u32,
    pub index_count: u32,
    /// Container size in bytes
    pub file_size: u64,
}

/// Resolve, transform and quantize a parsed mesh.
pub fn convert_mesh(
    mesh: &ParsedMesh,
    session: &BoundsSession,
    options: &ExportOptions,
) -> Result<QuantizedMesh> {
    let resolved = resolve(mesh, options.selection.as_ref());
    if resolved.vertices.is_empty() {
        bail!("Nothing to export: no faces with valid vertices in the selection");
    }

    let bounds = session.current();
    let transformed = apply_transforms(resolved, &options.transform, bounds);
    let range = position_range(bounds, options.position_range, &transformed);

    Ok(quantize_mesh(&transformed, range))
}

/// Convert an OBJ file to in-memory buffers (for callers that assemble the
/// container themselves)
pub fn convert_obj_to_memory(
    input: &Path,
    session: &mut BoundsSession,
    options: &ExportOptions,
) -> Result<QuantizedMesh> {
    let mesh = load_obj(input, session)?;
    convert_mesh(&mesh, session, options)
}

/// Export a parsed mesh into any seekable sink.
pub fn export_to_writer<W: Write + Seek>(
    mesh: &ParsedMesh,
    sink: W,
    templates: &ContainerTemplates,
    session: &BoundsSession,
    options: &ExportOptions,
) -> Result<(W, ExportSummary)> {
    let quantized = convert_mesh(mesh, session, options)?;

    let mut sink = write_modelbin(
        sink,
        templates,
        &templates.materials,
        options.material.as_deref(),
        &quantized,
        &options.descriptor,
    )?;
    let file_size = sink.stream_position()?;

    let summary = ExportSummary {
        vertex_count: quantized.vertex_count,
        face_count: quantized.face_count,
        index_count: quantized.index_count,
        file_size,
    };
    Ok((sink, summary))
}

/// Export a parsed mesh to a modelbin file.
///
/// A failed export can leave a partial file behind.
pub fn export_mesh(
    mesh: &ParsedMesh,
    output: &Path,
    templates: &ContainerTemplates,
    session: &BoundsSession,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let file =
        File::create(output).with_context(|| format!("Failed to create output: {:?}", output))?;

    let (mut writer, summary) =
        export_to_writer(mesh, BufWriter::new(file), templates, session, options)
            .with_context(|| format!("Failed to write modelbin: {:?}", output))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush output: {:?}", output))?;

    tracing::info!(
        "Exported {:?}: {} vertices, {} faces, {} indices, {} bytes",
        output,
        summary.vertex_count,
        summary.face_count,
        summary.index_count,
        summary.file_size
    );
    Ok(summary)
}

/// Convert an OBJ file to a modelbin file
pub fn convert_obj(
    input: &Path,
    output: &Path,
    templates: &ContainerTemplates,
    session: &mut BoundsSession,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let mesh = load_obj(input, session)?;
    export_mesh(&mesh, output, templates, session, options)
}
