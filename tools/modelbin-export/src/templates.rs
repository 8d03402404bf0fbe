//! Container template configuration (TOML)
//!
//! Everything in a modelbin file that is not derived from the mesh comes from
//! here: the bundle header, the 15 section table entries, the opaque metadata
//! and data blobs, and the material library. Blobs are hex strings; spaces and
//! line breaks inside them are ignored.
//!
//! ```toml
//! [skeleton]
//! entry = "..."   # 24 bytes
//! data = "..."
//!
//! [mesh]
//! entry = "..."
//! metadata = ["...", "...", "...", "...", "...", "..."]
//! descriptors = ["...", "...", "...", "...", "...", "..."]
//! counts_offset = 0x27
//!
//! [[vertex_layouts]]
//! entry = "..."
//! metadata = "..."
//! data = "..."
//!
//! [materials.car_paint]
//! metadata = "..."
//! data = "..."
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

use modelbin_common::formats::{
    MeshCounts, BUNDLE_HEADER_SIZE, BUNDLE_HEADER_TEMPLATE, MESH_COUNTS_OFFSET, MESH_LOD_COUNT,
    TABLE_ENTRY_COUNT, TABLE_ENTRY_SIZE,
};

/// Size of the scale / position vectors patched into mesh descriptors
const VEC3_SIZE: u64 = 12;

/// Binary blob written as a hex string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HexBlob(pub Vec<u8>);

impl HexBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'de> Deserialize<'de> for HexBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        hex::decode(digits)
            .map(HexBlob)
            .map_err(serde::de::Error::custom)
    }
}

fn default_header() -> HexBlob {
    HexBlob(BUNDLE_HEADER_TEMPLATE.to_vec())
}

fn default_counts_offset() -> u64 {
    MESH_COUNTS_OFFSET
}

/// Container template file structure
#[derive(Debug, Deserialize)]
pub struct ContainerTemplates {
    /// Bundle header; defaults to the standard `burG` header
    #[serde(default = "default_header")]
    pub header: HexBlob,
    pub skeleton: DataTemplate,
    pub morph: DataTemplate,
    pub mesh: MeshTemplates,
    pub material: EntryTemplate,
    pub index_buffer: BufferTemplate,
    pub vertex_layouts: [SectionTemplate; 2],
    pub vertex_buffers: [BufferTemplate; 2],
    pub model: SectionTemplate,
    #[serde(default)]
    pub materials: MaterialLibrary,
}

/// Table entry only; the blobs come from elsewhere.
#[derive(Debug, Deserialize)]
pub struct EntryTemplate {
    pub entry: HexBlob,
}

/// Table entry plus a data blob (no metadata).
#[derive(Debug, Deserialize)]
pub struct DataTemplate {
    pub entry: HexBlob,
    pub data: HexBlob,
}

/// Table entry plus metadata and data blobs.
#[derive(Debug, Deserialize)]
pub struct SectionTemplate {
    pub entry: HexBlob,
    pub metadata: HexBlob,
    pub data: HexBlob,
}

/// Table entry plus metadata; the payload is generated.
#[derive(Debug, Deserialize)]
pub struct BufferTemplate {
    pub entry: HexBlob,
    pub metadata: HexBlob,
}

/// Mesh LOD templates.
///
/// One table entry is repeated for all LODs; each LOD has its own metadata
/// and descriptor.
#[derive(Debug, Deserialize)]
pub struct MeshTemplates {
    pub entry: HexBlob,
    pub metadata: [HexBlob; MESH_LOD_COUNT],
    pub descriptors: [HexBlob; MESH_LOD_COUNT],

    /// Sub-offset of the geometry counts block in each descriptor
    #[serde(default = "default_counts_offset")]
    pub counts_offset: u64,

    /// Sub-offset of the vertex scale vector (3 × f32), if the descriptor has one
    #[serde(default)]
    pub scale_offset: Option<u64>,

    /// Sub-offset of the vertex position vector (3 × f32), if the descriptor has one
    #[serde(default)]
    pub position_offset: Option<u64>,
}

/// Metadata and data blobs for one material.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialBlobs {
    pub metadata: HexBlob,
    pub data: HexBlob,
}

/// Source of material blobs keyed by name.
pub trait MaterialRegistry {
    fn lookup(&self, key: &str) -> Option<&MaterialBlobs>;

    /// All known keys, sorted.
    fn keys(&self) -> Vec<&str>;
}

/// Materials declared in the template file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MaterialLibrary(BTreeMap<String, MaterialBlobs>);

impl MaterialRegistry for MaterialLibrary {
    fn lookup(&self, key: &str) -> Option<&MaterialBlobs> {
        self.0.get(key)
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(String::as_str).collect()
    }
}

impl ContainerTemplates {
    /// Load templates from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read templates: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid templates: {}", path.display()))
    }

    /// Parse templates from string
    pub fn parse(content: &str) -> Result<Self> {
        let templates: Self = toml::from_str(content).context("Failed to parse template TOML")?;
        templates.validate()?;
        Ok(templates)
    }

    /// Table entries in front-matter order.
    pub fn table_entries(&self) -> [&[u8]; TABLE_ENTRY_COUNT] {
        let mesh = self.mesh.entry.as_bytes();
        [
            self.skeleton.entry.as_bytes(),
            self.morph.entry.as_bytes(),
            mesh,
            mesh,
            mesh,
            mesh,
            mesh,
            mesh,
            self.material.entry.as_bytes(),
            self.index_buffer.entry.as_bytes(),
            self.vertex_layouts[0].entry.as_bytes(),
            self.vertex_layouts[1].entry.as_bytes(),
            self.vertex_buffers[0].entry.as_bytes(),
            self.vertex_buffers[1].entry.as_bytes(),
            self.model.entry.as_bytes(),
        ]
    }

    /// Check blob sizes and patch offsets
    pub fn validate(&self) -> Result<()> {
        if self.header.len() != BUNDLE_HEADER_SIZE {
            bail!(
                "header is {} bytes, expected {}",
                self.header.len(),
                BUNDLE_HEADER_SIZE
            );
        }

        const NAMES: [&str; TABLE_ENTRY_COUNT] = [
            "skeleton",
            "morph",
            "mesh",
            "mesh",
            "mesh",
            "mesh",
            "mesh",
            "mesh",
            "material",
            "index_buffer",
            "vertex_layouts[0]",
            "vertex_layouts[1]",
            "vertex_buffers[0]",
            "vertex_buffers[1]",
            "model",
        ];
        for (name, entry) in NAMES.iter().zip(self.table_entries()) {
            if entry.len() != TABLE_ENTRY_SIZE {
                bail!(
                    "{}.entry is {} bytes, expected {}",
                    name,
                    entry.len(),
                    TABLE_ENTRY_SIZE
                );
            }
        }

        let patches = [
            ("counts_offset", Some(self.mesh.counts_offset), MeshCounts::SIZE as u64),
            ("scale_offset", self.mesh.scale_offset, VEC3_SIZE),
            ("position_offset", self.mesh.position_offset, VEC3_SIZE),
        ];
        for (lod, descriptor) in self.mesh.descriptors.iter().enumerate() {
            for (field, offset, size) in patches {
                let Some(offset) = offset else { continue };
                if offset + size > descriptor.len() as u64 {
                    bail!(
                        "mesh.{} {:#x} (+{} bytes) runs past descriptor {} ({} bytes)",
                        field,
                        offset,
                        size,
                        lod,
                        descriptor.len()
                    );
                }
            }
        }

        Ok(())
    }
}
