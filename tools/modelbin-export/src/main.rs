//! modelbin-export - OBJ to modelbin conversion tool
//!
//! Converts OBJ meshes into quantized modelbin containers built from a
//! template file (.toml)

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use modelbin_export::export::{export_mesh, ExportOptions};
use modelbin_export::formats::DescriptorFields;
use modelbin_export::mesh::{self, Axis, AxisSet, TransformOptions};
use modelbin_export::templates::{ContainerTemplates, MaterialRegistry};
use modelbin_export::BoundsSession;

/// File extension for written containers
const MODELBIN_EXT: &str = "modelbin";

#[derive(Parser)]
#[command(name = "modelbin-export")]
#[command(about = "OBJ to modelbin export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert OBJ meshes to modelbin containers
    Convert {
        /// Input OBJ files; all are loaded first so they share one bounds session
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output .modelbin file (single input only; default: <input>.modelbin)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to the container template file
        #[arg(short, long, default_value = "modelbin.toml")]
        config: PathBuf,

        /// Material key from the template material library
        #[arg(short, long)]
        material: Option<String>,

        /// Export only faces of this object (repeatable)
        #[arg(long = "object")]
        objects: Vec<String>,

        /// Export only faces of this group (repeatable)
        #[arg(long = "group")]
        groups: Vec<String>,

        /// Keep original coordinates instead of centering
        #[arg(long)]
        no_center: bool,

        /// Negate vertex coordinates on these axes (e.g. "xz")
        #[arg(long)]
        flip_vertices: Option<AxisSet>,

        /// Negate normal components on these axes (e.g. "y")
        #[arg(long)]
        flip_normals: Option<AxisSet>,

        /// Reverse the winding of every face
        #[arg(long)]
        flip_faces: bool,

        /// Mirror across an axis (x, y or z)
        #[arg(long)]
        mirror: Option<Axis>,

        /// Vertex scale written into mesh descriptors ("x,y,z")
        #[arg(long, value_parser = parse_vec3)]
        scale: Option<[f32; 3]>,

        /// Vertex position written into mesh descriptors ("x,y,z")
        #[arg(long, value_parser = parse_vec3)]
        position: Option<[f32; 3]>,
    },

    /// List the objects and groups of an OBJ file
    Inspect {
        /// Input OBJ file
        input: PathBuf,
    },

    /// Validate a template file without exporting
    Check {
        /// Path to the container template file
        #[arg(short, long, default_value = "modelbin.toml")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            inputs,
            output,
            config,
            material,
            objects,
            groups,
            no_center,
            flip_vertices,
            flip_normals,
            flip_faces,
            mirror,
            scale,
            position,
        } => {
            if output.is_some() && inputs.len() > 1 {
                bail!("--output can only be used with a single input");
            }
            let templates = ContainerTemplates::load(&config)?;

            let transform = TransformOptions {
                center: !no_center,
                flip_vertices: flip_vertices.unwrap_or_default(),
                flip_normals: flip_normals.unwrap_or_default(),
                flip_faces,
                mirror,
            };
            let descriptor = DescriptorFields {
                vertex_scale: scale,
                vertex_position: position,
            };

            // Load everything first so each export sees the combined bounds
            let mut session = BoundsSession::new();
            let meshes = inputs
                .iter()
                .map(|input| mesh::load_obj(input, &mut session))
                .collect::<Result<Vec<_>>>()?;

            for (input, parsed) in inputs.iter().zip(&meshes) {
                let output = output
                    .clone()
                    .unwrap_or_else(|| input.with_extension(MODELBIN_EXT));
                tracing::info!("Converting {:?} -> {:?}", input, output);

                let selection = if objects.is_empty() && groups.is_empty() {
                    None
                } else {
                    Some(mesh::select_by_names(parsed, &objects, &groups)?)
                };
                let options = ExportOptions {
                    selection,
                    transform,
                    material: material.clone(),
                    position_range: None,
                    descriptor,
                };
                export_mesh(parsed, &output, &templates, &session, &options)?;
            }
            tracing::info!("Done!");
        }

        Commands::Inspect { input } => {
            let mut session = BoundsSession::new();
            let parsed = mesh::load_obj(&input, &mut session)?;
            inspect(&parsed);
        }

        Commands::Check { config } => {
            tracing::info!("Checking templates {:?}", config);
            let templates = ContainerTemplates::load(&config)?;
            let keys = templates.materials.keys();
            if keys.is_empty() {
                tracing::info!("No materials defined");
            } else {
                tracing::info!("Materials:");
                for key in keys {
                    tracing::info!("  {}", key);
                }
            }
            tracing::info!("Templates are valid!");
        }
    }

    Ok(())
}

/// Log objects (sorted by name) with their groups and face counts.
fn inspect(parsed: &mesh::ParsedMesh) {
    tracing::info!(
        "{} vertices, {} normals, {} UVs, {} faces",
        parsed.positions.len(),
        parsed.normals.len(),
        parsed.uvs.len(),
        parsed.faces.len()
    );

    let mut objects: Vec<_> = parsed
        .objects
        .iter()
        .filter(|o| o.name != mesh::DEFAULT_PARTITION || !o.faces.is_empty())
        .collect();
    objects.sort_by(|a, b| a.name.cmp(&b.name));

    tracing::info!("Objects:");
    for object in objects {
        tracing::info!("  {} ({} faces)", object.name, object.faces.len());
        for group in parsed.groups_of(&object.name) {
            tracing::info!("    {} ({} faces)", group.name, group.faces.len());
        }
    }
}

/// Parse "x,y,z" into three floats.
fn parse_vec3(s: &str) -> Result<[f32; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got {:?}", s));
    };
    let parse = |v: &str| v.parse::<f32>().map_err(|e| format!("{:?}: {}", v, e));
    Ok([parse(*x)?, parse(*y)?, parse(*z)?])
}
