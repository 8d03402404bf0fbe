//! Integration tests for modelbin-export
//!
//! Tests the full pipeline: generate test assets -> convert -> verify output


use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::tempdir;

use modelbin_common::{
    unswap16, BufferHeader, BufferKind, MeshCounts, FRONT_MATTER_SIZE, MESH_LOD_COUNT,
};
use modelbin_export::{
    convert_obj, BoundsSession, ContainerTemplates, ExportOptions, Selection,
};

const IB_SLOT: usize = 0xF8;
const VB0_SLOT: usize = 0x140;
const VB1_SLOT: usize = 0x158;
const MESH_SLOT: usize = 0x50;
const MATERIAL_SLOT: usize = 0xE0;

struct Fixture {
    _dir: tempfile::TempDir,
    root: PathBuf,
    templates: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        let templates = root.join("modelbin.toml");
        generate_test_assets::generate_templates_toml(&templates)
            .expect("Failed to generate templates");
        Self {
            _dir: dir,
            root,
            templates,
        }
    }

    fn triangle(&self) -> PathBuf {
        let path = self.root.join("triangle.obj");
        generate_test_assets::generate_triangle_obj(&path).expect("Failed to generate OBJ");
        path
    }

    fn cube(&self) -> PathBuf {
        let path = self.root.join("cube.obj");
        generate_test_assets::generate_cube_obj(&path).expect("Failed to generate OBJ");
        path
    }
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modelbin-export"))
        .args(args)
        .output()
        .expect("Failed to run modelbin-export")
}

fn convert(input: &Path, output: &Path, templates: &Path, extra: &[&str]) {
    let mut args = vec![
        "convert",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "-c",
        templates.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    let result = run(&args);
    assert!(
        result.status.success(),
        "modelbin-export convert failed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Buffer header and payload registered in a directory data slot
fn buffer(bytes: &[u8], slot: usize) -> (BufferHeader, &[u8]) {
    let at = read_u32(bytes, slot) as usize;
    let size = read_u32(bytes, slot + 4) as usize;
    assert_eq!(read_u32(bytes, slot + 8) as usize, size);
    let header = BufferHeader::from_bytes(&bytes[at..]).expect("Buffer header");
    assert_eq!(header.size as usize + BufferHeader::SIZE, size);
    (header, &bytes[at + BufferHeader::SIZE..at + size])
}

/// Structural checks every container must pass
fn verify_modelbin(bytes: &[u8]) {
    assert!(bytes.len() as u64 > FRONT_MATTER_SIZE);
    assert_eq!(&bytes[0..4], b"burG");
    assert_eq!(read_u32(bytes, 0x0C) as usize, bytes.len(), "file size field");

    let (positions, _) = buffer(bytes, VB0_SLOT);
    let (normals_uvs, _) = buffer(bytes, VB1_SLOT);
    assert_eq!(positions, BufferHeader::for_payload(BufferKind::Positions, positions.size as usize));
    assert_eq!(normals_uvs.count, positions.count, "one normal/UV record per vertex");

    let (indices, _) = buffer(bytes, IB_SLOT);
    assert_eq!(indices.stride, 4);
    assert_eq!(indices.count % 3, 0);

    for lod in 0..MESH_LOD_COUNT {
        let at = read_u32(bytes, MESH_SLOT + lod * 0x18) as usize;
        let counts = MeshCounts::from_bytes(&bytes[at + 0x27..]).expect("Mesh counts");
        assert_eq!(counts.index_count, indices.count);
        assert_eq!(counts.vertex_count, positions.count);
    }
}

#[test]
fn test_triangle_obj() {
    let fixture = Fixture::new();
    let obj_path = fixture.triangle();
    let out_path = fixture.root.join("triangle.modelbin");

    convert(&obj_path, &out_path, &fixture.templates, &["--material", "car_paint"]);

    let data = std::fs::read(&out_path).expect("Failed to read modelbin");
    verify_modelbin(&data);

    let (header, payload) = buffer(&data, IB_SLOT);
    assert_eq!(header.count, 3);
    assert_eq!(payload, &[0, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0]);

    let (header, payload) = buffer(&data, VB1_SLOT);
    assert_eq!(header.count, 3);
    for record in payload.chunks_exact(40) {
        // normal z = 1, UV falls back to (0.5, 0.5)
        assert_eq!(unswap16([record[2], record[3]]) as i16, 32767);
        assert_eq!(unswap16([record[4], record[5]]), 32768);
        assert_eq!(unswap16([record[6], record[7]]), 32768);
    }

    let material = read_u32(&data, MATERIAL_SLOT) as usize;
    assert_eq!(&data[material..material + 8], &[0xD1; 8]);
}

#[test]
fn test_cube_obj_fan_triangulated() {
    let fixture = Fixture::new();
    let obj_path = fixture.cube();
    let out_path = fixture.root.join("cube.modelbin");

    convert(&obj_path, &out_path, &fixture.templates, &[]);

    let data = std::fs::read(&out_path).expect("Failed to read modelbin");
    verify_modelbin(&data);

    let (positions, _) = buffer(&data, VB0_SLOT);
    let (indices, _) = buffer(&data, IB_SLOT);
    assert_eq!(positions.count, 8);
    assert_eq!(indices.count, 6 * 2 * 3);
}

#[test]
fn test_object_selection() {
    let fixture = Fixture::new();
    let obj_path = fixture.cube();
    let out_path = fixture.root.join("caps.modelbin");

    convert(&obj_path, &out_path, &fixture.templates, &["--object", "caps"]);

    let data = std::fs::read(&out_path).expect("Failed to read modelbin");
    verify_modelbin(&data);

    let (indices, payload) = buffer(&data, IB_SLOT);
    assert_eq!(indices.count, 2 * 2 * 3);
    let max = payload
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .max();
    assert_eq!(max, Some(7));
}

#[test]
fn test_unknown_object_name_fails() {
    let fixture = Fixture::new();
    let obj_path = fixture.cube();
    let out_path = fixture.root.join("typo.modelbin");

    let result = run(&[
        "convert",
        obj_path.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
        "-c",
        fixture.templates.to_str().unwrap(),
        "--object",
        "cpas",
    ]);
    assert!(!result.status.success());
    assert!(!out_path.exists());
}

#[test]
fn test_descriptor_fields() {
    let fixture = Fixture::new();
    let obj_path = fixture.triangle();
    let out_path = fixture.root.join("scaled.modelbin");

    convert(
        &obj_path,
        &out_path,
        &fixture.templates,
        &["--scale", "1.5,2,2.5", "--position", "0, -1, 0"],
    );

    let data = std::fs::read(&out_path).expect("Failed to read modelbin");
    for lod in 0..MESH_LOD_COUNT {
        let at = read_u32(&data, MESH_SLOT + lod * 0x18) as usize;
        assert_eq!(read_f32(&data, at + 0x04), 1.5);
        assert_eq!(read_f32(&data, at + 0x0C), 2.5);
        assert_eq!(read_f32(&data, at + 0x14), -1.0);
    }
}

#[test]
fn test_unknown_material_still_exports() {
    let fixture = Fixture::new();
    let obj_path = fixture.triangle();
    let out_path = fixture.root.join("plain.modelbin");

    convert(&obj_path, &out_path, &fixture.templates, &["--material", "velvet"]);

    let data = std::fs::read(&out_path).expect("Failed to read modelbin");
    verify_modelbin(&data);
    // Material slot keeps the template bytes
    assert_eq!(&data[MATERIAL_SLOT..MATERIAL_SLOT + 4], &[0x60; 4]);
}

#[test]
fn test_multiple_inputs_default_outputs() {
    let fixture = Fixture::new();
    let triangle = fixture.triangle();
    let cube = fixture.cube();

    let result = run(&[
        "convert",
        triangle.to_str().unwrap(),
        cube.to_str().unwrap(),
        "-c",
        fixture.templates.to_str().unwrap(),
    ]);
    assert!(result.status.success());

    for path in [triangle.with_extension("modelbin"), cube.with_extension("modelbin")] {
        let data = std::fs::read(&path).expect("Failed to read modelbin");
        verify_modelbin(&data);
    }
}

#[test]
fn test_output_requires_single_input() {
    let fixture = Fixture::new();
    let triangle = fixture.triangle();
    let cube = fixture.cube();
    let out_path = fixture.root.join("both.modelbin");

    let result = run(&[
        "convert",
        triangle.to_str().unwrap(),
        cube.to_str().unwrap(),
        "-o",
        out_path.to_str().unwrap(),
        "-c",
        fixture.templates.to_str().unwrap(),
    ]);
    assert!(!result.status.success());
    assert!(!out_path.exists());
}

#[test]
fn test_missing_input_fails() {
    let fixture = Fixture::new();
    let missing = fixture.root.join("missing.obj");
    let result = run(&[
        "convert",
        missing.to_str().unwrap(),
        "-c",
        fixture.templates.to_str().unwrap(),
    ]);
    assert!(!result.status.success());
}

#[test]
fn test_inspect_and_check() {
    let fixture = Fixture::new();
    let cube = fixture.cube();

    let result = run(&["inspect", cube.to_str().unwrap()]);
    assert!(result.status.success());

    let result = run(&["check", "-c", fixture.templates.to_str().unwrap()]);
    assert!(result.status.success());

    let broken = fixture.root.join("broken.toml");
    std::fs::write(&broken, "[skeleton]\nentry = \"00\"\n").unwrap();
    let result = run(&["check", "-c", broken.to_str().unwrap()]);
    assert!(!result.status.success());
}

/// Sequential imports share one session: the second export is quantized
/// against the union of both meshes.
#[test]
fn test_shared_bounds_session() {
    let fixture = Fixture::new();
    let triangle = fixture.triangle();
    let cube = fixture.cube();
    let templates = ContainerTemplates::load(&fixture.templates).expect("Templates");

    let mut session = BoundsSession::new();
    let options = ExportOptions::default();

    let alone = fixture.root.join("alone.modelbin");
    convert_obj(&triangle, &alone, &templates, &mut BoundsSession::new(), &options)
        .expect("Export");

    let first = fixture.root.join("cube.modelbin");
    let second = fixture.root.join("shared.modelbin");
    convert_obj(&cube, &first, &templates, &mut session, &options).expect("Export");
    convert_obj(&triangle, &second, &templates, &mut session, &options).expect("Export");

    let bounds = session.current().expect("Session bounds");
    assert_eq!(bounds.min.to_array(), [-0.5, -0.5, -0.5]);
    assert_eq!(bounds.max.to_array(), [1.0, 1.0, 0.5]);

    let alone = std::fs::read(&alone).unwrap();
    let shared = std::fs::read(&second).unwrap();
    let (_, alone_positions) = buffer(&alone, VB0_SLOT);
    let (_, shared_positions) = buffer(&shared, VB0_SLOT);
    assert_eq!(alone_positions.len(), shared_positions.len());
    assert_ne!(alone_positions, shared_positions);
}

#[test]
fn test_empty_selection_exports_everything() {
    let fixture = Fixture::new();
    let cube = fixture.cube();
    let templates = ContainerTemplates::load(&fixture.templates).expect("Templates");

    let all = fixture.root.join("all.modelbin");
    let empty = fixture.root.join("empty.modelbin");
    let options = ExportOptions {
        selection: Some(Selection::new()),
        ..Default::default()
    };
    convert_obj(&cube, &all, &templates, &mut BoundsSession::new(), &ExportOptions::default())
        .expect("Export");
    convert_obj(&cube, &empty, &templates, &mut BoundsSession::new(), &options).expect("Export");

    assert_eq!(std::fs::read(&all).unwrap(), std::fs::read(&empty).unwrap());
}
