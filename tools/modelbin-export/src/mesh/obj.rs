//! OBJ subset parser
//!
//! Understands `o`, `g`, `v`, `vn`, `vt` and `f`; everything else is ignored.
//! Malformed records are skipped with a warning and parsing continues.

use anyhow::{bail, Context, Result};
use hashbrown::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::{ParsedMesh, Partition, Selection, DEFAULT_PARTITION};
use crate::bounds::BoundsSession;

/// One face corner: position index plus optional UV and normal indices (0-based).
type FaceCorner = (u32, Option<u32>, Option<u32>);

/// Load an OBJ file and grow the session bounds by its positions.
///
/// The session is only touched once the whole file has been parsed.
pub fn load_obj(input: &Path, session: &mut BoundsSession) -> Result<ParsedMesh> {
    let file = File::open(input).with_context(|| format!("Failed to open OBJ: {:?}", input))?;
    tracing::info!("Loading OBJ file: {:?}", input);

    let mesh = parse_obj_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read OBJ: {:?}", input))?;

    if let Some(bounds) = mesh.bounds() {
        session.record(&bounds);
    }
    Ok(mesh)
}

/// Parse OBJ text held in memory.
pub fn parse_obj_str(source: &str) -> ParsedMesh {
    let mut parser = ObjParser::new();
    for (number, line) in source.lines().enumerate() {
        parser.parse_line(number + 1, line);
    }
    parser.finish()
}

/// Parse OBJ text from a reader. Only I/O errors are fatal.
pub fn parse_obj_reader<R: BufRead>(reader: R) -> Result<ParsedMesh> {
    let mut parser = ObjParser::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        parser.parse_line(number + 1, &line);
    }
    Ok(parser.finish())
}

/// Streaming parser state.
struct ObjParser {
    mesh: ParsedMesh,
    object_index: HashMap<String, usize>,
    group_index: HashMap<String, usize>,
    current_object: usize,
    current_group: usize,
}

impl ObjParser {
    fn new() -> Self {
        let mut mesh = ParsedMesh::default();
        mesh.objects.push(Partition::new(DEFAULT_PARTITION));
        mesh.groups.push(Partition::new(DEFAULT_PARTITION));

        let mut object_index = HashMap::new();
        object_index.insert(DEFAULT_PARTITION.to_string(), 0);
        let mut group_index = HashMap::new();
        group_index.insert(DEFAULT_PARTITION.to_string(), 0);

        Self {
            mesh,
            object_index,
            group_index,
            current_object: 0,
            current_group: 0,
        }
    }

    fn parse_line(&mut self, number: usize, line: &str) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&keyword, args)) = parts.split_first() else {
            return;
        };

        match keyword {
            "o" => self.begin_object(args),
            "g" => self.begin_group(args),
            "v" => match parse_floats::<3>(args) {
                Some(p) => self.mesh.positions.push(p),
                None => tracing::warn!("Invalid vertex data on line {}: {}", number, line.trim()),
            },
            "vn" => match parse_floats::<3>(args) {
                Some(n) => self.mesh.normals.push(n),
                None => tracing::warn!("Invalid normal data on line {}: {}", number, line.trim()),
            },
            "vt" => match parse_floats::<2>(args) {
                Some([u, v]) => self.mesh.uvs.push([u, 1.0 - v]),
                None => tracing::warn!("Invalid UV data on line {}: {}", number, line.trim()),
            },
            "f" => match parse_face(args) {
                Some(corners) => self.push_face(corners),
                None => tracing::warn!("Invalid face data on line {}: {}", number, line.trim()),
            },
            _ => {}
        }
    }

    fn begin_object(&mut self, args: &[&str]) {
        let name = if args.is_empty() {
            format!("unnamed_object_{}", self.mesh.objects.len())
        } else {
            args.join(" ")
        };
        tracing::debug!("Found object: {}", name);
        self.current_object = intern(&mut self.mesh.objects, &mut self.object_index, name);

        // A group declared before its object is re-parented to that object
        let group = &self.mesh.groups[self.current_group].name;
        if group != DEFAULT_PARTITION {
            let object = self.mesh.objects[self.current_object].name.clone();
            self.mesh.group_to_object.insert(group.clone(), object);
        }
    }

    fn begin_group(&mut self, args: &[&str]) {
        let name = if args.is_empty() {
            format!("unnamed_group_{}", self.mesh.groups.len())
        } else {
            args.join(" ")
        };
        tracing::debug!("Found group: {}", name);
        self.current_group = intern(&mut self.mesh.groups, &mut self.group_index, name.clone());

        let object = self.mesh.objects[self.current_object].name.clone();
        self.mesh.group_to_object.insert(name, object);
    }

    fn push_face(&mut self, corners: Vec<FaceCorner>) {
        let face = self.mesh.faces.len();
        let mut positions = Vec::with_capacity(corners.len());

        for (vertex, uv, normal) in corners {
            positions.push(vertex);
            if let Some(uv) = uv {
                self.mesh.uv_map.insert((face, vertex), uv);
            }
            if let Some(normal) = normal {
                self.mesh.normal_map.insert((face, vertex), normal);
            }
        }

        self.mesh.faces.push(positions);
        self.mesh.objects[self.current_object].faces.push(face);
        self.mesh.groups[self.current_group].faces.push(face);
    }

    fn finish(self) -> ParsedMesh {
        let mesh = self.mesh;
        tracing::info!(
            "Parsed OBJ: {} vertices, {} faces, {} normals, {} UVs",
            mesh.positions.len(),
            mesh.faces.len(),
            mesh.normals.len(),
            mesh.uvs.len()
        );
        for object in &mesh.objects {
            tracing::debug!("  object {}: {} faces", object.name, object.faces.len());
        }
        for group in &mesh.groups {
            tracing::debug!("  group {}: {} faces", group.name, group.faces.len());
        }
        mesh
    }
}

/// Return the index of the partition called `name`, creating it if needed.
fn intern(partitions: &mut Vec<Partition>, index: &mut HashMap<String, usize>, name: String) -> usize {
    if let Some(&i) = index.get(&name) {
        return i;
    }
    let i = partitions.len();
    partitions.push(Partition::new(name.clone()));
    index.insert(name, i);
    i
}

/// Parse the first `N` numbers; extra trailing components are ignored.
fn parse_floats<const N: usize>(args: &[&str]) -> Option<[f64; N]> {
    if args.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().ok()?;
    }
    Some(out)
}

/// Parse all corners of a face; any bad corner rejects the whole face.
fn parse_face(args: &[&str]) -> Option<Vec<FaceCorner>> {
    if args.is_empty() {
        return None;
    }
    args.iter().map(|corner| parse_obj_vertex(corner)).collect()
}

/// Parse OBJ vertex reference: "v", "v/vt", "v/vt/vn", or "v//vn"
///
/// Indices must be positive (1-based); relative indices are rejected.
fn parse_obj_vertex(s: &str) -> Option<FaceCorner> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = parse_index(parts.first()?)?;

    let vti = match parts.get(1).filter(|s| !s.is_empty()) {
        Some(s) => Some(parse_index(s)?),
        None => None,
    };

    let vni = match parts.get(2).filter(|s| !s.is_empty()) {
        Some(s) => Some(parse_index(s)?),
        None => None,
    };

    Some((vi, vti, vni))
}

fn parse_index(s: &str) -> Option<u32> {
    s.parse::<u32>().ok()?.checked_sub(1) // OBJ indices are 1-based
}

/// Build a selection from object and group names.
///
/// The result is the union of the faces of every named partition. Unknown
/// names are reported and otherwise ignored. Fails when the union is empty.
pub fn select_by_names<S: AsRef<str>>(
    mesh: &ParsedMesh,
    objects: &[S],
    groups: &[S],
) -> Result<Selection> {
    let mut selection = Selection::new();

    for name in objects {
        match mesh.object(name.as_ref()) {
            Some(object) => selection.extend(object.faces.iter().copied()),
            None => tracing::warn!("Unknown object: {}", name.as_ref()),
        }
    }
    for name in groups {
        match mesh.group(name.as_ref()) {
            Some(group) => selection.extend(group.faces.iter().copied()),
            None => tracing::warn!("Unknown group: {}", name.as_ref()),
        }
    }

    if selection.is_empty() {
        let names: Vec<&str> = objects
            .iter()
            .chain(groups)
            .map(|name| name.as_ref())
            .collect();
        bail!("No faces selected by {:?}", names);
    }

    tracing::info!("Selected {} faces", selection.len());
    Ok(selection)
}
