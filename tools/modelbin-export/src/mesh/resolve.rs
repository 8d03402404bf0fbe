//! Multi-index -> shared-index resolution
//!
//! OBJ corners reference positions, normals and UVs independently. The
//! container wants one normal and one UV per vertex, so resolution runs in
//! two passes over the retained faces:
//!
//! 1. tally: for every referenced position, count how often each normal is
//!    used and remember the last normal / UV seen at that position;
//! 2. pick + rewrite: assign dense indices in ascending position order, pick
//!    one normal and UV per vertex, then rewrite the faces.

use glam::DVec3;
use hashbrown::HashMap;
use std::collections::BTreeSet;

use super::types::{ParsedMesh, ResolvedMesh, Selection, Vertex};
use modelbin_common::{normalize_or_up, DEFAULT_NORMAL, DEFAULT_UV};

/// Per-position votes collected in the first pass.
#[derive(Debug, Default)]
struct CornerTally {
    /// `(normal index, uses)` in first-seen order
    normal_votes: Vec<(u32, u32)>,
    last_normal: Option<u32>,
    last_uv: Option<u32>,
}

impl CornerTally {
    fn vote_normal(&mut self, normal: u32) {
        match self.normal_votes.iter_mut().find(|(n, _)| *n == normal) {
            Some((_, uses)) => *uses += 1,
            None => self.normal_votes.push((normal, 1)),
        }
        self.last_normal = Some(normal);
    }

    /// Most used normal; ties go to the one seen first.
    fn majority_normal(&self) -> Option<u32> {
        let mut best: Option<(u32, u32)> = None;
        for &(normal, uses) in &self.normal_votes {
            if best.is_none_or(|(_, top)| uses > top) {
                best = Some((normal, uses));
            }
        }
        best.map(|(normal, _)| normal)
    }
}

/// Collapse a parsed mesh into a shared-index mesh.
///
/// With `selection` set, only those faces are kept; an empty selection keeps
/// every face. Vertices no retained face references are dropped, and the
/// survivors are renumbered densely in ascending original order.
pub fn resolve(mesh: &ParsedMesh, selection: Option<&Selection>) -> ResolvedMesh {
    let retained = retained_faces(mesh, selection);

    // Pass 1: tally
    let mut used: BTreeSet<u32> = BTreeSet::new();
    let mut tallies: HashMap<u32, CornerTally> = HashMap::new();

    for &face in &retained {
        for &vertex in &mesh.faces[face] {
            used.insert(vertex);
            let tally = tallies.entry(vertex).or_default();

            if let Some(&normal) = mesh.normal_map.get(&(face, vertex)) {
                if (normal as usize) < mesh.normals.len() {
                    tally.vote_normal(normal);
                }
            }
            if let Some(&uv) = mesh.uv_map.get(&(face, vertex)) {
                if (uv as usize) < mesh.uvs.len() {
                    tally.last_uv = Some(uv);
                }
            }
        }
    }

    // Pass 2: pick attributes and renumber
    let mut remap: HashMap<u32, u32> = HashMap::with_capacity(used.len());
    let mut resolved = ResolvedMesh {
        vertices: Vec::with_capacity(used.len()),
        normals: Vec::with_capacity(used.len()),
        uvs: Vec::with_capacity(used.len()),
        faces: Vec::with_capacity(retained.len()),
        centered_on: None,
    };

    for (new_index, &old) in used.iter().enumerate() {
        remap.insert(old, new_index as u32);
        let tally = tallies.get(&old);

        let normal = pick_normal(mesh, old, tally);
        let uv = pick_uv(mesh, old, tally);

        resolved.vertices.push(Vertex {
            position: mesh.positions[old as usize],
            normal_x: normal[0],
        });
        resolved.normals.push(normal);
        resolved.uvs.push(uv);
    }

    for &face in &retained {
        let rewritten = mesh.faces[face]
            .iter()
            .filter_map(|vertex| remap.get(vertex).copied())
            .collect();
        resolved.faces.push(rewritten);
    }

    enforce_attribute_counts(&mut resolved);

    tracing::info!(
        "Resolved mesh: {} vertices, {} faces ({} of {} source vertices used)",
        resolved.vertices.len(),
        resolved.faces.len(),
        used.len(),
        mesh.positions.len()
    );
    resolved
}

/// Faces to keep, in ascending order, minus any that reference missing
/// positions or have fewer than three vertices.
fn retained_faces(mesh: &ParsedMesh, selection: Option<&Selection>) -> Vec<usize> {
    let candidates: Vec<usize> = match selection {
        Some(selection) if !selection.is_empty() => selection
            .iter()
            .filter(|&face| {
                let known = face < mesh.faces.len();
                if !known {
                    tracing::warn!("Selected face {} does not exist", face);
                }
                known
            })
            .collect(),
        Some(_) => {
            tracing::warn!("Empty selection, exporting all faces");
            (0..mesh.faces.len()).collect()
        }
        None => (0..mesh.faces.len()).collect(),
    };

    candidates
        .into_iter()
        .filter(|&face| {
            let valid = mesh.faces[face]
                .iter()
                .all(|&v| (v as usize) < mesh.positions.len());
            if !valid {
                tracing::warn!("Face {} references a missing vertex, skipping", face);
            }
            valid
        })
        .filter(|&face| {
            let corners = mesh.faces[face].len();
            if corners < 3 {
                tracing::warn!("Face {} has {} vertices, skipping", face, corners);
            }
            corners >= 3
        })
        .collect()
}

/// Majority normal, then the last face-local normal, then the normal stored
/// at the same position, then the default.
fn pick_normal(mesh: &ParsedMesh, old: u32, tally: Option<&CornerTally>) -> [f64; 3] {
    let chosen = tally
        .and_then(|t| t.majority_normal().or(t.last_normal))
        .map(|n| mesh.normals[n as usize])
        .or_else(|| mesh.normals.get(old as usize).copied())
        .unwrap_or(DEFAULT_NORMAL);
    normalize_or_up(DVec3::from_array(chosen)).to_array()
}

/// Last face-local UV, then the UV stored at the same position, then the default.
fn pick_uv(mesh: &ParsedMesh, old: u32, tally: Option<&CornerTally>) -> [f64; 2] {
    tally
        .and_then(|t| t.last_uv)
        .map(|uv| mesh.uvs[uv as usize])
        .or_else(|| mesh.uvs.get(old as usize).copied())
        .unwrap_or(DEFAULT_UV)
}

/// Pad or truncate the normal and UV streams to the vertex count.
pub fn enforce_attribute_counts(mesh: &mut ResolvedMesh) {
    let count = mesh.vertices.len();

    if mesh.normals.len() != count {
        tracing::warn!(
            "Normal count ({}) does not match vertex count ({}), adjusting",
            mesh.normals.len(),
            count
        );
        mesh.normals.resize(count, DEFAULT_NORMAL);
    }
    if mesh.uvs.len() != count {
        tracing::warn!(
            "UV count ({}) does not match vertex count ({}), adjusting",
            mesh.uvs.len(),
            count
        );
        mesh.uvs.resize(count, DEFAULT_UV);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::obj::parse_obj_str;

    const QUADS: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 5 5 5
v 2 0 0
v 2 1 0
vn 0 0 1
vn 0 0 -1
vn 1 0 0
vt 0 0
vt 1 1
f 1/1/1 2/2/1 3/1/1 4/2/1
f 2/1/2 6/2/2 7/1/2 3/2/3
";

    fn assert_counts(mesh: &ResolvedMesh) {
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
        assert_eq!(mesh.vertices.len(), mesh.uvs.len());
    }

    #[test]
    fn test_unused_vertices_are_dropped() {
        let mesh = resolve(&parse_obj_str(QUADS), None);
        assert_counts(&mesh);
        // Position 5 (index 4) is never referenced
        assert_eq!(mesh.vertices.len(), 6);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3], vec![1, 4, 5, 2]]);
        assert_eq!(mesh.vertices[4].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_selection_is_dense() {
        let parsed = parse_obj_str(QUADS);
        let selection: Selection = [1].into_iter().collect();
        let mesh = resolve(&parsed, Some(&selection));
        assert_counts(&mesh);

        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.vertices.len(), 4);
        // Original positions 2, 3, 6, 7 in ascending order
        let xs: Vec<_> = mesh.vertices.iter().map(|v| v.position).collect();
        assert_eq!(
            xs,
            vec![[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0]]
        );
        assert_eq!(mesh.faces[0], vec![0, 2, 3, 1]);
        let max = mesh.faces.iter().flatten().max().copied();
        assert_eq!(max, Some(3));
    }

    #[test]
    fn test_empty_selection_keeps_everything() {
        let parsed = parse_obj_str(QUADS);
        let all = resolve(&parsed, None);
        let empty = resolve(&parsed, Some(&Selection::new()));
        assert_eq!(all, empty);
    }

    #[test]
    fn test_majority_normal_wins() {
        let mesh = resolve(&parse_obj_str(QUADS), None);
        // Position 2 sees normal 1 once and normal 2 once: first seen wins
        assert_eq!(mesh.normals[1], [0.0, 0.0, 1.0]);
        // Position 3 sees normal 1 once and normal 3 once: first seen wins
        assert_eq!(mesh.normals[2], [0.0, 0.0, 1.0]);
        assert_eq!(mesh.vertices[2].normal_x, 0.0);
        // Position 6 only sees normal 2
        assert_eq!(mesh.normals[4], [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_majority_beats_first_seen() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 1 0 0
vn 0 1 0
f 1//1 2//1 3//1
f 1//2 2//2 3//2
f 1//2 3//2 2//2
";
        let mesh = resolve(&parse_obj_str(source), None);
        assert!(mesh.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_normal_fallbacks() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 2
f 1 2//9 3
";
        let mesh = resolve(&parse_obj_str(source), None);
        // Positional normal, normalized
        assert_eq!(mesh.normals[0], [0.0, 0.0, 1.0]);
        // Out-of-range normal index and no positional normal: default
        assert_eq!(mesh.normals[1], DEFAULT_NORMAL);
        assert_eq!(mesh.normals[2], DEFAULT_NORMAL);
        assert_eq!(mesh.uvs, vec![DEFAULT_UV; 3]);
    }

    #[test]
    fn test_last_face_local_uv_wins() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 1
vt 1 1
f 1/1 2/1 3/1
f 1/2 3/2 2/2
";
        let mesh = resolve(&parse_obj_str(source), None);
        assert_eq!(mesh.uvs[0], [1.0, 0.0]);
    }

    #[test]
    fn test_faces_with_missing_vertices_are_skipped() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
f 1 2 9
";
        let mesh = resolve(&parse_obj_str(source), None);
        assert_eq!(mesh.faces.len(), 1);
        assert_eq!(mesh.vertices.len(), 3);
    }

    #[test]
    fn test_degenerate_faces_do_not_keep_vertices() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 9 9 9
f 1 2 3
f 3 4
";
        let mesh = resolve(&parse_obj_str(source), None);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
        assert_eq!(mesh.vertices.len(), 3);
        assert!(mesh.vertices.iter().all(|v| v.position != [9.0, 9.0, 9.0]));
    }

    #[test]
    fn test_resolved_normals_are_unit() {
        let source = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 3 4 0
vn 0 0 0
vn 1 1 1
f 1//1 2//2 3//3
";
        let mesh = resolve(&parse_obj_str(source), None);
        for (vertex, normal) in mesh.vertices.iter().zip(&mesh.normals) {
            let length = DVec3::from_array(*normal).length();
            assert!((length - 1.0).abs() < 1e-12);
            assert_eq!(vertex.normal_x, normal[0]);
        }
        assert_eq!(mesh.normals[0], [0.6, 0.8, 0.0]);
        assert_eq!(mesh.normals[1], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_enforce_attribute_counts() {
        let mut mesh = ResolvedMesh {
            vertices: vec![
                Vertex {
                    position: [0.0; 3],
                    normal_x: 0.0
                };
                3
            ],
            normals: vec![[1.0, 0.0, 0.0]],
            uvs: vec![[0.0, 0.0]; 5],
            ..Default::default()
        };
        enforce_attribute_counts(&mut mesh);
        assert_counts(&mesh);
        assert_eq!(mesh.normals[2], DEFAULT_NORMAL);
    }
}
