//! OBJ parser producing attribute pools and fan-triangulated faces.
//!
//! Supported directives: `v`, `vt`, `vn`, `f`, `usemtl`, `mtllib`.
//! Everything else (`o`, `g`, `s`, `l`, ...) is skipped.

use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use glam::{Vec2, Vec3};

use crate::{
    error::{AssetError, AssetResult, Attribute, ErrorKind},
    material::{MaterialTable, library_paths, load_mtl_from_path, split_keyword},
};

/// One corner of a face: 1-based indices into the attribute pools.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct VertexRef {
    pub position: usize,
    pub tex_coord: usize,
    pub normal: usize,
}

impl VertexRef {
    pub fn new(position: usize, tex_coord: usize, normal: usize) -> Self {
        Self {
            position,
            tex_coord,
            normal,
        }
    }
}

/// A triangle after fan triangulation.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRecord {
    pub vertices: [VertexRef; 3],
    /// Active `usemtl` name when the face was read.
    pub material: Option<String>,
    /// Line of the `f` directive this triangle came from.
    pub line: usize,
}

/// Everything one pass over an OBJ file collects.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjMesh {
    pub source: PathBuf,
    pub positions: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub normals: Vec<Vec3>,
    pub faces: Vec<FaceRecord>,
    pub materials: MaterialTable,
}

impl ObjMesh {
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}

/// Load an OBJ mesh from a file path. `mtllib` files resolve next to it.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> AssetResult<ObjMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AssetError::open(path, e))?;
    let mesh = load_obj_from_reader(BufReader::new(file), path)?;
    log::info!(
        "Parsed OBJ {}: {} positions, {} tex coords, {} normals, {} triangles",
        path.display(),
        mesh.positions.len(),
        mesh.tex_coords.len(),
        mesh.normals.len(),
        mesh.faces.len()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from a [`BufRead`] implementation.
///
/// `source` names the file in errors; `mtllib` paths are resolved against
/// its parent directory.
pub fn load_obj_from_reader<R: BufRead>(reader: R, source: &Path) -> AssetResult<ObjMesh> {
    let base_dir = source.parent().unwrap_or(Path::new(""));
    let mut state = ObjParseState::new(source, base_dir);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssetError::at(source, idx + 1, ErrorKind::Io(e)))?;
        state.apply(idx + 1, &line)?;
    }
    Ok(state.finish())
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str) -> AssetResult<ObjMesh> {
    load_obj_from_reader(io::Cursor::new(contents), Path::new("<memory>"))
}

/// Splits a convex polygon into triangles sharing its first vertex:
/// `(v0, v1, v2), (v0, v2, v3), ..., (v0, vn-2, vn-1)`.
///
/// Yields `n - 2` triangles, or none for fewer than three vertices.
pub fn fan_triangulate<T: Copy>(polygon: &[T]) -> impl Iterator<Item = [T; 3]> + '_ {
    let first = polygon.first().copied();
    polygon
        .windows(2)
        .skip(1)
        .filter_map(move |pair| first.map(|v0| [v0, pair[0], pair[1]]))
}

/// Accumulator threaded through every line of one OBJ file.
struct ObjParseState<'a> {
    source: &'a Path,
    base_dir: &'a Path,
    positions: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    normals: Vec<Vec3>,
    faces: Vec<FaceRecord>,
    materials: MaterialTable,
    active_material: Option<String>,
}

impl<'a> ObjParseState<'a> {
    fn new(source: &'a Path, base_dir: &'a Path) -> Self {
        Self {
            source,
            base_dir,
            positions: Vec::new(),
            tex_coords: Vec::new(),
            normals: Vec::new(),
            faces: Vec::new(),
            materials: MaterialTable::new(),
            active_material: None,
        }
    }

    fn apply(&mut self, line_no: usize, raw: &str) -> AssetResult<()> {
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with([' ', '\t']) || line.starts_with('#') {
            return Ok(());
        }

        let (keyword, rest) = split_keyword(line);
        let source = self.source;
        let fail = |kind: ErrorKind| AssetError::at(source, line_no, kind);

        match keyword {
            "mtllib" => {
                if rest.trim().is_empty() {
                    return Err(fail(ErrorKind::malformed(line, "`mtllib` needs a file name")));
                }
                for path in library_paths(self.base_dir, rest) {
                    log::debug!("Line {}: loading material library {}", line_no, path.display());
                    let table = load_mtl_from_path(&path)
                        .map_err(|err| err.with_reference(source, line_no))?;
                    self.materials.extend(table);
                }
            }
            "v" => {
                let [x, y, z] = parse_vector::<3>(line, rest, 3).map_err(fail)?;
                self.positions.push(Vec3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_vector::<2>(line, rest, 1).map_err(fail)?;
                self.tex_coords.push(Vec2::new(u, v));
            }
            "vn" => {
                let [x, y, z] = parse_vector::<3>(line, rest, 3).map_err(fail)?;
                self.normals.push(Vec3::new(x, y, z));
            }
            "usemtl" => {
                let name = rest.trim();
                if name.is_empty() {
                    return Err(fail(ErrorKind::malformed(line, "`usemtl` needs a name")));
                }
                log::debug!("Line {}: switching to material '{}'", line_no, name);
                self.active_material = Some(name.to_owned());
            }
            "f" => {
                let refs = rest
                    .split_whitespace()
                    .map(|token| self.parse_vertex_ref(line, token))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(fail)?;
                if refs.len() < 3 {
                    return Err(fail(ErrorKind::malformed(
                        line,
                        format!("face needs at least 3 vertices, found {}", refs.len()),
                    )));
                }
                for vertices in fan_triangulate(&refs) {
                    self.faces.push(FaceRecord {
                        vertices,
                        material: self.active_material.clone(),
                        line: line_no,
                    });
                }
            }
            other => log::trace!("Ignoring OBJ directive '{}' on line {}", other, line_no),
        }
        Ok(())
    }

    fn parse_vertex_ref(&self, line: &str, token: &str) -> Result<VertexRef, ErrorKind> {
        let mut split = token.split('/');
        let (Some(pos), Some(tex), Some(norm), None) =
            (split.next(), split.next(), split.next(), split.next())
        else {
            return Err(ErrorKind::malformed(
                line,
                format!("vertex reference `{token}` is not `position/texcoord/normal`"),
            ));
        };

        let component = |value: &str, attribute: Attribute, len: usize| {
            if value.is_empty() {
                return Err(ErrorKind::malformed(
                    line,
                    format!("vertex reference `{token}` is missing its {attribute} index"),
                ));
            }
            resolve_index(line, value, attribute, len)
        };

        Ok(VertexRef {
            position: component(pos, Attribute::Position, self.positions.len())?,
            tex_coord: component(tex, Attribute::TexCoord, self.tex_coords.len())?,
            normal: component(norm, Attribute::Normal, self.normals.len())?,
        })
    }

    fn finish(self) -> ObjMesh {
        ObjMesh {
            source: self.source.to_path_buf(),
            positions: self.positions,
            tex_coords: self.tex_coords,
            normals: self.normals,
            faces: self.faces,
            materials: self.materials,
        }
    }
}

/// Reads up to `N` floats; fewer than `required` is malformed, missing
/// optional components are zero and extra ones are ignored.
fn parse_vector<const N: usize>(
    line: &str,
    rest: &str,
    required: usize,
) -> Result<[f32; N], ErrorKind> {
    let mut out = [0.0; N];
    let mut count = 0;
    for token in rest.split_whitespace() {
        let value = token
            .parse::<f32>()
            .map_err(|_| ErrorKind::malformed(line, format!("`{token}` is not a number")))?;
        if count < N {
            out[count] = value;
        }
        count += 1;
    }
    if count < required {
        return Err(ErrorKind::malformed(
            line,
            format!("expected at least {required} values, found {count}"),
        ));
    }
    Ok(out)
}

/// Turns an OBJ index into an absolute 1-based one. Negative indices count
/// back from the end of the pool as it stands on this line.
fn resolve_index(
    line: &str,
    token: &str,
    attribute: Attribute,
    len: usize,
) -> Result<usize, ErrorKind> {
    let raw = token
        .parse::<i64>()
        .map_err(|_| ErrorKind::malformed(line, format!("`{token}` is not an integer index")))?;
    let absolute = if raw < 0 { len as i64 + 1 + raw } else { raw };
    if absolute < 1 {
        return Err(ErrorKind::IndexOutOfRange {
            attribute,
            index: raw,
            len,
        });
    }
    Ok(absolute as usize)
}
