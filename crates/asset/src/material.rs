//! MTL material library parser.
//!
//! Each `newmtl` opens a record; the record closes at the next `newmtl`
//! or at end of file. `illum` is an ordinary property and does not end a
//! record. Lines that start with whitespace or `#` are skipped.

use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::error::{AssetError, AssetResult, ErrorKind};

/// Shading coefficients of one material, in interleave order.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MaterialAttributes {
    /// `Ns`
    pub shininess: f32,
    /// `Ka`
    pub ambient: [f32; 3],
    /// `Kd`
    pub diffuse: [f32; 3],
    /// `Ks`
    pub specular: [f32; 3],
    /// `Ke`
    pub emissive: [f32; 3],
    /// `Ni`
    pub optical_density: f32,
    /// `d`
    pub dissolve: f32,
}

impl MaterialAttributes {
    /// Number of floats a material contributes to every vertex record.
    pub const FLOATS: usize = 15;

    pub fn to_array(&self) -> [f32; Self::FLOATS] {
        let [ka_r, ka_g, ka_b] = self.ambient;
        let [kd_r, kd_g, kd_b] = self.diffuse;
        let [ks_r, ks_g, ks_b] = self.specular;
        let [ke_r, ke_g, ke_b] = self.emissive;
        [
            self.shininess,
            ka_r,
            ka_g,
            ka_b,
            kd_r,
            kd_g,
            kd_b,
            ks_r,
            ks_g,
            ks_b,
            ke_r,
            ke_g,
            ke_b,
            self.optical_density,
            self.dissolve,
        ]
    }
}

/// A named material as read from a library.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub attributes: MaterialAttributes,
    /// `illum` model, if the record declared one. Not part of the vertex data.
    pub illumination: Option<u32>,
}

/// Materials keyed by name, in definition order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialTable {
    materials: Vec<Material>,
    by_name: HashMap<String, usize>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Adds a material. A name already present keeps its first definition;
    /// returns `false` when the new one was discarded.
    pub fn insert(&mut self, material: Material) -> bool {
        if self.by_name.contains_key(&material.name) {
            log::warn!(
                "Duplicate material '{}' ignored; keeping first definition",
                material.name
            );
            return false;
        }
        self.by_name
            .insert(material.name.clone(), self.materials.len());
        self.materials.push(material);
        true
    }

    /// Appends every material of `other`, in its order.
    pub fn extend(&mut self, other: MaterialTable) {
        for material in other.materials {
            self.insert(material);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.by_name.get(name).map(|&i| &self.materials[i])
    }

    /// Attributes of the named material; an absent name is `MaterialNotFound`.
    pub fn lookup(&self, name: &str) -> Result<&MaterialAttributes, ErrorKind> {
        self.get(name)
            .map(|m| &m.attributes)
            .ok_or_else(|| ErrorKind::MaterialNotFound {
                name: Some(name.to_owned()),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }
}

/// Load a material library from a file path.
pub fn load_mtl_from_path(path: impl AsRef<Path>) -> AssetResult<MaterialTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| AssetError::open(path, e))?;
    let table = parse_mtl(BufReader::new(file), path)?;
    log::info!(
        "Loaded material library {} ({} materials)",
        path.display(),
        table.len()
    );
    Ok(table)
}

/// Parse a material library from any reader; `source` labels errors.
pub fn parse_mtl<R: BufRead>(reader: R, source: &Path) -> AssetResult<MaterialTable> {
    let mut state = MtlParseState::new(source);
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| AssetError::at(source, idx + 1, ErrorKind::Io(e)))?;
        state.apply(idx + 1, &line)?;
    }
    state.finish()
}

/// Convenience helper to parse an MTL string literal.
pub fn load_mtl_from_str(contents: &str) -> AssetResult<MaterialTable> {
    parse_mtl(io::Cursor::new(contents), Path::new("<memory>"))
}

/// Record under construction: every coefficient is optional until flushed.
#[derive(Debug)]
struct PendingMaterial {
    name: String,
    line: usize,
    shininess: Option<f32>,
    ambient: Option<[f32; 3]>,
    diffuse: Option<[f32; 3]>,
    specular: Option<[f32; 3]>,
    emissive: Option<[f32; 3]>,
    optical_density: Option<f32>,
    dissolve: Option<f32>,
    illumination: Option<u32>,
}

impl PendingMaterial {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            line,
            shininess: None,
            ambient: None,
            diffuse: None,
            specular: None,
            emissive: None,
            optical_density: None,
            dissolve: None,
            illumination: None,
        }
    }

    fn build(self) -> Result<Material, ErrorKind> {
        let name = self.name;
        let missing = |field: &'static str| ErrorKind::MaterialRecordIncomplete {
            material: name.clone(),
            field,
        };
        let attributes = MaterialAttributes {
            shininess: self.shininess.ok_or_else(|| missing("Ns"))?,
            ambient: self.ambient.ok_or_else(|| missing("Ka"))?,
            diffuse: self.diffuse.ok_or_else(|| missing("Kd"))?,
            specular: self.specular.ok_or_else(|| missing("Ks"))?,
            emissive: self.emissive.ok_or_else(|| missing("Ke"))?,
            optical_density: self.optical_density.ok_or_else(|| missing("Ni"))?,
            dissolve: self.dissolve.ok_or_else(|| missing("d"))?,
        };
        Ok(Material {
            name,
            attributes,
            illumination: self.illumination,
        })
    }
}

struct MtlParseState<'a> {
    source: &'a Path,
    current: Option<PendingMaterial>,
    table: MaterialTable,
}

impl<'a> MtlParseState<'a> {
    fn new(source: &'a Path) -> Self {
        Self {
            source,
            current: None,
            table: MaterialTable::new(),
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

        if keyword == "newmtl" {
            let name = rest.trim();
            if name.is_empty() {
                return Err(fail(ErrorKind::malformed(line, "`newmtl` needs a name")));
            }
            self.flush()?;
            self.current = Some(PendingMaterial::new(name.to_owned(), line_no));
            return Ok(());
        }

        let Some(current) = self.current.as_mut() else {
            return Err(fail(ErrorKind::malformed(
                line,
                "property outside of a `newmtl` block",
            )));
        };

        match keyword {
            "Ns" => current.shininess = Some(parse_scalar(line, rest).map_err(fail)?),
            "Ka" => current.ambient = Some(parse_color(line, rest).map_err(fail)?),
            "Kd" => current.diffuse = Some(parse_color(line, rest).map_err(fail)?),
            "Ks" => current.specular = Some(parse_color(line, rest).map_err(fail)?),
            "Ke" => current.emissive = Some(parse_color(line, rest).map_err(fail)?),
            "Ni" => current.optical_density = Some(parse_scalar(line, rest).map_err(fail)?),
            "d" => current.dissolve = Some(parse_scalar(line, rest).map_err(fail)?),
            "illum" => {
                let model = rest.trim().parse::<u32>().map_err(|_| {
                    fail(ErrorKind::malformed(line, "`illum` expects an integer model"))
                })?;
                current.illumination = Some(model);
            }
            other => log::trace!("Ignoring MTL directive '{}' on line {}", other, line_no),
        }
        Ok(())
    }

    fn flush(&mut self) -> AssetResult<()> {
        if let Some(pending) = self.current.take() {
            let line = pending.line;
            let material = pending
                .build()
                .map_err(|kind| AssetError::at(self.source, line, kind))?;
            self.table.insert(material);
        }
        Ok(())
    }

    fn finish(mut self) -> AssetResult<MaterialTable> {
        self.flush()?;
        Ok(self.table)
    }
}

/// Splits a directive into its keyword and the remaining text.
pub(crate) fn split_keyword(line: &str) -> (&str, &str) {
    line.split_once([' ', '\t']).unwrap_or((line, ""))
}

fn parse_floats(line: &str, rest: &str) -> Result<Vec<f32>, ErrorKind> {
    rest.split_whitespace()
        .map(|tok| {
            tok.parse::<f32>()
                .map_err(|_| ErrorKind::malformed(line, format!("`{tok}` is not a number")))
        })
        .collect()
}

fn parse_scalar(line: &str, rest: &str) -> Result<f32, ErrorKind> {
    match parse_floats(line, rest)?.as_slice() {
        [value] => Ok(*value),
        values => Err(ErrorKind::malformed(
            line,
            format!("expected 1 value, found {}", values.len()),
        )),
    }
}

/// Three channels, or a single value applied to all of them.
fn parse_color(line: &str, rest: &str) -> Result<[f32; 3], ErrorKind> {
    match parse_floats(line, rest)?.as_slice() {
        [v] => Ok([*v, *v, *v]),
        [r, g, b] => Ok([*r, *g, *b]),
        values => Err(ErrorKind::malformed(
            line,
            format!("expected 1 or 3 color values, found {}", values.len()),
        )),
    }
}

/// Resolves `mtllib` file names against the directory of the referencing file.
///
/// The whole argument is one file name when such a file exists, so names
/// containing spaces load as written; otherwise it is split on whitespace
/// into several libraries.
pub(crate) fn library_paths(base_dir: &Path, names: &str) -> Vec<PathBuf> {
    let whole = base_dir.join(names.trim());
    if whole.is_file() {
        return vec![whole];
    }
    names
        .split_whitespace()
        .map(|name| base_dir.join(name))
        .collect()
}
