//! Typed failures for asset loading.
//!
//! Every failure names the file it came from and, when it can be pinned
//! to one, the 1-based line. The underlying [`ErrorKind`] is the error's
//! `source()`.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Attribute pool a face index points into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texture coordinate",
            Attribute::Normal => "normal",
        })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("file not found")]
    FileNotFound(#[source] io::Error),

    #[error("failed to read file")]
    Io(#[source] io::Error),

    #[error("malformed line `{content}`: {reason}")]
    MalformedLine { content: String, reason: String },

    #[error("{attribute} index {index} out of range (pool holds {len})")]
    IndexOutOfRange {
        attribute: Attribute,
        index: i64,
        len: usize,
    },

    #[error("{}", missing_material(.name))]
    MaterialNotFound { name: Option<String> },

    #[error("material `{material}` is missing `{field}`")]
    MaterialRecordIncomplete {
        material: String,
        field: &'static str,
    },
}

impl ErrorKind {
    pub(crate) fn malformed(content: &str, reason: impl Into<String>) -> Self {
        ErrorKind::MalformedLine {
            content: content.to_owned(),
            reason: reason.into(),
        }
    }
}

fn missing_material(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("material `{name}` not found"),
        None => "face has no active material (no `usemtl` before it)".to_owned(),
    }
}

/// The directive that pulled in the file an error came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reference {
    pub path: PathBuf,
    pub line: usize,
}

/// A failed load, located in a file and optionally a line.
#[derive(Debug, Error)]
#[error(
    "failed to load {}{}{}",
    .path.display(),
    at_line(.line),
    referenced_by(.referenced_from)
)]
pub struct AssetError {
    pub path: PathBuf,
    pub line: Option<usize>,
    /// Set when `path` was loaded on behalf of another file (an `mtllib` line).
    pub referenced_from: Option<Reference>,
    #[source]
    pub kind: ErrorKind,
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

fn referenced_by(reference: &Option<Reference>) -> String {
    reference
        .as_ref()
        .map(|r| format!(", referenced from {} (line {})", r.path.display(), r.line))
        .unwrap_or_default()
}

impl AssetError {
    pub fn new(path: impl Into<PathBuf>, line: Option<usize>, kind: ErrorKind) -> Self {
        Self {
            path: path.into(),
            line,
            referenced_from: None,
            kind,
        }
    }

    /// Records the file and line that referenced the failing file, keeping
    /// the innermost reference if one is already set.
    pub(crate) fn with_reference(mut self, path: impl Into<PathBuf>, line: usize) -> Self {
        if self.referenced_from.is_none() {
            self.referenced_from = Some(Reference {
                path: path.into(),
                line,
            });
        }
        self
    }

    pub(crate) fn at(path: impl Into<PathBuf>, line: usize, kind: ErrorKind) -> Self {
        Self::new(path, Some(line), kind)
    }

    /// Maps an `open` failure: a missing file is `FileNotFound`, anything else `Io`.
    pub(crate) fn open(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let kind = if err.kind() == io::ErrorKind::NotFound {
            ErrorKind::FileNotFound(err)
        } else {
            ErrorKind::Io(err)
        };
        Self::new(path, None, kind)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
