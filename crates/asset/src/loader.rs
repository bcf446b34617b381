//! Name-based entry point: `<asset_dir>/<name>.obj` in, interleaved buffer out.

use std::path::{Path, PathBuf};

use crate::{
    error::AssetResult,
    interleave::{InterleavedBuffer, interleave},
    obj::{ObjMesh, load_obj_from_path},
};

/// Directory models are looked up in when none is configured.
pub const DEFAULT_ASSET_DIR: &str = "models";

/// Resolves model names inside one asset directory.
///
/// Holds no state between loads; separate loads may run on separate threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetLoader {
    asset_dir: PathBuf,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new(DEFAULT_ASSET_DIR)
    }
}

impl AssetLoader {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }

    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Path of the OBJ file for `name` (given without extension).
    pub fn model_path(&self, name: &str) -> PathBuf {
        self.asset_dir.join(format!("{name}.obj"))
    }

    /// Parse the model without interleaving it.
    pub fn load_mesh(&self, name: &str) -> AssetResult<ObjMesh> {
        load_obj_from_path(self.model_path(name))
    }

    /// Parse and interleave the model called `name`.
    pub fn load(&self, name: &str) -> AssetResult<InterleavedBuffer> {
        let mesh = self.load_mesh(name)?;
        let buffer = interleave(&mesh)?;
        log::info!(
            "Model '{}' ready: {} triangles, {} floats ({} bytes)",
            name,
            buffer.triangle_count(),
            buffer.as_floats().len(),
            buffer.as_bytes().len()
        );
        Ok(buffer)
    }
}

/// Load `models/<name>.obj` with the default loader.
pub fn load_model(name: &str) -> AssetResult<InterleavedBuffer> {
    AssetLoader::default().load(name)
}
