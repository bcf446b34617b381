//! Asset loading: OBJ meshes with MTL materials, flattened into one
//! interleaved vertex buffer for the renderer.
//!
//! Data flows one way: material libraries feed the OBJ parser, the parsed
//! mesh feeds the interleaver, and [`AssetLoader`] ties them together.

pub mod error;
pub mod interleave;
pub mod loader;
pub mod material;
pub mod obj;

pub use error::{AssetError, AssetResult, Attribute, ErrorKind, Reference};
pub use interleave::{InterleavedBuffer, InterleavedVertex, interleave};
pub use loader::{AssetLoader, DEFAULT_ASSET_DIR, load_model};
pub use material::{Material, MaterialAttributes, MaterialTable};
pub use obj::{FaceRecord, ObjMesh, VertexRef, fan_triangulate};
