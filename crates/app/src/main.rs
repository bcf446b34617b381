//! Loads one model and reports its interleaved buffer.
//! The renderer consumes the same buffer; this binary only inspects it.

use anyhow::{Context, Result};
use asset::{AssetLoader, DEFAULT_ASSET_DIR, InterleavedVertex};

const DEFAULT_MODEL: &str = "Cube";

fn parse_string_arg(prefix: &str) -> Option<String> {
    std::env::args().find_map(|arg| arg.strip_prefix(prefix).map(str::to_owned))
}

fn parse_assets_arg() -> String {
    // --assets=<dir>, defaults to ./models
    parse_string_arg("--assets=")
        .filter(|dir| !dir.is_empty())
        .unwrap_or_else(|| DEFAULT_ASSET_DIR.to_owned())
}

fn parse_model_arg() -> String {
    // --model=<name> without the .obj extension
    parse_string_arg("--model=")
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_owned())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let loader = AssetLoader::new(parse_assets_arg());
    let model = parse_model_arg();
    log::info!(
        "Loading model '{}' from {}",
        model,
        loader.asset_dir().display()
    );

    let buffer = loader
        .load(&model)
        .with_context(|| format!("Could not load model '{model}'"))?;

    log::info!(
        "Vertex layout: stride={} bytes, position@{}, uv@{}, normal@{}, material@{}",
        InterleavedVertex::STRIDE,
        InterleavedVertex::POSITION_OFFSET,
        InterleavedVertex::TEX_COORD_OFFSET,
        InterleavedVertex::NORMAL_OFFSET,
        InterleavedVertex::MATERIAL_OFFSET
    );
    log::info!(
        "{} vertices, {} triangles, {} bytes ready for upload",
        buffer.vertex_count(),
        buffer.triangle_count(),
        buffer.as_bytes().len()
    );
    if let Some(first) = buffer.vertices().first() {
        log::debug!("First vertex: {:?}", first);
    }

    Ok(())
}
