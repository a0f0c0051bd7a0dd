//! Map parsers and the format dispatcher.

mod build;
/// Tiled JSON maps.
pub mod json_loader;
mod payload;
/// Tiled TMX maps.
pub mod tmx_loader;
mod xml_tree;

pub use build::build_entities;
pub use json_loader::JsonMapParser;
pub use tmx_loader::TmxMapParser;

use crate::atlas::{AtlasLoader, FileAtlasLoader};
use crate::entity::Entity;
use crate::error::MapError;
use crate::ir_map::IrMap;
use serde::Deserialize;
use std::path::Path;
use std::rc::Rc;

/// Knobs applied while turning tiles into entities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// RGB made transparent in extracted tile images.
    pub color_key: Option<[u8; 3]>,
    /// Mirror tiles whose gid carries the horizontal/vertical flip bits.
    pub apply_flip_flags: bool,
    /// Loop flag given to tile animations.
    pub animation_loop: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            color_key: Some([0, 0, 0]),
            apply_flip_flags: true,
            animation_loop: true,
        }
    }
}

/// Result of loading one map.
#[derive(Debug)]
pub struct LoadedMap {
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Tiles per row.
    pub width: u32,
    /// Tile entities, layer by layer in row-major order.
    pub entities: Vec<Entity>,
}

/// A decoder for one map file format.
pub trait MapParser {
    /// Whether this parser handles `path`, judged by its extension.
    fn supports_format(&self, path: &Path) -> bool;

    /// Loads the map at `map_path`, resolving atlas images under `assets_path`.
    fn load_map(&self, map_path: &Path, assets_path: &Path) -> Result<LoadedMap, MapError>;

    /// Entities of every tile layer, in layer then row-major order.
    fn load(&self, map_path: &Path, assets_path: &Path) -> Result<Vec<Entity>, MapError> {
        Ok(self.load_map(map_path, assets_path)?.entities)
    }
}

pub(crate) fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub(crate) fn load_from_ir(
    ir: &IrMap,
    map_path: &Path,
    assets_path: &Path,
    atlases: &dyn AtlasLoader,
    options: &LoadOptions,
) -> Result<LoadedMap, MapError> {
    let entities = build_entities(ir, assets_path, atlases, options)?;
    log::info!(
        "loaded {} ({} layers, {} entities)",
        map_path.display(),
        ir.layers.len(),
        entities.len()
    );
    Ok(LoadedMap {
        tile_w: ir.tile_w,
        tile_h: ir.tile_h,
        width: ir.width,
        entities,
    })
}

/// Delegates to the first registered parser accepting the file.
pub struct TiledMapLoader {
    parsers: Vec<Box<dyn MapParser>>,
}

impl Default for TiledMapLoader {
    fn default() -> Self {
        TiledMapLoader::new()
    }
}

impl TiledMapLoader {
    /// JSON and TMX parsers reading atlases from disk.
    pub fn new() -> Self {
        Self::with_atlas_loader(Rc::new(FileAtlasLoader), LoadOptions::default())
    }

    /// JSON and TMX parsers sharing `atlases` and `options`.
    pub fn with_atlas_loader(atlases: Rc<dyn AtlasLoader>, options: LoadOptions) -> Self {
        let mut loader = Self::empty();
        loader.add_parser(JsonMapParser::new(atlases.clone(), options.clone()));
        loader.add_parser(TmxMapParser::new(atlases, options));
        loader
    }

    /// A dispatcher with no parsers registered.
    pub fn empty() -> Self {
        TiledMapLoader {
            parsers: Vec::new(),
        }
    }

    /// Registers another format; it is tried after the existing ones.
    pub fn add_parser(&mut self, parser: impl MapParser + 'static) {
        self.parsers.push(Box::new(parser));
    }

    fn parser_for(&self, path: &Path) -> Result<&dyn MapParser, MapError> {
        self.parsers
            .iter()
            .find(|p| p.supports_format(path))
            .map(|p| &**p)
            .ok_or_else(|| MapError::FormatUnsupported(path.to_path_buf()))
    }
}

impl MapParser for TiledMapLoader {
    fn supports_format(&self, path: &Path) -> bool {
        self.parsers.iter().any(|p| p.supports_format(path))
    }

    fn load_map(&self, map_path: &Path, assets_path: &Path) -> Result<LoadedMap, MapError> {
        self.parser_for(map_path)?.load_map(map_path, assets_path)
    }
}
