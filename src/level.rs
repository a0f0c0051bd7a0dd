use crate::loader::{LoadedMap, MapParser, TiledMapLoader};
use crate::render::{camera_view, padded_view, ScreenCanvas};
use crate::spatial::TiledScene;
use anyhow::Context;
use macroquad::prelude::*;
use std::path::Path;

/// A loaded map with its tiles indexed in a scene.
#[derive(Debug)]
pub struct Level {
    /// Indexed map tiles.
    pub scene: TiledScene,
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Tiles per row.
    pub width: u32,
}

impl Level {
    /// Loads `map` with the default JSON/TMX parsers, reading atlases from
    /// `assets`.
    pub fn load(map: impl AsRef<Path>, assets: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with(&TiledMapLoader::new(), map, assets)
    }

    /// Loads `map` through a caller-supplied parser.
    pub fn load_with(
        parser: &dyn MapParser,
        map: impl AsRef<Path>,
        assets: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let map = map.as_ref();
        let loaded = parser
            .load_map(map, assets.as_ref())
            .with_context(|| format!("Loading map {}", map.display()))?;
        Ok(Self::from_loaded(loaded))
    }

    /// Indexes an already loaded map.
    pub fn from_loaded(loaded: LoadedMap) -> Self {
        let mut scene = TiledScene::with_cell_size(loaded.tile_w, loaded.tile_h);
        scene.insert(loaded.entities);
        Level {
            scene,
            tile_w: loaded.tile_w,
            tile_h: loaded.tile_h,
            width: loaded.width,
        }
    }

    /// Draws the part of the level between the two world-space corners.
    pub fn draw_visible_rect(&self, view_min: Vec2, view_max: Vec2) {
        let view = padded_view(view_min.as_ivec2(), view_max.as_ivec2(), self.scene.cell_size());
        self.scene.render_in_view(&mut ScreenCanvas, view, IVec2::ZERO);
    }

    /// Draws the part of the level seen through `cam`; the camera must be set.
    pub fn draw_in_camera(&self, cam: &Camera2D) {
        let view = camera_view(cam, self.scene.cell_size());
        self.scene.render_in_view(&mut ScreenCanvas, view, IVec2::ZERO);
    }
}
