#![warn(missing_docs)]

//! Tiled JSON/TMX map ingestion into a layered entity/component scene for Macroquad.
//!
//! A map is decoded into a format-agnostic [`IrMap`], every non-empty tile
//! becomes an [`Entity`] carrying hitbox and animation components declared by
//! its tileset, and the entities are indexed by `(layer, position)` in a
//! [`TiledScene`]. The host loop drives `update`/`render` with a [`FrameTime`].
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use tiled_scene::{FrameTime, Level, ScreenCanvas};
//! use macroquad::math::IVec2;
//!
//! let mut level = Level::load("assets/level1.tmx", "assets")?;
//! level.scene.update(FrameTime::new(0.0, 1.0));
//! level.scene.render(&mut ScreenCanvas, IVec2::ZERO);
//! # Ok(())
//! # }
//! ```

mod animation;
mod atlas;
pub mod components;
mod entity;
mod error;
mod frame;
mod geom;
mod hitbox;
mod ir_map;
mod level;
pub mod loader;
mod render;
mod spatial;

pub use animation::{AnimationSequence, FrameStep};
pub use atlas::{Atlas, AtlasLoader, FileAtlasLoader, TileImage};
pub use components::{
    AnimationComponent, Component, ComponentKind, ComponentVariant, Direction, MovementComponent,
    SolidBodyComponent,
};
pub use entity::{Entity, EntityState};
pub use error::{ComponentError, MapError};
pub use frame::FrameTime;
pub use geom::{world_to_cell, IRect};
pub use hitbox::HitBox;
pub use ir_map::{
    Gid, IrFrame, IrLayer, IrLayerKind, IrMap, IrTileMetadata, IrTileset, FLIP_D, FLIP_H, FLIP_V,
    GID_MASK,
};
pub use level::Level;
pub use loader::{
    build_entities, JsonMapParser, LoadOptions, LoadedMap, MapParser, TiledMapLoader, TmxMapParser,
};
pub use render::{camera_view, padded_view, Canvas, ScreenCanvas};
pub use spatial::{EntityHandle, TiledScene};
