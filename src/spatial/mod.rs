//! Spatial lookup of level content.

mod index;

pub use index::{EntityHandle, TiledScene};
