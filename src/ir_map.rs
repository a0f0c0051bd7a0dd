// Format-agnostic map produced by every parser and consumed by the entity builder.
use crate::geom::IRect;

/// Horizontal flip flag of a gid.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag of a gid.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Anti-diagonal flip flag of a gid.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Bits holding the tile id proper.
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

/// Global tile id as stored in layer data, flip flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Gid(pub u32);

impl Gid {
    /// Value as stored, flags included.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// Tile id without flip flags.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// Mirrored left to right.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// Mirrored top to bottom.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// Mirrored along the anti-diagonal.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
    /// Gid 0: no tile in this cell.
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
}

/// Canonical, format-agnostic map.
#[derive(Debug, Clone)]
pub struct IrMap {
    /// Tile width in pixels.
    pub tile_w: u32,
    /// Tile height in pixels.
    pub tile_h: u32,
    /// Tiles per row.
    pub width: u32,
    /// Declared tilesets.
    pub tilesets: Vec<IrTileset>, // sorted by first_gid before building
    /// Layers in document order.
    pub layers: Vec<IrLayer>,     // draw order: array order
}

/// One atlas with a regular grid.
#[derive(Debug, Clone)]
pub struct IrTileset {
    /// Gid of the tileset's tile 0.
    pub first_gid: u32,
    /// Atlas path, relative to the assets root.
    pub image: String,
    /// Grid cell width when it differs from the map's.
    pub tile_w: Option<u32>,
    /// Grid cell height when it differs from the map's.
    pub tile_h: Option<u32>,
    /// Tiles that declare hitboxes or animations.
    pub tiles: Vec<IrTileMetadata>,
}

/// Per-tile declarations, keyed by local tile id.
#[derive(Debug, Clone, Default)]
pub struct IrTileMetadata {
    /// Local tile id.
    pub id: u32,
    /// Hitbox rectangles relative to the tile's top-left corner.
    pub hitboxes: Vec<IRect>,
    /// Animation frames, empty for still tiles.
    pub animation: Vec<IrFrame>,
}

/// One frame of a tile animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrFrame {
    /// Local tile id of the frame image.
    pub tile_id: u32,
    /// Milliseconds.
    pub duration: u32,
}

/// Payload of a layer.
#[derive(Debug, Clone)]
pub enum IrLayerKind {
    /// Row-major gids, 0 = empty.
    Tiles {
        /// One gid per cell.
        data: Vec<u32>,
    },
    /// Object, image and group layers: they keep their index but yield no entities.
    Other(String),
}

/// One map layer.
#[derive(Debug, Clone)]
pub struct IrLayer {
    /// Layer name, possibly empty.
    pub name: String,
    /// Tiles or another layer type.
    pub kind: IrLayerKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gid_flags_are_masked() {
        let gid = Gid(5 | FLIP_H | FLIP_D);
        assert_eq!(gid.clean(), 5);
        assert!(gid.flip_h() && gid.flip_d() && !gid.flip_v());
        assert!(Gid(FLIP_V).is_empty());
    }
}
