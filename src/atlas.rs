//! Sheet images and rectangular sub-image extraction.
//!
//! Tile images stay on the CPU until they are first drawn; the GPU texture is
//! created lazily so maps can be parsed (and tested) without a window.

use crate::error::MapError;
use crate::geom::IRect;
use macroquad::prelude::{FilterMode, Image, Texture2D};
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

/// An RGBA8 image that can be blitted. Cheap to share through `Rc`.
pub struct TileImage {
    image: Image,
    texture: OnceCell<Texture2D>,
}

impl TileImage {
    /// Wraps a CPU image.
    pub fn new(image: Image) -> Self {
        TileImage {
            image,
            texture: OnceCell::new(),
        }
    }

    /// A 0×0 image, used by entities created without one.
    pub fn empty() -> Self {
        TileImage::new(Image {
            bytes: Vec::new(),
            width: 0,
            height: 0,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height as u32
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.image.bytes
    }

    /// RGBA of one pixel, `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = ((y * self.width() + x) * 4) as usize;
        let px = &self.image.bytes[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Same size and same pixels.
    pub fn same_content(&self, other: &TileImage) -> bool {
        self.image.width == other.image.width
            && self.image.height == other.image.height
            && self.image.bytes == other.image.bytes
    }

    /// A mirrored copy.
    pub fn flipped(&self, flip_x: bool, flip_y: bool) -> TileImage {
        let (w, h) = (self.width() as usize, self.height() as usize);
        let mut bytes = vec![0u8; self.image.bytes.len()];
        for y in 0..h {
            let sy = if flip_y { h - 1 - y } else { y };
            for x in 0..w {
                let sx = if flip_x { w - 1 - x } else { x };
                let src = (sy * w + sx) * 4;
                let dst = (y * w + x) * 4;
                bytes[dst..dst + 4].copy_from_slice(&self.image.bytes[src..src + 4]);
            }
        }
        TileImage::new(Image {
            bytes,
            width: self.image.width,
            height: self.image.height,
        })
    }

    /// GPU texture for drawing. Requires a live macroquad context.
    pub fn texture(&self) -> &Texture2D {
        self.texture.get_or_init(|| {
            let tex = Texture2D::from_image(&self.image);
            tex.set_filter(FilterMode::Nearest);
            tex
        })
    }
}

impl fmt::Debug for TileImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileImage")
            .field("width", &self.image.width)
            .field("height", &self.image.height)
            .finish()
    }
}

/// A loaded sheet image from which tiles are sliced.
pub struct Atlas {
    image: Image,
    source: PathBuf,
}

impl Atlas {
    /// Sheet `image`, remembered as loaded from `source`.
    pub fn new(image: Image, source: impl Into<PathBuf>) -> Self {
        Atlas {
            image,
            source: source.into(),
        }
    }

    /// Sheet width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width as u32
    }

    /// Sheet height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height as u32
    }

    /// Path the sheet was loaded from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Copies `rect` out of the sheet. Pixels matching `color_key` (RGB) become
    /// fully transparent.
    pub fn image_at(&self, rect: IRect, color_key: Option<[u8; 3]>) -> Result<TileImage, MapError> {
        if rect.x < 0
            || rect.y < 0
            || rect.w <= 0
            || rect.h <= 0
            || rect.x as i64 + rect.w as i64 > self.width() as i64
            || rect.y as i64 + rect.h as i64 > self.height() as i64
        {
            return Err(MapError::MapData(format!(
                "tile rect {:?} lies outside atlas {} ({}x{})",
                rect,
                self.source.display(),
                self.width(),
                self.height()
            )));
        }

        let sheet_w = self.width() as usize;
        let (x0, y0, w, h) = (rect.x as usize, rect.y as usize, rect.w as usize, rect.h as usize);
        let mut bytes = Vec::with_capacity(w * h * 4);
        for row in y0..y0 + h {
            let start = (row * sheet_w + x0) * 4;
            bytes.extend_from_slice(&self.image.bytes[start..start + w * 4]);
        }

        if let Some([r, g, b]) = color_key {
            for px in bytes.chunks_exact_mut(4) {
                if px[0] == r && px[1] == g && px[2] == b {
                    px[3] = 0;
                }
            }
        }

        Ok(TileImage::new(Image {
            bytes,
            width: rect.w as u16,
            height: rect.h as u16,
        }))
    }

    /// [`image_at`](Self::image_at) for every rect.
    pub fn images_at(
        &self,
        rects: &[IRect],
        color_key: Option<[u8; 3]>,
    ) -> Result<Vec<TileImage>, MapError> {
        rects.iter().map(|r| self.image_at(*r, color_key)).collect()
    }

    /// `count` images laid out left to right starting at `first`.
    pub fn load_strip(
        &self,
        first: IRect,
        count: usize,
        color_key: Option<[u8; 3]>,
    ) -> Result<Vec<TileImage>, MapError> {
        let rects: Vec<IRect> = (0..count as i32)
            .map(|i| IRect::new(first.x + first.w * i, first.y, first.w, first.h))
            .collect();
        self.images_at(&rects, color_key)
    }

    /// Source rectangle of a local tile id on a grid of `tile_w`×`tile_h` cells.
    pub fn tile_rect(&self, local_id: u32, tile_w: u32, tile_h: u32) -> Result<IRect, MapError> {
        let columns = if tile_w == 0 { 0 } else { self.width() / tile_w };
        if columns == 0 {
            return Err(MapError::MapData(format!(
                "atlas {} is narrower than one {}px tile",
                self.source.display(),
                tile_w
            )));
        }
        let rows = if tile_h == 0 { 0 } else { self.height() / tile_h };
        if local_id as u64 >= columns as u64 * rows as u64 {
            return Err(MapError::MapData(format!(
                "tile {} is past the {}x{} grid of atlas {}",
                local_id,
                columns,
                rows,
                self.source.display()
            )));
        }
        let col = local_id % columns;
        let row = local_id / columns;
        Ok(IRect::new(
            (col * tile_w) as i32,
            (row * tile_h) as i32,
            tile_w as i32,
            tile_h as i32,
        ))
    }
}

/// Supplies atlas images to the map parsers.
pub trait AtlasLoader {
    /// Loads the sheet at `path`.
    fn load_atlas(&self, path: &Path) -> Result<Atlas, MapError>;
}

/// Reads and decodes atlas images from disk (PNG and the other formats
/// macroquad's decoder knows).
#[derive(Debug, Default, Clone, Copy)]
pub struct FileAtlasLoader;

impl AtlasLoader for FileAtlasLoader {
    fn load_atlas(&self, path: &Path) -> Result<Atlas, MapError> {
        let bytes = std::fs::read(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = Image::from_file_with_format(&bytes, None).map_err(|e| MapError::Image {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::debug!(
            "loaded atlas {} ({}x{})",
            path.display(),
            image.width,
            image.height
        );
        Ok(Atlas::new(image, path))
    }
}
