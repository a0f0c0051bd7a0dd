//! Drawing targets and view culling.

use crate::atlas::TileImage;
use crate::geom::IRect;
use macroquad::prelude::*;

/// Margin, in cells, kept around the view when culling.
const CULL_MARGIN_CELLS: i32 = 1;

/// Something entities can be drawn onto.
pub trait Canvas {
    /// Draws `image` with its top-left corner at `at`.
    fn blit(&mut self, image: &TileImage, at: IVec2);
    /// Draws a rectangle outline.
    fn outline(&mut self, rect: IRect, color: Color, thickness: f32);
}

/// The macroquad screen (or whatever render target / camera is active).
#[derive(Debug, Default, Clone, Copy)]
pub struct ScreenCanvas;

impl Canvas for ScreenCanvas {
    fn blit(&mut self, image: &TileImage, at: IVec2) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        draw_texture(image.texture(), at.x as f32, at.y as f32, WHITE);
    }

    fn outline(&mut self, rect: IRect, color: Color, thickness: f32) {
        draw_rectangle_lines(
            rect.x as f32,
            rect.y as f32,
            rect.w as f32,
            rect.h as f32,
            thickness,
            color,
        );
    }
}

/// World-space rectangle spanned by `view_min`/`view_max` (either corner
/// order), padded by one cell on each side.
pub fn padded_view(view_min: IVec2, view_max: IVec2, cell: IVec2) -> IRect {
    let mut min = view_min.min(view_max);
    let mut max = view_min.max(view_max);
    let pad = cell * CULL_MARGIN_CELLS;
    min -= pad;
    max += pad;
    IRect::new(min.x, min.y, max.x - min.x, max.y - min.y)
}

/// World-space rectangle covered by the given camera.
pub fn camera_view(cam: &Camera2D, cell: IVec2) -> IRect {
    let (viewport_width, viewport_height) = match cam.viewport {
        Some((_, _, w, h)) => (w as f32, h as f32),
        None => (screen_width(), screen_height()),
    };

    let half_w = viewport_width / cam.zoom.x / 2.0;
    let half_h = viewport_height / cam.zoom.y / 2.0;
    let cam_min = cam.target - vec2(half_w, half_h);
    let cam_max = cam.target + vec2(half_w, half_h);
    padded_view(cam_min.as_ivec2(), cam_max.as_ivec2(), cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_view_normalizes_corners() {
        let r = padded_view(ivec2(64, 64), ivec2(0, 0), ivec2(16, 16));
        assert_eq!(r, IRect::new(-16, -16, 96, 96));
    }
}
