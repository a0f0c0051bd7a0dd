use crate::geom::IRect;
use crate::render::Canvas;
use macroquad::color::{Color, RED};
use macroquad::math::IVec2;

/// A collision rectangle relative to its owner's origin.
///
/// The absolute rectangle is derived from the owner's position at query
/// time and never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitBox {
    /// Offset and size relative to the owner.
    pub rect: IRect,
    /// Draw the outline when the owner is drawn.
    pub visible: bool,
    /// Outline thickness.
    pub border_width: f32,
    /// Outline colour.
    pub border_color: Color,
}

impl HitBox {
    /// A hidden hitbox with a thin red outline.
    pub fn new(rect: IRect) -> Self {
        HitBox {
            rect,
            visible: false,
            border_width: 1.0,
            border_color: RED,
        }
    }

    /// Builder form of the `visible` flag.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// The rectangle in world space for an owner at `owner`.
    #[inline]
    pub fn absolute_rect(&self, owner: IVec2) -> IRect {
        self.rect.translate(owner)
    }

    /// Outlines the box if it is visible.
    pub fn draw(&self, canvas: &mut dyn Canvas, owner: IVec2) {
        if self.visible {
            self.outline(canvas, owner);
        }
    }

    pub(crate) fn outline(&self, canvas: &mut dyn Canvas, owner: IVec2) {
        canvas.outline(self.absolute_rect(owner), self.border_color, self.border_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::math::ivec2;

    #[test]
    fn absolute_rect_follows_owner() {
        let hb = HitBox::new(IRect::new(2, 3, 4, 5));
        assert_eq!(hb.absolute_rect(ivec2(10, 20)), IRect::new(12, 23, 4, 5));
        assert_eq!(hb.absolute_rect(ivec2(-2, 0)), IRect::new(0, 3, 4, 5));
    }
}
