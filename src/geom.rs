use macroquad::math::{ivec2, IVec2};

/// Integer pixel rectangle. Overlap is strict: rectangles that only share an
/// edge do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl IRect {
    /// Builds a rectangle from its top-left corner and size.
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        IRect { x, y, w, h }
    }

    /// Top-left corner.
    #[inline]
    pub fn origin(&self) -> IVec2 {
        ivec2(self.x, self.y)
    }

    /// First column past the rectangle.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// First row past the rectangle.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// The same rectangle moved by `by`.
    #[inline]
    pub fn translate(&self, by: IVec2) -> IRect {
        IRect::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }

    /// Strict overlap; empty rectangles never overlap.
    pub fn overlaps(&self, other: &IRect) -> bool {
        if self.w <= 0 || self.h <= 0 || other.w <= 0 || other.h <= 0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Grid cell containing a world position, for cells of `cell` pixels.
#[inline]
pub fn world_to_cell(p: IVec2, cell: IVec2) -> IVec2 {
    ivec2(p.x.div_euclid(cell.x.max(1)), p.y.div_euclid(cell.y.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = IRect::new(0, 0, 16, 16);
        let b = IRect::new(16, 0, 16, 16);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&IRect::new(15, 15, 4, 4)));
    }

    #[test]
    fn empty_rects_never_overlap() {
        let a = IRect::new(0, 0, 0, 10);
        assert!(!a.overlaps(&IRect::new(-5, -5, 20, 20)));
    }

    #[test]
    fn cells_round_towards_negative_infinity() {
        assert_eq!(world_to_cell(ivec2(-1, 17), ivec2(16, 16)), ivec2(-1, 1));
    }
}
