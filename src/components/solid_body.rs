use crate::hitbox::HitBox;
use crate::render::Canvas;
use macroquad::math::IVec2;

/// A set of named hitboxes making the owner collidable.
#[derive(Debug, Clone, Default)]
pub struct SolidBodyComponent {
    hitboxes: Vec<(String, HitBox)>,
}

impl SolidBodyComponent {
    /// A body without hitboxes.
    pub fn new() -> Self {
        Self::default()
    }

    /// A body holding the given named hitboxes.
    pub fn with_hitboxes<K: Into<String>>(boxes: impl IntoIterator<Item = (K, HitBox)>) -> Self {
        let mut body = Self::new();
        for (name, hb) in boxes {
            body.add_hitbox(name, hb);
        }
        body
    }

    /// Adds a hitbox, replacing any previous one with the same name.
    pub fn add_hitbox(&mut self, name: impl Into<String>, hitbox: HitBox) {
        let name = name.into();
        match self.hitboxes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = hitbox,
            None => self.hitboxes.push((name, hitbox)),
        }
    }

    /// Removes and returns the hitbox called `name`.
    pub fn remove_hitbox(&mut self, name: &str) -> Option<HitBox> {
        let idx = self.hitboxes.iter().position(|(n, _)| n == name)?;
        Some(self.hitboxes.remove(idx).1)
    }

    /// Hitbox called `name`.
    pub fn hitbox(&self, name: &str) -> Option<&HitBox> {
        self.hitboxes.iter().find(|(n, _)| n == name).map(|(_, h)| h)
    }

    /// Mutable hitbox called `name`.
    pub fn hitbox_mut(&mut self, name: &str) -> Option<&mut HitBox> {
        self.hitboxes
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, h)| h)
    }

    /// Named hitboxes in insertion order.
    pub fn hitboxes(&self) -> impl Iterator<Item = (&str, &HitBox)> {
        self.hitboxes.iter().map(|(n, h)| (n.as_str(), h))
    }

    /// Number of hitboxes.
    pub fn len(&self) -> usize {
        self.hitboxes.len()
    }

    /// True when there is no hitbox.
    pub fn is_empty(&self) -> bool {
        self.hitboxes.is_empty()
    }

    /// True when at least one hitbox is present.
    pub fn is_solid(&self) -> bool {
        !self.hitboxes.is_empty()
    }

    /// Shows or hides every hitbox outline.
    pub fn set_visible(&mut self, visible: bool) {
        for (_, hb) in &mut self.hitboxes {
            hb.visible = visible;
        }
    }

    /// Every `(own, other)` hitbox pair whose absolute rectangles overlap,
    /// with `origin`/`other_origin` the owners' current positions. The full
    /// cartesian product is checked; narrow the candidates beforehand.
    pub fn collides_with<'a, 'b>(
        &'a self,
        origin: IVec2,
        other: &'b SolidBodyComponent,
        other_origin: IVec2,
    ) -> Vec<(&'a HitBox, &'b HitBox)> {
        let mut hits = Vec::new();
        for (_, a) in &self.hitboxes {
            let abs_a = a.absolute_rect(origin);
            for (_, b) in &other.hitboxes {
                if abs_a.overlaps(&b.absolute_rect(other_origin)) {
                    hits.push((a, b));
                }
            }
        }
        hits
    }

    pub(crate) fn draw(&self, canvas: &mut dyn Canvas, origin: IVec2) {
        for (_, hb) in &self.hitboxes {
            hb.draw(canvas, origin);
        }
    }

    pub(crate) fn draw_outlines(&self, canvas: &mut dyn Canvas, origin: IVec2) {
        for (_, hb) in &self.hitboxes {
            hb.outline(canvas, origin);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IRect;
    use macroquad::math::ivec2;

    #[test]
    fn hitbox_names_are_unique() {
        let mut body = SolidBodyComponent::with_hitboxes([("box1", HitBox::new(IRect::new(0, 0, 10, 10)))]);
        assert!(body.is_solid());
        body.add_hitbox("box1", HitBox::new(IRect::new(1, 1, 2, 2)));
        assert_eq!(body.len(), 1);
        assert_eq!(body.hitbox("box1").unwrap().rect, IRect::new(1, 1, 2, 2));
        assert!(body.remove_hitbox("box1").is_some());
        assert!(!body.is_solid());
    }

    #[test]
    fn collisions_use_current_positions() {
        let a = SolidBodyComponent::with_hitboxes([
            ("left", HitBox::new(IRect::new(0, 0, 8, 16))),
            ("right", HitBox::new(IRect::new(8, 0, 8, 16))),
        ]);
        let b = SolidBodyComponent::with_hitboxes([("all", HitBox::new(IRect::new(0, 0, 16, 16)))]);

        assert!(a.collides_with(ivec2(0, 0), &b, ivec2(16, 0)).is_empty());

        let hits = a.collides_with(ivec2(0, 0), &b, ivec2(12, 0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0.rect, IRect::new(8, 0, 8, 16));

        assert_eq!(a.collides_with(ivec2(4, 4), &b, ivec2(0, 0)).len(), 2);
    }
}
