use crate::atlas::TileImage;
use crate::components::{Component, ComponentKind, ComponentVariant, SolidBodyComponent};
use crate::frame::FrameTime;
use crate::geom::IRect;
use crate::hitbox::HitBox;
use crate::render::Canvas;
use macroquad::math::{ivec2, IVec2};
use std::rc::Rc;

/// The part of an entity its components may read and change.
#[derive(Debug, Clone)]
pub struct EntityState {
    /// Top-left pixel position.
    pub position: IVec2,
    /// Draw order and scene query key.
    pub layer: i32,
    /// Image currently displayed.
    pub image: Rc<TileImage>,
}

impl EntityState {
    /// State at `position` with an empty image.
    pub fn at(position: IVec2, layer: i32) -> Self {
        EntityState {
            position,
            layer,
            image: Rc::new(TileImage::empty()),
        }
    }
}

/// A positioned, layered game object composed of optional components.
///
/// Position and layer must not change while the entity is stored in a
/// [`TiledScene`](crate::TiledScene); the scene keys entities by them.
#[derive(Debug, Clone)]
pub struct Entity {
    state: EntityState,
    components: Vec<Component>,
}

impl Entity {
    /// An entity without components. `None` leaves it with an empty image.
    pub fn new(position: IVec2, layer: i32, image: Option<Rc<TileImage>>) -> Self {
        let mut state = EntityState::at(position, layer);
        if let Some(image) = image {
            state.image = image;
        }
        Entity {
            state,
            components: Vec::new(),
        }
    }

    /// Position, layer and image.
    pub fn state(&self) -> &EntityState {
        &self.state
    }

    /// Top-left pixel position.
    pub fn position(&self) -> IVec2 {
        self.state.position
    }

    /// Moves the entity. Do not call on indexed entities.
    pub fn set_position(&mut self, position: IVec2) {
        self.state.position = position;
    }

    /// Horizontal pixel position.
    pub fn x(&self) -> i32 {
        self.state.position.x
    }

    /// Vertical pixel position.
    pub fn y(&self) -> i32 {
        self.state.position.y
    }

    /// Draw order and scene key.
    pub fn layer(&self) -> i32 {
        self.state.layer
    }

    /// Image currently displayed.
    pub fn image(&self) -> &Rc<TileImage> {
        &self.state.image
    }

    /// Replaces the displayed image.
    pub fn set_image(&mut self, image: Rc<TileImage>) {
        self.state.image = image;
    }

    /// Size of the current image.
    pub fn size(&self) -> IVec2 {
        ivec2(self.state.image.width() as i32, self.state.image.height() as i32)
    }

    /// Screen rectangle covered by the current image.
    pub fn rect(&self) -> IRect {
        let size = self.size();
        IRect::new(self.x(), self.y(), size.x, size.y)
    }

    /// Attaches `component` in the slot of its kind. Replacing keeps the
    /// slot's place in attachment order and detaches the previous occupant.
    pub fn add_component(&mut self, component: impl Into<Component>) {
        let mut component = component.into();
        let kind = component.kind();
        match self.components.iter().position(|c| c.kind() == kind) {
            Some(idx) => {
                self.components[idx].on_removed(&mut self.state);
                component.on_added(&mut self.state);
                self.components[idx] = component;
            }
            None => {
                component.on_added(&mut self.state);
                self.components.push(component);
            }
        }
    }

    /// Detaches the component of `kind`, if any.
    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Component> {
        let idx = self.components.iter().position(|c| c.kind() == kind)?;
        let mut removed = self.components.remove(idx);
        removed.on_removed(&mut self.state);
        Some(removed)
    }

    /// Component of `kind`, if attached.
    pub fn get_component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.iter().find(|c| c.kind() == kind)
    }

    /// Whether a component of `kind` is attached.
    pub fn has(&self, kind: ComponentKind) -> bool {
        self.get_component(kind).is_some()
    }

    /// Typed lookup, e.g. `entity.get::<SolidBodyComponent>()`.
    pub fn get<T: ComponentVariant>(&self) -> Option<&T> {
        self.get_component(T::KIND).and_then(T::from_component)
    }

    /// Typed mutable lookup.
    pub fn get_mut<T: ComponentVariant>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find(|c| c.kind() == T::KIND)
            .and_then(T::from_component_mut)
    }

    /// Components in attachment order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// First capability `find` returns among the components, in attachment order.
    pub fn find_capability<'a, R>(
        &'a self,
        find: impl FnMut(&'a Component) -> Option<R>,
    ) -> Option<R> {
        self.components.iter().find_map(find)
    }

    /// Hitbox pairs overlapping between this entity and `other`. Entities
    /// without a solid body never collide.
    pub fn collides_with<'a>(&'a self, other: &'a Entity) -> Vec<(&'a HitBox, &'a HitBox)> {
        match (
            self.get::<SolidBodyComponent>(),
            other.get::<SolidBodyComponent>(),
        ) {
            (Some(a), Some(b)) => a.collides_with(self.position(), b, other.position()),
            _ => Vec::new(),
        }
    }

    /// Runs every component for one frame, in attachment order.
    pub fn update(&mut self, time: FrameTime) {
        let Entity { state, components } = self;
        for component in components.iter_mut() {
            component.update(state, time);
        }
    }

    /// Blits the current image at position + `offset`, then lets every
    /// component draw.
    pub fn draw(&self, canvas: &mut dyn Canvas, offset: IVec2) {
        canvas.blit(&self.state.image, self.state.position + offset);
        for component in &self.components {
            component.draw(&self.state, canvas, offset);
        }
    }

    pub(crate) fn draw_hitboxes(&self, canvas: &mut dyn Canvas, offset: IVec2) {
        if let Some(body) = self.get::<SolidBodyComponent>() {
            body.draw_outlines(canvas, self.state.position + offset);
        }
    }
}
