//! Capabilities that can be attached to an [`Entity`](crate::Entity).
//!
//! Components never hold a pointer back to their entity. Every hook receives
//! the owner's [`EntityState`] instead, so the state they see is always the
//! current one.

mod animated;
mod movement;
mod solid_body;

pub use animated::AnimationComponent;
pub use movement::{Direction, MovementComponent};
pub use solid_body::SolidBodyComponent;

use crate::entity::EntityState;
use crate::frame::FrameTime;
use crate::render::Canvas;
use macroquad::math::IVec2;

/// Tag of a component variant; an entity holds at most one per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// See [`MovementComponent`].
    Movement,
    /// See [`AnimationComponent`].
    Animation,
    /// See [`SolidBodyComponent`].
    SolidBody,
}

/// One attached capability.
#[derive(Debug, Clone)]
pub enum Component {
    /// Keyboard-style four-way movement.
    Movement(MovementComponent),
    /// Image animation.
    Animation(AnimationComponent),
    /// Named collision boxes.
    SolidBody(SolidBodyComponent),
}

impl Component {
    /// Kind tag of this variant.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Movement(_) => ComponentKind::Movement,
            Component::Animation(_) => ComponentKind::Animation,
            Component::SolidBody(_) => ComponentKind::SolidBody,
        }
    }

    pub(crate) fn on_added(&mut self, owner: &mut EntityState) {
        if let Component::Animation(anim) = self {
            anim.on_added(owner);
        }
    }

    pub(crate) fn on_removed(&mut self, owner: &mut EntityState) {
        if let Component::Animation(anim) = self {
            anim.on_removed(owner);
        }
    }

    pub(crate) fn update(&mut self, owner: &mut EntityState, time: FrameTime) {
        match self {
            Component::Movement(m) => m.update(owner),
            Component::Animation(a) => a.update(owner, time),
            Component::SolidBody(_) => {}
        }
    }

    pub(crate) fn draw(&self, owner: &EntityState, canvas: &mut dyn Canvas, offset: IVec2) {
        if let Component::SolidBody(body) = self {
            body.draw(canvas, owner.position + offset);
        }
    }
}

/// Typed access to one [`Component`] variant.
pub trait ComponentVariant: Sized {
    /// Kind tag matching `Self`.
    const KIND: ComponentKind;

    /// The variant payload when `c` holds `Self`.
    fn from_component(c: &Component) -> Option<&Self>;
    /// Mutable form of [`from_component`](Self::from_component).
    fn from_component_mut(c: &mut Component) -> Option<&mut Self>;
}

macro_rules! component_variant {
    ($ty:ty, $variant:ident) => {
        impl ComponentVariant for $ty {
            const KIND: ComponentKind = ComponentKind::$variant;

            fn from_component(c: &Component) -> Option<&Self> {
                match c {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            fn from_component_mut(c: &mut Component) -> Option<&mut Self> {
                match c {
                    Component::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Component {
            fn from(inner: $ty) -> Self {
                Component::$variant(inner)
            }
        }
    };
}

component_variant!(MovementComponent, Movement);
component_variant!(AnimationComponent, Animation);
component_variant!(SolidBodyComponent, SolidBody);
