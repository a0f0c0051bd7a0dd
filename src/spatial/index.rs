use crate::entity::Entity;
use crate::frame::FrameTime;
use crate::geom::{world_to_cell, IRect};
use crate::hitbox::HitBox;
use crate::render::Canvas;
use macroquad::math::{ivec2, IVec2};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Stable slot of an entity inside a [`TiledScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityHandle(pub u32);

// N, NE, E, SE, S, SW, W, NW in cell steps (y grows downwards).
const COMPASS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

#[derive(Debug, Default)]
struct LayerCells {
    by_pos: HashMap<(i32, i32), EntityHandle>,
    order: Vec<EntityHandle>,
}

/// A `(layer, position) -> entity` index owning the static content of a level.
///
/// At most one entity lives at a given key: inserting at an occupied key
/// replaces the previous entity. Keys are read once at insertion, so moving
/// an indexed entity afterwards leaves it filed under its old position.
#[derive(Debug)]
pub struct TiledScene {
    cell: IVec2,
    entities: Vec<Entity>,
    layers: BTreeMap<i32, LayerCells>,
    /// Draw hitbox outlines on top of every rendered entity.
    pub show_hitboxes: bool,
}

impl TiledScene {
    /// A scene whose neighbour step is one `tile_size` tile.
    pub fn new(tile_size: IVec2) -> Self {
        TiledScene {
            cell: tile_size.max(ivec2(1, 1)),
            entities: Vec::new(),
            layers: BTreeMap::new(),
            show_hitboxes: false,
        }
    }

    /// Same as [`new`](Self::new) from a width and height.
    pub fn with_cell_size(w: u32, h: u32) -> Self {
        Self::new(ivec2(w as i32, h as i32))
    }

    /// Neighbour step in pixels.
    pub fn cell_size(&self) -> IVec2 {
        self.cell
    }

    /// Indexes every entity under its current layer and position.
    pub fn insert(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            self.insert_one(entity);
        }
    }

    /// Indexes one entity, returning its handle. An entity already filed
    /// under the same key is dropped and its handle reused.
    pub fn insert_one(&mut self, entity: Entity) -> EntityHandle {
        let key = (entity.x(), entity.y());
        let cells = self.layers.entry(entity.layer()).or_default();

        if let Some(&handle) = cells.by_pos.get(&key) {
            self.entities[handle.0 as usize] = entity;
            return handle;
        }

        let handle = EntityHandle(self.entities.len() as u32);
        self.entities.push(entity);
        cells.by_pos.insert(key, handle);
        cells.order.push(handle);
        handle
    }

    /// Entity filed under `(layer, position)`.
    pub fn get(&self, layer: i32, position: IVec2) -> Option<&Entity> {
        let handle = self.handle_at(layer, position)?;
        self.entities.get(handle.0 as usize)
    }

    /// Mutable entity filed under `(layer, position)`.
    pub fn get_mut(&mut self, layer: i32, position: IVec2) -> Option<&mut Entity> {
        let handle = self.handle_at(layer, position)?;
        self.entities.get_mut(handle.0 as usize)
    }

    /// Entity behind a handle from [`insert_one`](Self::insert_one).
    pub fn entity(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.get(handle.0 as usize)
    }

    fn handle_at(&self, layer: i32, position: IVec2) -> Option<EntityHandle> {
        self.layers
            .get(&layer)?
            .by_pos
            .get(&(position.x, position.y))
            .copied()
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Layers holding at least one entity, ascending.
    pub fn layers(&self) -> impl Iterator<Item = i32> + '_ {
        self.layers.keys().copied()
    }

    /// Entities on `entity`'s layer one cell away in each compass direction,
    /// clockwise from north. Empty cells are skipped.
    pub fn neighbours(&self, entity: &Entity) -> Vec<&Entity> {
        let Some(cells) = self.layers.get(&entity.layer()) else {
            return Vec::new();
        };
        COMPASS
            .iter()
            .filter_map(|&(dx, dy)| {
                let key = (entity.x() + dx * self.cell.x, entity.y() + dy * self.cell.y);
                cells.by_pos.get(&key)
            })
            .filter_map(|h| self.entities.get(h.0 as usize))
            .collect()
    }

    /// Every entity once, ascending by layer.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        let mut seen = HashSet::new();
        self.layers
            .values()
            .flat_map(|cells| cells.order.iter().copied())
            .filter(move |h| seen.insert(*h))
            .filter_map(|h| self.entities.get(h.0 as usize))
    }

    /// Runs one frame of every indexed entity's components.
    pub fn update(&mut self, time: FrameTime) {
        for entity in &mut self.entities {
            entity.update(time);
        }
    }

    /// Draws every entity at position + `offset`, lower layers first.
    pub fn render(&self, canvas: &mut dyn Canvas, offset: IVec2) {
        for entity in self.iter() {
            self.draw_entity(entity, canvas, offset);
        }
    }

    /// Like [`render`](Self::render), skipping entities whose image lies
    /// outside `view` (world space, see [`padded_view`](crate::padded_view)).
    pub fn render_in_view(&self, canvas: &mut dyn Canvas, view: IRect, offset: IVec2) {
        let mut drawn = 0usize;
        for entity in self.iter().filter(|e| e.rect().overlaps(&view)) {
            self.draw_entity(entity, canvas, offset);
            drawn += 1;
        }
        log::trace!("rendered {} of {} entities", drawn, self.len());
    }

    fn draw_entity(&self, entity: &Entity, canvas: &mut dyn Canvas, offset: IVec2) {
        entity.draw(canvas, offset);
        if self.show_hitboxes {
            entity.draw_hitboxes(canvas, offset);
        }
    }

    /// Indexed entities on `entity`'s layer whose hitboxes overlap it, with
    /// the overlapping pairs. Candidates come from the 3x3 block of cells
    /// around the cell containing `entity`, so `entity` need not be aligned
    /// to the grid.
    pub fn collisions_near<'a>(
        &'a self,
        entity: &'a Entity,
    ) -> Vec<(&'a Entity, Vec<(&'a HitBox, &'a HitBox)>)> {
        let Some(cells) = self.layers.get(&entity.layer()) else {
            return Vec::new();
        };
        let origin = world_to_cell(entity.position(), self.cell) * self.cell;

        let mut hits = Vec::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let key = (origin.x + dx * self.cell.x, origin.y + dy * self.cell.y);
                let Some(other) = cells
                    .by_pos
                    .get(&key)
                    .and_then(|h| self.entities.get(h.0 as usize))
                else {
                    continue;
                };
                if std::ptr::eq(other, entity) {
                    continue;
                }
                let pairs = entity.collides_with(other);
                if !pairs.is_empty() {
                    hits.push((other, pairs));
                }
            }
        }
        hits
    }
}

impl<'a> IntoIterator for &'a TiledScene {
    type Item = &'a Entity;
    type IntoIter = Box<dyn Iterator<Item = &'a Entity> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
