use crate::animation::AnimationSequence;
use crate::atlas::{Atlas, AtlasLoader, TileImage};
use crate::components::{AnimationComponent, SolidBodyComponent};
use crate::entity::Entity;
use crate::error::MapError;
use crate::hitbox::HitBox;
use crate::ir_map::{Gid, IrLayerKind, IrMap, IrTileMetadata, FLIP_H, FLIP_V};
use crate::loader::LoadOptions;
use macroquad::math::ivec2;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

struct PreparedTileset<'ir> {
    first_gid: u32,
    atlas: Atlas,
    tile_w: u32,
    tile_h: u32,
    defs: HashMap<u32, &'ir IrTileMetadata>,
    // keyed by (local id, flip bits); entities of the same tile share one image
    images: HashMap<(u32, u32), Rc<TileImage>>,
}

impl PreparedTileset<'_> {
    fn image(&mut self, local: u32, flips: u32, options: &LoadOptions) -> Result<Rc<TileImage>, MapError> {
        if let Some(img) = self.images.get(&(local, flips)) {
            return Ok(img.clone());
        }
        let rect = self.atlas.tile_rect(local, self.tile_w, self.tile_h)?;
        let mut img = self.atlas.image_at(rect, options.color_key)?;
        if flips != 0 {
            img = img.flipped(flips & FLIP_H != 0, flips & FLIP_V != 0);
        }
        let img = Rc::new(img);
        self.images.insert((local, flips), img.clone());
        Ok(img)
    }
}

/// Turns a decoded map into entities: one per non-empty cell, positioned on
/// the tile grid, with hitbox and animation components attached from the
/// tileset declarations. Atlas paths are resolved under `assets`.
pub fn build_entities(
    ir: &IrMap,
    assets: &Path,
    atlases: &dyn AtlasLoader,
    options: &LoadOptions,
) -> Result<Vec<Entity>, MapError> {
    if ir.tile_w == 0 || ir.tile_h == 0 {
        return Err(MapError::MapData(format!(
            "tile size must be positive, got {}x{}",
            ir.tile_w, ir.tile_h
        )));
    }
    if ir.tilesets.is_empty() {
        return Err(MapError::MapData("map declares no tileset".into()));
    }

    let mut order: Vec<_> = ir.tilesets.iter().collect();
    order.sort_by_key(|t| t.first_gid);

    let mut tilesets = Vec::with_capacity(order.len());
    for ts in order {
        if ts.image.is_empty() {
            return Err(MapError::MapData(format!(
                "tileset with firstgid {} has no image",
                ts.first_gid
            )));
        }
        let atlas = atlases.load_atlas(&assets.join(&ts.image))?;
        log::debug!(
            "tileset firstgid={} atlas={} tiles_with_metadata={}",
            ts.first_gid,
            ts.image,
            ts.tiles.len()
        );
        tilesets.push(PreparedTileset {
            first_gid: ts.first_gid,
            atlas,
            tile_w: ts.tile_w.unwrap_or(ir.tile_w),
            tile_h: ts.tile_h.unwrap_or(ir.tile_h),
            defs: ts.tiles.iter().map(|t| (t.id, t)).collect(),
            images: HashMap::new(),
        });
    }

    let flip_mask = if options.apply_flip_flags { FLIP_H | FLIP_V } else { 0 };
    let mut entities = Vec::new();

    for (layer_index, layer) in ir.layers.iter().enumerate() {
        let data = match &layer.kind {
            IrLayerKind::Tiles { data } => data,
            IrLayerKind::Other(kind) => {
                log::warn!("skipping {} layer '{}'", kind, layer.name);
                continue;
            }
        };
        if ir.width == 0 && data.iter().any(|g| !Gid(*g).is_empty()) {
            return Err(MapError::MapData("map width must be positive".into()));
        }

        let before = entities.len();
        for (idx, raw) in data.iter().enumerate() {
            let gid = Gid(*raw);
            if gid.is_empty() {
                continue;
            }
            let clean = gid.clean();
            let ts = tilesets
                .iter_mut()
                .rev()
                .find(|t| t.first_gid <= clean)
                .ok_or_else(|| {
                    MapError::MapData(format!(
                        "gid {} in layer {} belongs to no tileset",
                        clean, layer_index
                    ))
                })?;
            let local = clean - ts.first_gid;
            let flips = gid.raw() & flip_mask;

            let col = idx as u32 % ir.width;
            let row = idx as u32 / ir.width;
            let position = ivec2((col * ir.tile_w) as i32, (row * ir.tile_h) as i32);

            let image = ts.image(local, flips, options)?;
            let mut entity = Entity::new(position, layer_index as i32, Some(image));

            if let Some(def) = ts.defs.get(&local).copied() {
                if !def.hitboxes.is_empty() {
                    // fresh hitboxes per tile, never shared between occurrences
                    let body = SolidBodyComponent::with_hitboxes(
                        def.hitboxes
                            .iter()
                            .enumerate()
                            .map(|(n, rect)| (format!("box{}", n + 1), HitBox::new(*rect))),
                    );
                    entity.add_component(body);
                }
                if let Some(first) = def.animation.first() {
                    let frames = def
                        .animation
                        .iter()
                        .map(|f| ts.image(f.tile_id, flips, options))
                        .collect::<Result<Vec<_>, _>>()?;
                    let sequence =
                        AnimationSequence::new(frames, options.animation_loop, first.duration)
                            .map_err(|e| MapError::MapData(e.to_string()))?;
                    entity.add_component(AnimationComponent::with_sequence("animation1", sequence));
                }
            }
            entities.push(entity);
        }
        log::debug!(
            "layer {} '{}': {} entities",
            layer_index,
            layer.name,
            entities.len() - before
        );
    }

    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use crate::geom::IRect;
    use crate::ir_map::{IrFrame, IrLayer, IrTileset, GID_MASK};
    use macroquad::prelude::Image;
    use std::cell::RefCell;
    use std::path::PathBuf;

    // 32x16 atlas: left tile red, right tile green.
    struct TwoTiles {
        requested: RefCell<Vec<PathBuf>>,
    }

    impl AtlasLoader for TwoTiles {
        fn load_atlas(&self, path: &Path) -> Result<Atlas, MapError> {
            self.requested.borrow_mut().push(path.to_path_buf());
            let mut bytes = Vec::new();
            for _y in 0..16 {
                for x in 0..32 {
                    bytes.extend_from_slice(if x < 16 { &[255, 0, 0, 255] } else { &[0, 255, 0, 255] });
                }
            }
            Ok(Atlas::new(Image { bytes, width: 32, height: 16 }, path))
        }
    }

    fn loader() -> TwoTiles {
        TwoTiles {
            requested: RefCell::new(Vec::new()),
        }
    }

    fn map(data: Vec<u32>, tiles: Vec<IrTileMetadata>) -> IrMap {
        IrMap {
            tile_w: 16,
            tile_h: 16,
            width: 2,
            tilesets: vec![IrTileset {
                first_gid: 1,
                image: "tiles.png".into(),
                tile_w: None,
                tile_h: None,
                tiles,
            }],
            layers: vec![
                IrLayer {
                    name: "objects".into(),
                    kind: IrLayerKind::Other("objectgroup".into()),
                },
                IrLayer {
                    name: "ground".into(),
                    kind: IrLayerKind::Tiles { data },
                },
            ],
        }
    }

    #[test]
    fn places_tiles_on_grid_and_skips_empty_cells() {
        let atlases = loader();
        let ir = map(vec![1, 0, 0, 2], Vec::new());
        let entities = build_entities(&ir, Path::new("assets"), &atlases, &LoadOptions::default()).unwrap();

        assert_eq!(atlases.requested.borrow().as_slice(), &[PathBuf::from("assets/tiles.png")]);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].position(), ivec2(0, 0));
        assert_eq!(entities[1].position(), ivec2(16, 16));
        assert!(entities.iter().all(|e| e.layer() == 1));
        assert_eq!(entities[0].image().pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(entities[1].image().pixel(0, 0), Some([0, 255, 0, 255]));
    }

    #[test]
    fn hitboxes_are_fresh_per_tile() {
        let tiles = vec![IrTileMetadata {
            id: 0,
            hitboxes: vec![IRect::new(2, 4, 8, 8)],
            animation: Vec::new(),
        }];
        let mut entities =
            build_entities(&map(vec![1, 1], tiles), Path::new("assets"), &loader(), &LoadOptions::default())
                .unwrap();

        entities[0]
            .get_mut::<SolidBodyComponent>()
            .and_then(|b| b.hitbox_mut("box1"))
            .unwrap()
            .rect
            .w = 99;
        let second = entities[1].get::<SolidBodyComponent>().unwrap();
        assert_eq!(second.hitbox("box1").unwrap().rect, IRect::new(2, 4, 8, 8));
    }

    #[test]
    fn animation_frames_come_from_frame_tile_ids() {
        let tiles = vec![IrTileMetadata {
            id: 0,
            hitboxes: Vec::new(),
            animation: vec![
                IrFrame { tile_id: 1, duration: 120 },
                IrFrame { tile_id: 0, duration: 80 },
            ],
        }];
        let entities =
            build_entities(&map(vec![1], tiles), Path::new("assets"), &loader(), &LoadOptions::default())
                .unwrap();
        let anim = entities[0].get::<AnimationComponent>().unwrap();
        let seq = anim.sequence("animation1").unwrap();
        assert_eq!(seq.len(), 2);
        assert!(seq.looping);
        assert_eq!(seq.frame_duration, 120);
        assert_eq!(seq.frames()[0].pixel(0, 0), Some([0, 255, 0, 255]));
        assert!(!entities[0].has(ComponentKind::SolidBody));
    }

    #[test]
    fn flip_flags_mirror_the_image() {
        let atlases = loader();
        let entities = build_entities(
            &map(vec![1 | FLIP_H], Vec::new()),
            Path::new("assets"),
            &atlases,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].image().width(), 16);
    }

    #[test]
    fn missing_tileset_image_is_map_data_error() {
        let mut ir = map(vec![1], Vec::new());
        ir.tilesets[0].image.clear();
        let err = build_entities(&ir, Path::new("assets"), &loader(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, MapError::MapData(_)));
    }

    #[test]
    fn gid_past_the_atlas_is_map_data_error() {
        for gid in [3, GID_MASK] {
            let ir = map(vec![gid], Vec::new());
            let err = build_entities(&ir, Path::new("assets"), &loader(), &LoadOptions::default())
                .unwrap_err();
            assert!(matches!(err, MapError::MapData(_)), "gid {}: {:?}", gid, err);
        }
    }

    #[test]
    fn gid_below_first_gid_is_map_data_error() {
        let mut ir = map(vec![3], Vec::new());
        ir.tilesets[0].first_gid = 5;
        let err = build_entities(&ir, Path::new("assets"), &loader(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, MapError::MapData(_)));
    }
}
