// src/loader/tmx_loader.rs
use crate::atlas::AtlasLoader;
use crate::error::MapError;
use crate::geom::IRect;
use crate::ir_map::*;
use crate::loader::payload::{decode_csv, decode_encoded};
use crate::loader::xml_tree::XmlNode;
use crate::loader::{has_extension, load_from_ir, LoadOptions, LoadedMap, MapParser};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;

// Elements that take a slot in the layer numbering.
const LAYER_ELEMENTS: [&str; 4] = ["layer", "objectgroup", "imagelayer", "group"];

fn read_xml(path: &Path) -> Result<XmlNode, MapError> {
    let file = File::open(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    XmlNode::parse(BufReader::new(file), path)
}

fn tile_to_ir(tile: &XmlNode) -> Result<IrTileMetadata, MapError> {
    let mut hitboxes = Vec::new();
    if let Some(group) = tile.child("objectgroup") {
        for o in group.children("object") {
            hitboxes.push(IRect::new(
                o.attr_or("x", 0.0f32)? as i32,
                o.attr_or("y", 0.0f32)? as i32,
                o.attr_or("width", 0.0f32)? as i32,
                o.attr_or("height", 0.0f32)? as i32,
            ));
        }
    }

    let mut animation = Vec::new();
    if let Some(anim) = tile.child("animation") {
        for f in anim.children("frame") {
            animation.push(IrFrame {
                tile_id: f.attr_or("tileid", 0)?,
                duration: f.attr_or("duration", 100)?,
            });
        }
    }

    Ok(IrTileMetadata {
        id: tile.attr_or("id", 0)?,
        hitboxes,
        animation,
    })
}

fn tileset_to_ir(node: &XmlNode, map_dir: &Path) -> Result<IrTileset, MapError> {
    let first_gid = node.attr_or("firstgid", 1)?;

    // .tsx files hold the same <tileset> element minus firstgid
    let external;
    let ts = match node.attr("source") {
        Some(source) => {
            external = read_xml(&map_dir.join(source))?;
            if external.name != "tileset" {
                return Err(MapError::MapData(format!(
                    "{} is not a tileset document",
                    source
                )));
            }
            &external
        }
        None => node,
    };

    let image = ts
        .child("image")
        .and_then(|i| i.attr("source"))
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            MapError::MapData(format!("tileset with firstgid {} has no image", first_gid))
        })?;

    Ok(IrTileset {
        first_gid,
        image: image.to_owned(),
        tile_w: ts.attr_opt("tilewidth")?,
        tile_h: ts.attr_opt("tileheight")?,
        tiles: ts
            .children("tile")
            .map(tile_to_ir)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn layer_data(index: usize, layer: &XmlNode) -> Result<Vec<u32>, MapError> {
    let name = layer.attr("name").unwrap_or_default();
    let data = layer.child("data").ok_or_else(|| {
        MapError::MapData(format!("tile layer {} '{}' has no data", index, name))
    })?;
    if data.child("chunk").is_some() {
        return Err(MapError::MapData(format!(
            "tile layer {} '{}' is chunked (infinite maps are not supported)",
            index, name
        )));
    }

    match data.attr("encoding") {
        Some("csv") => decode_csv(index, &data.text),
        Some(encoding) => decode_encoded(
            index,
            &data.text,
            encoding,
            data.attr("compression").filter(|c| !c.is_empty()),
        ),
        // legacy form: one <tile gid=".."/> per cell
        None => data
            .children("tile")
            .map(|t| t.attr_or("gid", 0u32))
            .collect(),
    }
}

fn layer_to_ir(index: usize, node: &XmlNode) -> Result<IrLayer, MapError> {
    let kind = match node.name.as_str() {
        "layer" => IrLayerKind::Tiles {
            data: layer_data(index, node)?,
        },
        other => IrLayerKind::Other(other.to_owned()),
    };
    Ok(IrLayer {
        name: node.attr("name").unwrap_or_default().to_owned(),
        kind,
    })
}

/// Reads a Tiled TMX map into the format-agnostic representation.
pub fn decode_map_file_to_ir(path: &Path) -> Result<IrMap, MapError> {
    if !has_extension(path, "tmx") {
        return Err(MapError::FormatUnsupported(path.to_path_buf()));
    }

    let root = read_xml(path)?;
    if root.name != "map" {
        return Err(MapError::MapData(format!(
            "{}: expected <map> root, found <{}>",
            path.display(),
            root.name
        )));
    }

    let map_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    let tilesets = root
        .children("tileset")
        .map(|ts| tileset_to_ir(ts, &map_dir))
        .collect::<Result<Vec<_>, _>>()?;

    let layers = root
        .children
        .iter()
        .filter(|c| LAYER_ELEMENTS.contains(&c.name.as_str()))
        .enumerate()
        .map(|(i, node)| layer_to_ir(i, node))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IrMap {
        tile_w: root.attr_or("tilewidth", 16)?,
        tile_h: root.attr_or("tileheight", 16)?,
        width: root.attr_or("width", 0)?,
        tilesets,
        layers,
    })
}

/// Parser for Tiled `.tmx` maps.
pub struct TmxMapParser {
    atlases: Rc<dyn AtlasLoader>,
    options: LoadOptions,
}

impl TmxMapParser {
    /// A parser extracting tiles through `atlases`.
    pub fn new(atlases: Rc<dyn AtlasLoader>, options: LoadOptions) -> Self {
        TmxMapParser { atlases, options }
    }
}

impl MapParser for TmxMapParser {
    fn supports_format(&self, path: &Path) -> bool {
        has_extension(path, "tmx")
    }

    fn load_map(&self, map_path: &Path, assets_path: &Path) -> Result<LoadedMap, MapError> {
        let ir = decode_map_file_to_ir(map_path)?;
        load_from_ir(&ir, map_path, assets_path, self.atlases.as_ref(), &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::payload::tests::zlib_base64;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir() -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock went backwards")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("tiled_scene_tmx_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    fn write_map(dir: &Path, data: &str) -> PathBuf {
        let path = dir.join("map.tmx");
        let doc = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="2" height="2" tilewidth="16" tileheight="16">
 <tileset firstgid="1" name="tiles" tilewidth="16" tileheight="16">
  <image source="tiles.png" width="32" height="16"/>
  <tile id="0">
   <objectgroup draworder="index">
    <object id="1" x="1.5" y="2" width="14" height="12"/>
   </objectgroup>
  </tile>
  <tile id="1">
   <animation>
    <frame tileid="1" duration="150"/>
    <frame tileid="0" duration="150"/>
   </animation>
  </tile>
 </tileset>
 <objectgroup id="3" name="spawns"/>
 <layer id="1" name="ground" width="2" height="2">
  {}
 </layer>
</map>"#,
            data
        );
        fs::write(&path, doc).expect("failed to write map");
        path
    }

    #[test]
    fn parses_tileset_metadata_and_layer_order() {
        let dir = temp_dir();
        let path = write_map(&dir, r#"<data encoding="csv">1,0,0,2</data>"#);

        let ir = decode_map_file_to_ir(&path).expect("decode");
        assert_eq!((ir.tile_w, ir.tile_h, ir.width), (16, 16, 2));
        assert_eq!(ir.tilesets[0].image, "tiles.png");
        assert_eq!(ir.tilesets[0].tiles[0].hitboxes, vec![IRect::new(1, 2, 14, 12)]);
        assert_eq!(
            ir.tilesets[0].tiles[1].animation,
            vec![
                IrFrame { tile_id: 1, duration: 150 },
                IrFrame { tile_id: 0, duration: 150 }
            ]
        );

        assert_eq!(ir.layers.len(), 2);
        assert!(matches!(&ir.layers[0].kind, IrLayerKind::Other(k) if k == "objectgroup"));
        assert_eq!(ir.layers[1].name, "ground");
        assert!(matches!(&ir.layers[1].kind, IrLayerKind::Tiles { data } if data == &[1, 0, 0, 2]));
    }

    #[test]
    fn csv_base64_and_legacy_tiles_agree() {
        let dir = temp_dir();
        let csv = decode_map_file_to_ir(&write_map(&dir, r#"<data encoding="csv">1,0,0,2</data>"#)).unwrap();

        let encoded = format!(
            r#"<data encoding="base64" compression="zlib">
   {}
  </data>"#,
            zlib_base64(&[1, 0, 0, 2])
        );
        let b64 = decode_map_file_to_ir(&write_map(&dir, &encoded)).unwrap();

        let legacy = decode_map_file_to_ir(&write_map(
            &dir,
            r#"<data><tile gid="1"/><tile/><tile gid="0"/><tile gid="2"/></data>"#,
        ))
        .unwrap();

        for ir in [&b64, &legacy] {
            match (&csv.layers[1].kind, &ir.layers[1].kind) {
                (IrLayerKind::Tiles { data: a }, IrLayerKind::Tiles { data: b }) => assert_eq!(a, b),
                other => panic!("expected tile layers, got {:?}", other),
            }
        }
    }

    #[test]
    fn external_tsx_is_resolved_next_to_map() {
        let dir = temp_dir();
        fs::write(
            dir.join("sheet.tsx"),
            r#"<tileset name="sheet" tilewidth="8" tileheight="8"><image source="sheet.png"/></tileset>"#,
        )
        .unwrap();
        let path = dir.join("map.tmx");
        fs::write(
            &path,
            r#"<map width="1" tilewidth="8" tileheight="8"><tileset firstgid="3" source="sheet.tsx"/><layer name="l"><data encoding="csv">3</data></layer></map>"#,
        )
        .unwrap();

        let ir = decode_map_file_to_ir(&path).unwrap();
        assert_eq!(ir.tilesets[0].first_gid, 3);
        assert_eq!(ir.tilesets[0].image, "sheet.png");
        assert_eq!(ir.tilesets[0].tile_h, Some(8));
    }

    #[test]
    fn unknown_encoding_is_decode_error() {
        let dir = temp_dir();
        let path = write_map(&dir, r#"<data encoding="hex">01</data>"#);
        let err = decode_map_file_to_ir(&path).unwrap_err();
        assert!(matches!(err, MapError::Decode { layer: 1, .. }));
    }

    #[test]
    fn layer_without_data_is_map_data_error() {
        let dir = temp_dir();
        let path = write_map(&dir, "");
        assert!(matches!(decode_map_file_to_ir(&path), Err(MapError::MapData(_))));
    }

    #[test]
    fn tileset_without_image_is_map_data_error() {
        let dir = temp_dir();
        let path = dir.join("map.tmx");
        fs::write(
            &path,
            r#"<map width="1"><tileset firstgid="1"/><layer><data encoding="csv">1</data></layer></map>"#,
        )
        .unwrap();
        assert!(matches!(decode_map_file_to_ir(&path), Err(MapError::MapData(_))));
    }

    #[test]
    fn malformed_xml_is_xml_error() {
        let dir = temp_dir();
        let path = dir.join("map.tmx");
        fs::write(&path, "<map><layer></map>").unwrap();
        assert!(matches!(decode_map_file_to_ir(&path), Err(MapError::Xml { .. })));
    }
}
