// src/loader/json_loader.rs
use crate::atlas::AtlasLoader;
use crate::error::MapError;
use crate::geom::IRect;
use crate::ir_map::*;
use crate::loader::payload::decode_encoded;
use crate::loader::{has_extension, load_from_ir, LoadOptions, LoadedMap, MapParser};
use serde::Deserialize;
use serde_json::error::Category;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLayerData {
    Gids(Vec<u32>),
    Encoded(String),
}

fn default_layer_type() -> String {
    "tilelayer".to_owned()
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default = "default_layer_type")]
    kind: String,
    #[serde(default)]
    data: Option<JsonLayerData>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    compression: Option<String>,
}

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default)]
    tilewidth: Option<u32>,
    tileheight: u32,
    width: u32,
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTileset>,
}

/// Embedded tileset, or a reference to an external one through `source`.
#[derive(Deserialize)]
struct JsonTileset {
    #[serde(default)]
    firstgid: Option<u32>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tilewidth: Option<u32>,
    #[serde(default)]
    tileheight: Option<u32>,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Deserialize)]
struct JsonObject {
    #[serde(default)]
    x: f32,
    #[serde(default)]
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
}

#[derive(Deserialize, Default)]
struct JsonObjectGroup {
    #[serde(default)]
    objects: Vec<JsonObject>,
}

#[derive(Deserialize)]
struct JsonFrame {
    tileid: u32,
    duration: u32,
}

#[derive(Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(default)]
    objectgroup: JsonObjectGroup,
    #[serde(default)]
    animation: Vec<JsonFrame>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, MapError> {
    let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&txt).map_err(|source| match source.classify() {
        // well-formed JSON with a missing or mistyped field
        Category::Data => MapError::MapData(format!("{}: {}", path.display(), source)),
        _ => MapError::Json {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn tile_to_ir(tile: JsonTile) -> IrTileMetadata {
    IrTileMetadata {
        id: tile.id,
        hitboxes: tile
            .objectgroup
            .objects
            .iter()
            .map(|o| IRect::new(o.x as i32, o.y as i32, o.width as i32, o.height as i32))
            .collect(),
        animation: tile
            .animation
            .iter()
            .map(|f| IrFrame {
                tile_id: f.tileid,
                duration: f.duration,
            })
            .collect(),
    }
}

fn tileset_to_ir(ts: JsonTileset, map_dir: &Path) -> Result<IrTileset, MapError> {
    let first_gid = ts
        .firstgid
        .ok_or_else(|| MapError::MapData("tileset entry without firstgid".into()))?;

    // External tilesets carry everything but firstgid.
    let ts = match ts.source.clone() {
        Some(source) => {
            if !source.to_ascii_lowercase().ends_with(".json") {
                return Err(MapError::MapData(format!(
                    "External tileset must be JSON: {}",
                    source
                )));
            }
            read_json::<JsonTileset>(&map_dir.join(&source))?
        }
        None => ts,
    };

    let image = ts.image.ok_or_else(|| {
        MapError::MapData(format!("tileset with firstgid {} has no image", first_gid))
    })?;

    Ok(IrTileset {
        first_gid,
        image,
        tile_w: ts.tilewidth,
        tile_h: ts.tileheight,
        tiles: ts.tiles.into_iter().map(tile_to_ir).collect(),
    })
}

fn layer_to_ir(index: usize, l: JsonLayer) -> Result<IrLayer, MapError> {
    let kind = match l.kind.as_str() {
        "tilelayer" => {
            let data = match l.data {
                Some(JsonLayerData::Gids(gids)) => gids,
                Some(JsonLayerData::Encoded(text)) => decode_encoded(
                    index,
                    &text,
                    l.encoding.as_deref().unwrap_or("base64"),
                    l.compression.as_deref().filter(|c| !c.is_empty()),
                )?,
                None => {
                    return Err(MapError::MapData(format!(
                        "tile layer {} '{}' has no data (infinite maps are not supported)",
                        index, l.name
                    )))
                }
            };
            IrLayerKind::Tiles { data }
        }
        other => IrLayerKind::Other(other.to_owned()),
    };
    Ok(IrLayer { name: l.name, kind })
}

/// Reads a Tiled JSON map into the format-agnostic representation.
pub fn decode_map_file_to_ir(path: &Path) -> Result<IrMap, MapError> {
    if !has_extension(path, "json") {
        return Err(MapError::FormatUnsupported(path.to_path_buf()));
    }

    let j: JsonMap = read_json(path)?;

    let map_dir = path
        .parent()
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./"));

    let tilesets = j
        .tilesets
        .into_iter()
        .map(|ts| tileset_to_ir(ts, &map_dir))
        .collect::<Result<Vec<_>, _>>()?;

    let layers = j
        .layers
        .into_iter()
        .enumerate()
        .map(|(i, l)| layer_to_ir(i, l))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(IrMap {
        tile_w: j.tilewidth.unwrap_or(j.tileheight),
        tile_h: j.tileheight,
        width: j.width,
        tilesets,
        layers,
    })
}

/// Parser for Tiled `.json` maps.
pub struct JsonMapParser {
    atlases: Rc<dyn AtlasLoader>,
    options: LoadOptions,
}

impl JsonMapParser {
    /// A parser extracting tiles through `atlases`.
    pub fn new(atlases: Rc<dyn AtlasLoader>, options: LoadOptions) -> Self {
        JsonMapParser { atlases, options }
    }
}

impl MapParser for JsonMapParser {
    fn supports_format(&self, path: &Path) -> bool {
        has_extension(path, "json")
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
        let dir = std::env::temp_dir().join(format!("tiled_scene_json_{nanos}"));
        fs::create_dir_all(&dir).expect("failed to create temp dir");
        dir
    }

    #[test]
    fn parses_tiles_hitboxes_and_animations() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        let map_json = r#"{
          "tileheight": 16,
          "width": 2,
          "layers": [
            {"type":"tilelayer","name":"ground","data":[1,0,2,0]},
            {"type":"objectgroup","name":"spawns","objects":[]}
          ],
          "tilesets": [{
            "image": "tiles.png",
            "firstgid": 1,
            "tiles": [
              {"id":0,"objectgroup":{"objects":[{"x":1,"y":2,"width":14,"height":12.7}]}},
              {"id":1,"animation":[{"tileid":1,"duration":100},{"tileid":0,"duration":50}]}
            ]
          }]
        }"#;
        fs::write(&map_path, map_json).expect("failed to write map");

        let ir = decode_map_file_to_ir(&map_path).expect("decode");
        assert_eq!((ir.tile_w, ir.tile_h, ir.width), (16, 16, 2));
        assert_eq!(ir.layers.len(), 2);
        assert!(matches!(&ir.layers[0].kind, IrLayerKind::Tiles { data } if data == &[1, 0, 2, 0]));
        assert!(matches!(&ir.layers[1].kind, IrLayerKind::Other(k) if k == "objectgroup"));

        let tiles = &ir.tilesets[0].tiles;
        assert_eq!(tiles[0].hitboxes, vec![IRect::new(1, 2, 14, 12)]);
        assert_eq!(tiles[1].animation.len(), 2);
        assert_eq!(tiles[1].animation[1], IrFrame { tile_id: 0, duration: 50 });
    }

    #[test]
    fn base64_layer_data_is_decoded() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        let map_json = format!(
            r#"{{
              "tileheight": 8, "width": 2,
              "layers": [{{"type":"tilelayer","data":"{}","encoding":"base64","compression":"zlib"}}],
              "tilesets": [{{"image":"tiles.png","firstgid":1}}]
            }}"#,
            zlib_base64(&[0, 3, 1, 0])
        );
        fs::write(&map_path, map_json).expect("failed to write map");

        let ir = decode_map_file_to_ir(&map_path).expect("decode");
        assert!(matches!(&ir.layers[0].kind, IrLayerKind::Tiles { data } if data == &[0, 3, 1, 0]));
    }

    #[test]
    fn external_tileset_is_resolved_next_to_map() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        fs::write(
            &map_path,
            r#"{"tileheight":16,"width":1,"layers":[],"tilesets":[{"firstgid":5,"source":"ts.json"}]}"#,
        )
        .unwrap();
        fs::write(
            dir.join("ts.json"),
            r#"{"image":"sheet.png","tilewidth":8,"tileheight":8,"tiles":[]}"#,
        )
        .unwrap();

        let ir = decode_map_file_to_ir(&map_path).expect("decode");
        assert_eq!(ir.tilesets[0].first_gid, 5);
        assert_eq!(ir.tilesets[0].image, "sheet.png");
        assert_eq!(ir.tilesets[0].tile_w, Some(8));
    }

    #[test]
    fn returns_typed_error_for_malformed_json() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        fs::write(&map_path, "{ not json").expect("failed to write map");

        let err = decode_map_file_to_ir(&map_path).expect_err("expected decode error");
        assert!(matches!(err, MapError::Json { .. }));
    }

    #[test]
    fn missing_or_mistyped_fields_are_map_data_errors() {
        let dir = temp_dir();
        let no_width = dir.join("no_width.json");
        fs::write(
            &no_width,
            r#"{"tileheight":16,"layers":[],"tilesets":[{"firstgid":1,"image":"t.png"}]}"#,
        )
        .unwrap();
        let err = decode_map_file_to_ir(&no_width).expect_err("expected decode error");
        assert!(matches!(err, MapError::MapData(ref msg) if msg.contains("width")), "{:?}", err);

        let bad_frame = dir.join("bad_frame.json");
        fs::write(
            &bad_frame,
            r#"{"tileheight":16,"width":1,"layers":[],"tilesets":[{"firstgid":1,"image":"t.png",
                "tiles":[{"id":0,"animation":[{"tileid":"one","duration":10}]}]}]}"#,
        )
        .unwrap();
        let err = decode_map_file_to_ir(&bad_frame).expect_err("expected decode error");
        assert!(matches!(err, MapError::MapData(_)), "{:?}", err);
    }

    #[test]
    fn returns_typed_error_for_missing_tileset_image() {
        let dir = temp_dir();
        let map_path = dir.join("map.json");
        fs::write(
            &map_path,
            r#"{"tileheight":16,"width":1,"layers":[],"tilesets":[{"firstgid":1}]}"#,
        )
        .unwrap();

        let err = decode_map_file_to_ir(&map_path).expect_err("expected decode error");
        assert!(matches!(err, MapError::MapData(_)));
    }

    #[test]
    fn returns_typed_error_for_missing_file() {
        let err = decode_map_file_to_ir(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, MapError::Io { .. }));
    }

    #[test]
    fn rejects_other_extensions() {
        let err = decode_map_file_to_ir(Path::new("map.tmx")).unwrap_err();
        assert!(matches!(err, MapError::FormatUnsupported(_)));
    }
}
