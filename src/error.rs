use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while turning a map file into entities.
#[derive(Debug)]
pub enum MapError {
    /// Reading a map, tileset or atlas file failed.
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
    /// A JSON map or tileset is not valid JSON or misses required fields.
    Json {
        /// Offending document.
        path: PathBuf,
        /// Underlying parser failure.
        source: serde_json::Error,
    },
    /// A TMX/TSX document is not well-formed XML.
    Xml {
        /// Offending document.
        path: PathBuf,
        /// Underlying parser failure.
        source: xml::reader::Error,
    },
    /// An atlas image could not be decoded.
    Image {
        /// Atlas path.
        path: PathBuf,
        /// Decoder message.
        reason: String,
    },
    /// No parser accepts the file's extension.
    FormatUnsupported(PathBuf),
    /// Missing or malformed tileset, image reference or required field.
    MapData(String),
    /// A layer payload could not be decoded (bad base64, csv or compression).
    Decode {
        /// Layer index in document order.
        layer: usize,
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Io { path, source } => {
                write!(f, "I/O error reading {}: {}", path.display(), source)
            }
            MapError::Json { path, source } => {
                write!(f, "JSON parse error in {}: {}", path.display(), source)
            }
            MapError::Xml { path, source } => {
                write!(f, "XML parse error in {}: {}", path.display(), source)
            }
            MapError::Image { path, reason } => {
                write!(f, "Cannot decode atlas {}: {}", path.display(), reason)
            }
            MapError::FormatUnsupported(path) => {
                write!(f, "No loader supports the file format: {}", path.display())
            }
            MapError::MapData(msg) => write!(f, "Invalid map data: {}", msg),
            MapError::Decode { layer, reason } => {
                write!(f, "Cannot decode data of layer {}: {}", layer, reason)
            }
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Io { source, .. } => Some(source),
            MapError::Json { source, .. } => Some(source),
            MapError::Xml { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Misuse of a component API. These are programmer errors and are never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// `switch_to`/`pause`/speed accessors named a sequence that was never added.
    UnknownAnimationKey(String),
    /// A raw direction code outside the four cardinal directions.
    InvalidDirection(i32),
    /// An animation sequence was built without frames.
    EmptySequence,
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::UnknownAnimationKey(key) => {
                write!(f, "No animation sequence named '{}'", key)
            }
            ComponentError::InvalidDirection(code) => write!(
                f,
                "{} is not a valid moving direction (expected 0=up, 1=left, 2=down, 3=right)",
                code
            ),
            ComponentError::EmptySequence => {
                write!(f, "An animation sequence needs at least one frame")
            }
        }
    }
}

impl std::error::Error for ComponentError {}
