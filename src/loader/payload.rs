// Layer payload decoding shared by the JSON and TMX parsers.
use crate::error::MapError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::{GzDecoder, ZlibDecoder};
use std::io::Read;

fn decode_err(layer: usize, reason: impl Into<String>) -> MapError {
    MapError::Decode {
        layer,
        reason: reason.into(),
    }
}

/// Comma separated decimal gids. Whitespace and a trailing comma are tolerated.
pub(crate) fn decode_csv(layer: usize, text: &str) -> Result<Vec<u32>, MapError> {
    text.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<u32>()
                .map_err(|e| decode_err(layer, format!("bad csv gid '{}': {}", tok, e)))
        })
        .collect()
}

/// Base64 text, optionally zlib/gzip compressed, holding little-endian u32 gids.
pub(crate) fn decode_base64(
    layer: usize,
    text: &str,
    compression: Option<&str>,
) -> Result<Vec<u32>, MapError> {
    let compact: String = text.split_whitespace().collect();
    let raw = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| decode_err(layer, format!("invalid base64: {}", e)))?;

    let bytes = match compression.unwrap_or("") {
        "" => raw,
        "zlib" => inflate(layer, ZlibDecoder::new(raw.as_slice()))?,
        "gzip" => inflate(layer, GzDecoder::new(raw.as_slice()))?,
        other => return Err(decode_err(layer, format!("unsupported compression '{}'", other))),
    };

    if bytes.len() % 4 != 0 {
        return Err(decode_err(
            layer,
            format!("payload of {} bytes is not a whole number of gids", bytes.len()),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn inflate(layer: usize, mut reader: impl Read) -> Result<Vec<u8>, MapError> {
    let mut out = Vec::new();
    reader
        .read_to_end(&mut out)
        .map_err(|e| decode_err(layer, format!("corrupt compressed data: {}", e)))?;
    Ok(out)
}

/// Decodes `text` according to a Tiled `encoding`/`compression` pair.
pub(crate) fn decode_encoded(
    layer: usize,
    text: &str,
    encoding: &str,
    compression: Option<&str>,
) -> Result<Vec<u32>, MapError> {
    match encoding {
        "csv" => decode_csv(layer, text),
        "base64" => decode_base64(layer, text, compression),
        other => Err(decode_err(layer, format!("unsupported encoding '{}'", other))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::io::Write;

    fn le_bytes(gids: &[u32]) -> Vec<u8> {
        gids.iter().flat_map(|g| g.to_le_bytes()).collect()
    }

    pub(crate) fn zlib_base64(gids: &[u32]) -> String {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&le_bytes(gids)).unwrap();
        STANDARD.encode(enc.finish().unwrap())
    }

    #[test]
    fn csv_with_newlines_and_trailing_comma() {
        assert_eq!(decode_csv(0, "\n1,2,\n0,3,\n").unwrap(), vec![1, 2, 0, 3]);
        assert!(matches!(decode_csv(2, "1,x"), Err(MapError::Decode { layer: 2, .. })));
    }

    #[test]
    fn base64_plain_zlib_and_gzip_agree() {
        let gids = [1u32, 0, 7, 0x8000_0002];
        let plain = STANDARD.encode(le_bytes(&gids));
        assert_eq!(decode_base64(0, &plain, None).unwrap(), gids);

        assert_eq!(decode_base64(0, &zlib_base64(&gids), Some("zlib")).unwrap(), gids);

        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(&le_bytes(&gids)).unwrap();
        let gz = STANDARD.encode(gz.finish().unwrap());
        assert_eq!(decode_base64(0, &format!("\n   {}\n  ", gz), Some("gzip")).unwrap(), gids);
    }

    #[test]
    fn corrupt_payloads_are_decode_errors() {
        assert!(matches!(decode_base64(1, "%%%", None), Err(MapError::Decode { .. })));
        let not_zlib = STANDARD.encode(b"definitely not zlib");
        assert!(matches!(
            decode_base64(1, &not_zlib, Some("zlib")),
            Err(MapError::Decode { .. })
        ));
        let odd = STANDARD.encode([1u8, 2, 3]);
        assert!(matches!(decode_base64(1, &odd, None), Err(MapError::Decode { .. })));
        assert!(matches!(
            decode_base64(1, &odd, Some("zstd")),
            Err(MapError::Decode { .. })
        ));
        assert!(matches!(decode_encoded(1, "1", "xml", None), Err(MapError::Decode { .. })));
    }
}
