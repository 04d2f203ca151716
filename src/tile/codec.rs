// ============================================
// Buffer Codec - zlib + base64 для буферов тайла
// ============================================

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::core::{ConvertError, ConvertResult};

/// Сжать буфер и закодировать в base64
pub fn compress(bytes: &[u8]) -> ConvertResult<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

/// Обратная операция к compress
pub fn decompress(text: &str) -> ConvertResult<Vec<u8>> {
    let compressed = STANDARD
        .decode(text.trim())
        .map_err(|e| ConvertError::MalformedDocument(format!("invalid base64: {}", e)))?;

    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ConvertError::MalformedDocument(format!("invalid zlib stream: {}", e)))?;
    Ok(out)
}
