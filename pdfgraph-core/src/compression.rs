//! Flate encoding for stream data

use crate::error::{PdfError, Result};

/// Name of the filter recorded in a stream dictionary after [`compress`].
pub const FLATE_DECODE: &str = "FlateDecode";

/// Compress data using Flate/Zlib compression
#[cfg(feature = "compression")]
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::CompressionError(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PdfError::CompressionError(e.to_string()))
}

/// Without the `compression` feature streams are always stored raw.
#[cfg(not(feature = "compression"))]
pub fn compress(_data: &[u8]) -> Result<Vec<u8>> {
    Err(PdfError::CompressionError(
        "built without the `compression` feature".to_string(),
    ))
}

/// Whether this build can apply the Flate filter.
pub fn is_available() -> bool {
    cfg!(feature = "compression")
}
