use std::path::Path;

use anyhow::{Context, Result};
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info};

use super::dtype::parse_shape;
use super::header::{parse_literal, PyValue};
use super::model::{Schema, StructuredArray};
use crate::error::CsError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Data starts on a multiple of this many bytes.
const ALIGN: usize = 64;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a whole cs file into memory.
pub fn load_file(path: &Path) -> Result<StructuredArray> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let array = parse_bytes(&bytes).with_context(|| format!("decoding {}", path.display()))?;
    info!(
        "loaded {}: {} rows, {} fields",
        path.display(),
        array.len(),
        array.schema().fields().len()
    );
    Ok(array)
}

/// Write `array` to `path` in the same format it was read from.
/// The path is used as given; any existing file is replaced.
pub fn save_file(path: &Path, array: &StructuredArray) -> Result<()> {
    std::fs::write(path, to_bytes(array))
        .with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {} rows to {}", array.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a serialized structured array.
///
/// Layout: magic, two version bytes, little-endian header length (u16 for
/// 1.x, u32 for 2.x / 3.x), the header dict literal, then the packed rows.
pub fn parse_bytes(bytes: &[u8]) -> Result<StructuredArray, CsError> {
    if bytes.len() < 8 || &bytes[..6] != MAGIC {
        return Err(CsError::BadMagic);
    }
    let (major, minor) = (bytes[6], bytes[7]);
    let (len_bytes, utf8) = match major {
        1 => (2, false),
        2 => (4, false),
        3 => (4, true),
        _ => return Err(CsError::UnsupportedVersion(major, minor)),
    };
    let prefix = 8 + len_bytes;
    if bytes.len() < prefix {
        return Err(CsError::Header("file ends inside the header length".into()));
    }
    let header_len = if len_bytes == 2 {
        LittleEndian::read_u16(&bytes[8..10]) as usize
    } else {
        LittleEndian::read_u32(&bytes[8..12]) as usize
    };
    let data_start = prefix + header_len;
    let raw_header = bytes
        .get(prefix..data_start)
        .ok_or_else(|| CsError::Header("file ends inside the header".into()))?;

    let text = if utf8 {
        std::str::from_utf8(raw_header)
            .map_err(|e| CsError::Header(e.to_string()))?
            .to_string()
    } else {
        // latin-1: every byte maps to the code point of the same value
        raw_header.iter().map(|&b| b as char).collect()
    };
    debug!("header (v{major}.{minor}): {}", text.trim_end());

    let header = parse_literal(&text)?;
    let descr = header
        .get("descr")
        .ok_or_else(|| CsError::Header("missing 'descr'".into()))?
        .clone();
    let shape = header
        .get("shape")
        .ok_or_else(|| CsError::Header("missing 'shape'".into()))?;
    let rows = match parse_shape(shape)?.as_slice() {
        [n] => *n,
        dims => {
            return Err(CsError::Header(format!(
                "expected a one-dimensional array, shape has {} dimensions",
                dims.len()
            )))
        }
    };

    let schema = Schema::from_descr(descr)?;
    let expected = rows.checked_mul(schema.itemsize()).ok_or_else(|| {
        CsError::Header(format!("shape ({rows},) is too large for {}-byte rows", schema.itemsize()))
    })?;
    let data = &bytes[data_start..];
    if data.len() < expected {
        return Err(CsError::Truncated {
            expected,
            actual: data.len(),
        });
    }
    StructuredArray::new(schema, rows, data[..expected].to_vec())
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize `array` with its original `descr` and a one-dimensional shape.
pub fn to_bytes(array: &StructuredArray) -> Vec<u8> {
    let header = PyValue::Dict(vec![
        (PyValue::Str("descr".into()), array.schema().descr().clone()),
        (PyValue::Str("fortran_order".into()), PyValue::Bool(false)),
        (
            PyValue::Str("shape".into()),
            PyValue::Tuple(vec![PyValue::Int(array.len() as i64)]),
        ),
    ])
    .to_string();

    let needs_utf8 = !header.is_ascii();
    let short_len = |text_len: usize| padded_len(8 + 2, text_len);
    let (major, len_bytes) = if needs_utf8 {
        (3u8, 4)
    } else if short_len(header.len()) <= u16::MAX as usize {
        (1u8, 2)
    } else {
        (2u8, 4)
    };

    let header_len = padded_len(8 + len_bytes, header.len());
    let mut out = Vec::with_capacity(8 + len_bytes + header_len + array.as_bytes().len());
    out.extend_from_slice(MAGIC);
    out.push(major);
    out.push(0);
    if len_bytes == 2 {
        out.extend_from_slice(&(header_len as u16).to_le_bytes());
    } else {
        out.extend_from_slice(&(header_len as u32).to_le_bytes());
    }
    out.extend_from_slice(header.as_bytes());
    out.resize(8 + len_bytes + header_len - 1, b' ');
    out.push(b'\n');
    out.extend_from_slice(array.as_bytes());
    out
}

/// Header length including space padding and the final newline, such that
/// `prefix + len` is a multiple of [`ALIGN`].
fn padded_len(prefix: usize, text_len: usize) -> usize {
    let unpadded = prefix + text_len + 1;
    let total = unpadded.div_ceil(ALIGN) * ALIGN;
    total - prefix
}
