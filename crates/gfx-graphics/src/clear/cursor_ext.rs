use gfx_core::ReadCursor;

use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::truncated_err;

/// Read `n` bytes, failing with a `Truncated` error instead of panicking. The truncation
/// check applies at every sub-region boundary, not just the outer wire framing.
pub(crate) fn try_read_slice<'a>(cursor: &mut ReadCursor<'a>, n: usize) -> Result<&'a [u8], GraphicsError> {
    if cursor.len() < n {
        return Err(truncated_err!("clearcodec"));
    }
    Ok(cursor.read_slice(n))
}

pub(crate) fn try_u8(cursor: &mut ReadCursor<'_>) -> Result<u8, GraphicsError> {
    cursor.try_read_u8().map_err(|_| truncated_err!("clearcodec"))
}

pub(crate) fn try_u16(cursor: &mut ReadCursor<'_>) -> Result<u16, GraphicsError> {
    cursor.try_read_u16().map_err(|_| truncated_err!("clearcodec"))
}

pub(crate) fn try_i16(cursor: &mut ReadCursor<'_>) -> Result<i16, GraphicsError> {
    cursor.try_read_i16().map_err(|_| truncated_err!("clearcodec"))
}

pub(crate) fn try_u32(cursor: &mut ReadCursor<'_>) -> Result<u32, GraphicsError> {
    cursor.try_read_u32().map_err(|_| truncated_err!("clearcodec"))
}

/// Shared "escalating run length" encoding used by both the Residual sub-region and RLEX:
/// a `u8` that reads as-is unless it is `0xFF`, in which case a `u16` follows (used as-is
/// unless it is `0xFFFF`, in which case a `u32` follows and is used as the final value).
pub(crate) fn read_escalating_count(cursor: &mut ReadCursor<'_>) -> Result<u32, GraphicsError> {
    let first = u32::from(try_u8(cursor)?);
    if first != 0xFF {
        return Ok(first);
    }
    let second = u32::from(try_u16(cursor)?);
    if second != 0xFFFF {
        return Ok(second);
    }
    try_u32(cursor)
}
