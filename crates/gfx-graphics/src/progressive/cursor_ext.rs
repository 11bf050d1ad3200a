use gfx_core::ReadCursor;

use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::truncated_err;

pub(crate) fn try_read_slice<'a>(cursor: &mut ReadCursor<'a>, n: usize) -> Result<&'a [u8], GraphicsError> {
    if cursor.len() < n {
        return Err(truncated_err!("progressive"));
    }
    Ok(cursor.read_slice(n))
}

pub(crate) fn try_u8(cursor: &mut ReadCursor<'_>) -> Result<u8, GraphicsError> {
    cursor.try_read_u8().map_err(|_| truncated_err!("progressive"))
}

pub(crate) fn try_u16(cursor: &mut ReadCursor<'_>) -> Result<u16, GraphicsError> {
    cursor.try_read_u16().map_err(|_| truncated_err!("progressive"))
}

pub(crate) fn try_u32(cursor: &mut ReadCursor<'_>) -> Result<u32, GraphicsError> {
    cursor.try_read_u32().map_err(|_| truncated_err!("progressive"))
}
