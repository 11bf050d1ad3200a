//! ClearCodec "residual" sub-region: BGR24 + run-length coding into a scratch RGBA buffer.

use gfx_core::ReadCursor;

use super::cursor_ext::{read_escalating_count, try_u8};
use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::invalid_err;

/// Decode exactly `width * height` BGR24-run-length-coded pixels into a fresh RGBA8 buffer.
pub(crate) fn decode(cursor: &mut ReadCursor<'_>, width: u16, height: u16) -> Result<Vec<u8>, GraphicsError> {
    let total_pixels = usize::from(width) * usize::from(height);
    let mut out = vec![0u8; total_pixels * 4];
    let mut written = 0usize;

    while written < total_pixels {
        let b = try_u8(cursor)?;
        let g = try_u8(cursor)?;
        let r = try_u8(cursor)?;
        let run_len = read_escalating_count(cursor)? as usize;

        if written + run_len > total_pixels {
            return Err(invalid_err!("clearcodec residual: pixel count mismatch"));
        }

        for _ in 0..run_len {
            let idx = written * 4;
            out[idx] = r;
            out[idx + 1] = g;
            out[idx + 2] = b;
            out[idx + 3] = 0xFF;
            written += 1;
        }
    }

    if written != total_pixels {
        return Err(invalid_err!("clearcodec residual: pixel count mismatch"));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_single_run_covering_the_whole_tile() {
        let bytes = [10u8, 20, 30, 4]; // b,g,r, runLen=4
        let mut cursor = ReadCursor::new(&bytes);
        let pixels = decode(&mut cursor, 2, 2).unwrap();
        assert_eq!(pixels.len(), 2 * 2 * 4);
        assert_eq!(&pixels[0..4], &[30, 20, 10, 0xFF]);
        assert_eq!(&pixels[12..16], &[30, 20, 10, 0xFF]);
    }

    #[test]
    fn extended_run_length_via_u16() {
        // runLen byte = 0xFF, then u16 = 4 (not 0xFFFF, so used directly)
        let bytes = [1u8, 2, 3, 0xFF, 4, 0];
        let mut cursor = ReadCursor::new(&bytes);
        let pixels = decode(&mut cursor, 2, 2).unwrap();
        assert_eq!(pixels.len(), 16);
    }

    #[test]
    fn mismatched_pixel_count_is_an_error() {
        let bytes = [1u8, 2, 3, 3]; // only 3 pixels for a 2x2 tile
        let mut cursor = ReadCursor::new(&bytes);
        assert!(decode(&mut cursor, 2, 2).is_err());
    }
}
