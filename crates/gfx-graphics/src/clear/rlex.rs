//! ClearCodec subcodec 2: RLEX, a palette-coded run/suite bitmap format.

use gfx_core::ReadCursor;

use super::cursor_ext::{try_u16, try_u32, try_u8};
use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::invalid_err;

fn log2_floor(n: u32) -> u32 {
    if n == 0 {
        0
    } else {
        31 - n.leading_zeros()
    }
}

fn mask(bits: u32) -> u32 {
    if bits >= 8 {
        0xFF
    } else {
        (1u32 << bits) - 1
    }
}

/// Decode a palette-coded `width x height` RLEX bitmap into an RGBA8 buffer. `cursor` must be
/// scoped to exactly this record's `bitmapDataByteCount` bytes.
pub(crate) fn decode(cursor: &mut ReadCursor<'_>, width: u16, height: u16) -> Result<Vec<u8>, GraphicsError> {
    let palette_count = try_u8(cursor)?;
    if !(1..=127).contains(&palette_count) {
        return Err(invalid_err!("rlex: paletteCount out of range"));
    }

    let mut palette = Vec::with_capacity(usize::from(palette_count));
    for _ in 0..palette_count {
        let b = try_u8(cursor)?;
        let g = try_u8(cursor)?;
        let r = try_u8(cursor)?;
        palette.push([r, g, b, 0xFF]);
    }

    let num_bits = (log2_floor(u32::from(palette_count) - 1) + 1).min(8);
    let suite_bits = 8 - num_bits;

    let total_pixels = usize::from(width) * usize::from(height);
    let mut out = vec![0u8; total_pixels * 4];
    let mut pos = 0usize;

    while !cursor.is_empty() {
        let tmp = u32::from(try_u8(cursor)?);
        let run_length_byte = try_u8(cursor)?;

        let suite_depth = (tmp >> num_bits) & mask(suite_bits);
        let stop_index = tmp & mask(num_bits);
        if suite_depth > stop_index {
            return Err(invalid_err!("rlex: startIndex underflow"));
        }
        let start_index = stop_index - suite_depth;

        if stop_index >= u32::from(palette_count) {
            return Err(invalid_err!("rlex: palette index out of range"));
        }

        let run_length = if run_length_byte == 0xFF {
            let ext = try_u16(cursor)?;
            if ext == 0xFFFF {
                try_u32(cursor)?
            } else {
                u32::from(ext)
            }
        } else {
            u32::from(run_length_byte)
        };

        let run_color = palette[start_index as usize];
        for _ in 0..run_length {
            write_pixel(&mut out, &mut pos, total_pixels, run_color)?;
        }

        for idx in start_index..=stop_index {
            write_pixel(&mut out, &mut pos, total_pixels, palette[idx as usize])?;
        }
    }

    if pos != total_pixels {
        return Err(invalid_err!("rlex: pixel count mismatch"));
    }

    Ok(out)
}

fn write_pixel(out: &mut [u8], pos: &mut usize, total_pixels: usize, color: [u8; 4]) -> Result<(), GraphicsError> {
    if *pos >= total_pixels {
        return Err(invalid_err!("rlex: pixel count mismatch"));
    }
    out[*pos * 4..*pos * 4 + 4].copy_from_slice(&color);
    *pos += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_palette_run_fills_the_tile() {
        let mut bytes = vec![1u8]; // paletteCount
        bytes.extend_from_slice(&[30, 20, 10]); // BGR -> rgba [10,20,30,255]
        bytes.push(0); // tmp: stopIndex=0, suiteDepth=0
        bytes.push(2); // runLength = 2

        let mut cursor = ReadCursor::new(&bytes);
        let rgba = decode(&mut cursor, 1, 2).unwrap();
        assert_eq!(&rgba[0..4], &[10, 20, 30, 255]);
        assert_eq!(&rgba[4..8], &[10, 20, 30, 255]);
    }

    #[test]
    fn suite_run_steps_through_consecutive_palette_entries() {
        let mut bytes = vec![3u8]; // paletteCount = 3
        bytes.extend_from_slice(&[0, 0, 0]); // palette[0] BGR black
        bytes.extend_from_slice(&[0, 0, 1]); // palette[1] BGR -> rgba [1,0,0,255]
        bytes.extend_from_slice(&[0, 0, 2]); // palette[2] BGR -> rgba [2,0,0,255]
        // numBits = log2_floor(2)+1 = 1+1 = 2; suiteBits = 6
        // tmp: suiteDepth=2 (stepping 0..=2), stopIndex=2 -> tmp = (2<<2)|2 = 10
        bytes.push(10);
        bytes.push(0); // runLength = 0 (no flat run, only the suite)

        let mut cursor = ReadCursor::new(&bytes);
        let rgba = decode(&mut cursor, 3, 1).unwrap();
        assert_eq!(&rgba[0..4], &[0, 0, 0, 255]);
        assert_eq!(&rgba[4..8], &[1, 0, 0, 255]);
        assert_eq!(&rgba[8..12], &[2, 0, 0, 255]);
    }

    #[test]
    fn pixel_count_mismatch_is_an_error() {
        let mut bytes = vec![1u8, 0, 0, 0];
        bytes.push(0);
        bytes.push(1); // only writes 1 pixel, tile wants 2
        let mut cursor = ReadCursor::new(&bytes);
        assert!(decode(&mut cursor, 1, 2).is_err());
    }
}
