//! ClearCodec subcodec 1: NSCodec (YCoCg, optional 4:2:0 chroma subsampling, plane RLE).

use gfx_core::ReadCursor;

use super::cursor_ext::{try_read_slice, try_u16, try_u32, try_u8};
use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::{invalid_err, truncated_err};

fn round_up8(x: u16) -> u16 {
    (x + 7) & !7
}

fn round_up2(x: u16) -> u16 {
    (x + 1) & !1
}

/// Decode one NSCodec-compressed `width x height` tile into an RGBA8 buffer.
pub(crate) fn decode(cursor: &mut ReadCursor<'_>, width: u16, height: u16) -> Result<Vec<u8>, GraphicsError> {
    let y_count = try_u32(cursor)?;
    let co_count = try_u32(cursor)?;
    let cg_count = try_u32(cursor)?;
    let a_count = try_u32(cursor)?;
    let color_loss_level = try_u8(cursor)?;
    if !(1..=7).contains(&color_loss_level) {
        return Err(invalid_err!("nscodec: colorLossLevel out of range"));
    }
    let chroma_subsampling_level = try_u8(cursor)?;
    let _reserved = try_u16(cursor)?;

    let subsampled = chroma_subsampling_level != 0;
    let y_dims = if subsampled { (round_up8(width), height) } else { (width, height) };
    let c_dims = if subsampled {
        (round_up8(width) / 2, round_up2(height) / 2)
    } else {
        (width, height)
    };
    let a_dims = (width, height);

    let y_plane = read_plane(cursor, y_count, usize::from(y_dims.0) * usize::from(y_dims.1))?;
    let co_plane = read_plane(cursor, co_count, usize::from(c_dims.0) * usize::from(c_dims.1))?;
    let cg_plane = read_plane(cursor, cg_count, usize::from(c_dims.0) * usize::from(c_dims.1))?;
    let a_plane = read_plane(cursor, a_count, usize::from(a_dims.0) * usize::from(a_dims.1))?;

    let shift = u32::from(color_loss_level - 1);
    let mut out = vec![0u8; usize::from(width) * usize::from(height) * 4];

    for y in 0..height {
        for x in 0..width {
            let y_idx = usize::from(y) * usize::from(y_dims.0) + usize::from(x);
            let y_val = i32::from(y_plane[y_idx]);

            let (cx, cy) = if subsampled { (x >> 1, y >> 1) } else { (x, y) };
            let c_idx = usize::from(cy) * usize::from(c_dims.0) + usize::from(cx);
            let co = sign_extend_shifted(co_plane[c_idx], shift);
            let cg = sign_extend_shifted(cg_plane[c_idx], shift);

            let r = (y_val + co - cg).clamp(0, 255) as u8;
            let g = (y_val + cg).clamp(0, 255) as u8;
            let b = (y_val - co - cg).clamp(0, 255) as u8;

            let a_idx = usize::from(y) * usize::from(width) + usize::from(x);
            let a = a_plane[a_idx];

            let out_idx = a_idx * 4;
            out[out_idx] = r;
            out[out_idx + 1] = g;
            out[out_idx + 2] = b;
            out[out_idx + 3] = a;
        }
    }

    Ok(out)
}

fn sign_extend_shifted(v: u8, shift: u32) -> i32 {
    i32::from(v.wrapping_shl(shift) as i8)
}

fn read_plane(cursor: &mut ReadCursor<'_>, byte_count: u32, plane_len: usize) -> Result<Vec<u8>, GraphicsError> {
    if byte_count == 0 {
        return Ok(vec![0xFFu8; plane_len]);
    }

    let byte_count = byte_count as usize;
    if byte_count == plane_len {
        return Ok(try_read_slice(cursor, byte_count)?.to_vec());
    }
    if byte_count < plane_len {
        let bytes = try_read_slice(cursor, byte_count)?;
        return rle_decode(bytes, plane_len);
    }

    Err(invalid_err!("nscodec: plane byte count exceeds uncompressed size"))
}

/// NSCodec plane RLE: literal bytes, except a repeated byte pair introduces a run header
/// (a trailing `u8` length, escalating to `u32` when `0xFF`). The stream always ends with
/// exactly 4 verbatim literal bytes.
fn rle_decode(data: &[u8], out_len: usize) -> Result<Vec<u8>, GraphicsError> {
    let mut out = Vec::with_capacity(out_len);
    let mut pos = 0usize;

    while data.len().saturating_sub(pos) > 4 {
        let v = *data.get(pos).ok_or_else(|| truncated_err!("nscodec plane rle"))?;
        let is_run = data.get(pos + 1).copied() == Some(v);

        if is_run {
            pos += 2;
            let k = *data.get(pos).ok_or_else(|| truncated_err!("nscodec plane rle"))?;
            pos += 1;
            let run_len = if k < 0xFF {
                u32::from(k) + 2
            } else {
                let bytes = data.get(pos..pos + 4).ok_or_else(|| truncated_err!("nscodec plane rle"))?;
                pos += 4;
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
            };

            if out.len() + run_len as usize > out_len {
                return Err(invalid_err!("nscodec plane rle: run exceeds plane size"));
            }
            out.resize(out.len() + run_len as usize, v);
        } else {
            out.push(v);
            pos += 1;
        }
    }

    let tail = data.get(pos..).ok_or_else(|| truncated_err!("nscodec plane rle"))?;
    if tail.len() != 4 {
        return Err(invalid_err!("nscodec plane rle: trailing literal count"));
    }
    out.extend_from_slice(tail);

    if out.len() != out_len {
        return Err(invalid_err!("nscodec plane rle: decoded size mismatch"));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flat_gray_tile_without_subsampling() {
        // Y=128 everywhere, Co=Cg=0 everywhere, A=255 everywhere, all planes raw (byte count
        // equals uncompressed size), no subsampling.
        let mut bytes = vec![];
        let plane_len = 2u32 * 2;
        bytes.extend_from_slice(&plane_len.to_le_bytes()); // y byte count
        bytes.extend_from_slice(&plane_len.to_le_bytes()); // co byte count
        bytes.extend_from_slice(&plane_len.to_le_bytes()); // cg byte count
        bytes.extend_from_slice(&plane_len.to_le_bytes()); // a byte count
        bytes.push(1); // colorLossLevel
        bytes.push(0); // chromaSubsamplingLevel = 4:4:4
        bytes.extend_from_slice(&[0, 0]); // reserved
        bytes.extend_from_slice(&[128; 4]); // Y plane
        bytes.extend_from_slice(&[0; 4]); // Co plane
        bytes.extend_from_slice(&[0; 4]); // Cg plane
        bytes.extend_from_slice(&[255; 4]); // A plane

        let mut cursor = ReadCursor::new(&bytes);
        let rgba = decode(&mut cursor, 2, 2).unwrap();
        assert_eq!(&rgba[0..4], &[128, 128, 128, 255]);
    }

    #[test]
    fn zero_byte_count_plane_fills_with_0xff() {
        let mut bytes = vec![];
        bytes.extend_from_slice(&0u32.to_le_bytes()); // y: zero -> fill 0xFF
        bytes.extend_from_slice(&0u32.to_le_bytes()); // co
        bytes.extend_from_slice(&0u32.to_le_bytes()); // cg
        bytes.extend_from_slice(&0u32.to_le_bytes()); // a
        bytes.push(1);
        bytes.push(0);
        bytes.extend_from_slice(&[0, 0]);

        let mut cursor = ReadCursor::new(&bytes);
        let rgba = decode(&mut cursor, 1, 1).unwrap();
        // Y=0xFF=255, Co=Cg=0xFF sign-extended at shift 0 -> -1
        assert_eq!(rgba[3], 0xFF);
    }

    #[test]
    fn plane_rle_round_trips_a_simple_run() {
        // run of 'A' x10 (k=8 -> len=10), then 4 trailing literal bytes 'B','C','D','E'
        let data = [b'A', b'A', 8u8, b'B', b'C', b'D', b'E'];
        let decoded = rle_decode(&data, 14).unwrap();
        assert_eq!(decoded.len(), 14);
        assert_eq!(&decoded[0..10], &[b'A'; 10]);
        assert_eq!(&decoded[10..14], b"BCDE");
    }
}
