//! ClearCodec "bands" sub-region: rectangular runs of VBar columns backed by the full-VBar
//! and short-VBar rings.

use gfx_core::ReadCursor;

use super::cursor_ext::{try_u16, try_u8};
use super::vbar::{ShortVBarRing, VBarRing, VBAR_MAX_HEIGHT};
use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::invalid_err;
use crate::sink::PixelSink;

fn bgr_to_rgba(b: u8, g: u8, r: u8) -> [u8; 4] {
    [r, g, b, 0xFF]
}

/// Decode every band in the sub-region, blitting each composed VBar column directly through
/// `sink` at `(dst_origin_x + x, dst_origin_y + yStart)`.
pub(crate) fn decode(
    cursor: &mut ReadCursor<'_>,
    vbars: &mut VBarRing,
    short_vbars: &mut ShortVBarRing,
    sink: &mut dyn PixelSink,
    surface_id: u16,
    dst_origin_x: i32,
    dst_origin_y: i32,
) -> Result<(), GraphicsError> {
    while !cursor.is_empty() {
        let x_start = try_u16(cursor)?;
        let x_end = try_u16(cursor)?;
        let y_start = try_u16(cursor)?;
        let y_end = try_u16(cursor)?;
        let bkg_b = try_u8(cursor)?;
        let bkg_g = try_u8(cursor)?;
        let bkg_r = try_u8(cursor)?;
        let bkg = bgr_to_rgba(bkg_b, bkg_g, bkg_r);

        if x_end < x_start || y_end < y_start {
            return Err(invalid_err!("clearcodec bands: empty band rectangle"));
        }

        let height = usize::from(y_end - y_start) + 1;
        if height > VBAR_MAX_HEIGHT {
            return Err(invalid_err!("clearcodec bands: band height exceeds 52"));
        }

        for col in x_start..=x_end {
            let header = try_u16(cursor)?;
            let column = decode_vbar_record(cursor, header, vbars, short_vbars, height, bkg)?;

            sink.blit_rgba_block(
                surface_id,
                dst_origin_x + i32::from(col),
                dst_origin_y + i32::from(y_start),
                &column,
                1,
                height as u32,
            );
        }
    }

    Ok(())
}

/// Returns the composed `height`-tall RGBA8 column for a single VBar record.
fn decode_vbar_record(
    cursor: &mut ReadCursor<'_>,
    header: u16,
    vbars: &mut VBarRing,
    short_vbars: &mut ShortVBarRing,
    height: usize,
    bkg: [u8; 4],
) -> Result<Vec<u8>, GraphicsError> {
    if header & 0x8000 != 0 {
        // VBAR_CACHE_HIT: reuse an existing full-VBar entry verbatim, no new insertion.
        let index = header & 0x7FFF;
        let column = match vbars.get(index) {
            Some((_stored_height, pixels)) => pixels.to_vec(),
            None => vec![0u8; height * 4],
        };
        return Ok(column);
    }

    let (y_on, short_pixels): (u8, Vec<u8>) = if header & 0x4000 != 0 {
        // SHORT_VBAR_CACHE_HIT
        let index = header & 0x3FFF;
        let y_on = try_u8(cursor)?;
        let pixels = short_vbars.get(index).map(<[u8]>::to_vec).unwrap_or_default();
        (y_on, pixels)
    } else {
        // SHORT_VBAR_CACHE_MISS
        let y_on = (header & 0xFF) as u8;
        let y_off = ((header >> 8) & 0x3F) as u8;
        if y_off < y_on {
            return Err(invalid_err!("clearcodec bands: vBarYOff < vBarYOn"));
        }
        let count = usize::from(y_off - y_on);
        if count > VBAR_MAX_HEIGHT {
            return Err(invalid_err!("clearcodec bands: short VBar pixel count exceeds 52"));
        }

        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            let b = try_u8(cursor)?;
            let g = try_u8(cursor)?;
            let r = try_u8(cursor)?;
            pixels.extend_from_slice(&bgr_to_rgba(b, g, r));
        }
        short_vbars.push(&pixels);
        (y_on, pixels)
    };

    // Compose the full-height column: background up to yOn, the short fragment (clamped to
    // the band height), then background for the remainder.
    let mut column = Vec::with_capacity(height * 4);
    let y_on = usize::from(y_on).min(height);
    for _ in 0..y_on {
        column.extend_from_slice(&bkg);
    }
    let short_pixel_count = (short_pixels.len() / 4).min(height - y_on);
    column.extend_from_slice(&short_pixels[..short_pixel_count * 4]);
    while column.len() < height * 4 {
        column.extend_from_slice(&bkg);
    }
    column.truncate(height * 4);

    vbars.push(height as u8, &column);

    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSink {
        surfaces: std::collections::HashMap<u16, (u32, u32, Vec<u8>)>,
    }

    impl PixelSink for FakeSink {
        fn surface_size(&self, surface_id: u16) -> Option<(u32, u32)> {
            self.surfaces.get(&surface_id).map(|(w, h, _)| (*w, *h))
        }

        fn blit_rgba_block(&mut self, surface_id: u16, x: i32, y: i32, src: &[u8], src_w: u32, src_h: u32) {
            if let Some((w, h, pixels)) = self.surfaces.get_mut(&surface_id) {
                let mut fb = crate::sink::FrameBuffer::new(*w, *h, pixels);
                fb.blit_rgba(x, y, src, src_w, src_h);
            }
        }

        fn blit_rect(&mut self, _d: u16, _dx: i32, _dy: i32, _s: u16, _sx: i32, _sy: i32, _w: u32, _h: u32) {}

        fn read_rect(&self, surface_id: u16, x: i32, y: i32, w: u32, h: u32) -> Vec<u8> {
            self.surfaces
                .get(&surface_id)
                .map(|(sw, sh, pixels)| {
                    let mut pixels = pixels.clone();
                    crate::sink::FrameBuffer::new(*sw, *sh, &mut pixels).read_rect(x, y, w, h)
                })
                .unwrap_or_else(|| vec![0u8; (w as usize) * (h as usize) * 4])
        }

        fn fill_rect(&mut self, _s: u16, _x: i32, _y: i32, _w: u32, _h: u32, _rgba: [u8; 4]) {}
        fn compose_to_primary(&mut self, _s: u16) {}
    }

    #[test]
    fn cache_miss_then_hit_produce_identical_columns() {
        let mut vbars = VBarRing::new();
        let mut short_vbars = ShortVBarRing::new();
        let mut surfaces = std::collections::HashMap::new();
        surfaces.insert(1u16, (4u32, 4u32, vec![0u8; 4 * 4 * 4]));
        let mut sink = FakeSink { surfaces };

        // band: x 0..=0, y 0..=1, bg=(0,0,0); one VBar, MISS: yOn=0, yOff=2 -> header bits
        let header: u16 = (0 << 8) | 2; // yOn=0 (bits 0..8), yOff=2 (bits 8..14)
        let mut bytes = vec![];
        bytes.extend_from_slice(&0u16.to_le_bytes()); // xStart
        bytes.extend_from_slice(&0u16.to_le_bytes()); // xEnd
        bytes.extend_from_slice(&0u16.to_le_bytes()); // yStart
        bytes.extend_from_slice(&1u16.to_le_bytes()); // yEnd (height 2)
        bytes.extend_from_slice(&[0, 0, 0]); // bg BGR
        bytes.extend_from_slice(&header.to_le_bytes());
        bytes.extend_from_slice(&[9, 8, 7]); // one BGR pixel (count = yOff-yOn = 2)... need 2 pixels
        bytes.extend_from_slice(&[6, 5, 4]);

        let mut cursor = ReadCursor::new(&bytes);
        decode(&mut cursor, &mut vbars, &mut short_vbars, &mut sink, 1, 0, 0).unwrap();

        assert!(vbars.get(0).is_some());
    }
}
