//! ClearCodec: session-scoped glyph and VBar caches driving the residual/bands/subcodecs
//! composition pipeline.

mod bands;
mod cursor_ext;
mod glyph;
mod nscodec;
mod residual;
mod rlex;
mod vbar;

use gfx_core::ReadCursor;

use self::cursor_ext::{try_read_slice, try_u16, try_u32, try_u8};
use self::glyph::{GlyphCache, GLYPH_MAX_PIXELS};
use self::vbar::{ShortVBarRing, VBarRing};
use crate::error::{GraphicsError, GraphicsErrorExt as _};
use crate::sink::PixelSink;
use crate::{invalid_err, reason_err};

const GLYPH_INDEX: u8 = 0x01;
const GLYPH_HIT: u8 = 0x02;
const CACHE_RESET: u8 = 0x04;

/// Per-client session state for ClearCodec: the sequence-number cursor plus all three caches,
/// the whole of this codec's inter-frame state. One instance is shared across every CLRC tile
/// on a connection; it is never reset except by dropping and recreating it.
pub struct ClearCodecSession {
    seq_number: Option<u8>,
    glyphs: GlyphCache,
    vbars: VBarRing,
    short_vbars: ShortVBarRing,
}

impl Default for ClearCodecSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ClearCodecSession {
    pub fn new() -> Self {
        Self {
            seq_number: None,
            glyphs: GlyphCache::new(),
            vbars: VBarRing::new(),
            short_vbars: ShortVBarRing::new(),
        }
    }

    /// Reset the expected sequence number back to its pristine, unseeded state without
    /// touching the glyph/VBar caches, for `ResetGraphics` handling where the sequence
    /// counter resets but cached glyphs and VBars are preserved.
    pub fn reset_sequence(&mut self) {
        self.seq_number = None;
    }

    /// Decode one CLRC tile payload, writing directly into `surface_id` at
    /// `(dst_x, dst_y)` through `sink`. `width`/`height` are the tile's declared dimensions.
    pub fn decode(
        &mut self,
        cursor: &mut ReadCursor<'_>,
        sink: &mut dyn PixelSink,
        surface_id: u16,
        dst_x: i32,
        dst_y: i32,
        width: u16,
        height: u16,
    ) -> Result<(), GraphicsError> {
        let glyph_flags = try_u8(cursor)?;
        let seq_number = try_u8(cursor)?;

        match self.seq_number {
            Some(expected) if expected != seq_number => {
                return Err(GraphicsError::sequence_mismatch("clearcodec", expected, seq_number));
            }
            _ => {}
        }
        self.seq_number = Some(seq_number.wrapping_add(1));

        if glyph_flags & CACHE_RESET != 0 {
            self.vbars.reset_cursor();
            self.short_vbars.reset_cursor();
        }

        let hit = glyph_flags & GLYPH_HIT != 0;
        let index_flag = glyph_flags & GLYPH_INDEX != 0;
        if hit && !index_flag {
            return Err(invalid_err!("clearcodec: GLYPH_HIT without GLYPH_INDEX"));
        }

        if hit {
            let glyph_index = try_u16(cursor)?;
            let total_pixels = usize::from(width) * usize::from(height);
            let (cached_pixels, pixels) = self
                .glyphs
                .get(glyph_index)
                .ok_or_else(|| invalid_err!("clearcodec: glyph cache miss on HIT"))?;
            if cached_pixels < total_pixels {
                return Err(invalid_err!("clearcodec: cached glyph smaller than destination"));
            }
            sink.blit_rgba_block(surface_id, dst_x, dst_y, pixels, u32::from(width), u32::from(height));
            return Ok(());
        }

        let glyph_index = if index_flag {
            let index = try_u16(cursor)?;
            let total_pixels = usize::from(width) * usize::from(height);
            if total_pixels > GLYPH_MAX_PIXELS {
                return Err(invalid_err!("clearcodec: glyph exceeds size cap"));
            }
            Some(index)
        } else {
            None
        };

        if cursor.len() >= 12 {
            let residual_len = try_u32(cursor)? as usize;
            let bands_len = try_u32(cursor)? as usize;
            let subcodec_len = try_u32(cursor)? as usize;

            if residual_len > 0 {
                let bytes = try_read_slice(cursor, residual_len)?;
                let mut sub = ReadCursor::new(bytes);
                let pixels = residual::decode(&mut sub, width, height)?;
                sink.blit_rgba_block(surface_id, dst_x, dst_y, &pixels, u32::from(width), u32::from(height));
            }

            if bands_len > 0 {
                let bytes = try_read_slice(cursor, bands_len)?;
                let mut sub = ReadCursor::new(bytes);
                bands::decode(&mut sub, &mut self.vbars, &mut self.short_vbars, sink, surface_id, dst_x, dst_y)?;
            }

            if subcodec_len > 0 {
                let bytes = try_read_slice(cursor, subcodec_len)?;
                let mut sub = ReadCursor::new(bytes);
                decode_subcodecs(&mut sub, sink, surface_id, dst_x, dst_y, width, height)?;
            }
        }

        if let Some(index) = glyph_index {
            let captured = sink.read_rect(surface_id, dst_x, dst_y, u32::from(width), u32::from(height));
            let pixel_count = usize::from(width) * usize::from(height);
            self.glyphs.put(index, pixel_count, &captured);
        }

        Ok(())
    }
}

fn decode_subcodecs(
    cursor: &mut ReadCursor<'_>,
    sink: &mut dyn PixelSink,
    surface_id: u16,
    dst_x: i32,
    dst_y: i32,
    tile_w: u16,
    tile_h: u16,
) -> Result<(), GraphicsError> {
    while !cursor.is_empty() {
        let x_start = try_u16(cursor)?;
        let y_start = try_u16(cursor)?;
        let width = try_u16(cursor)?;
        let height = try_u16(cursor)?;
        let bitmap_len = try_u32(cursor)? as usize;
        let subcodec_id = try_u8(cursor)?;

        let x_end = x_start.checked_add(width).ok_or_else(|| invalid_err!("clearcodec subcodecs: overflow"))?;
        let y_end = y_start.checked_add(height).ok_or_else(|| invalid_err!("clearcodec subcodecs: overflow"))?;
        if x_end > tile_w || y_end > tile_h {
            return Err(invalid_err!("clearcodec subcodecs: record exceeds tile bounds"));
        }

        let bytes = try_read_slice(cursor, bitmap_len)?;
        let mut sub = ReadCursor::new(bytes);

        let pixels = match subcodec_id {
            0 => decode_uncompressed(&mut sub, width, height)?,
            1 => nscodec::decode(&mut sub, width, height)?,
            2 => rlex::decode(&mut sub, width, height)?,
            other => return Err(reason_err!("clearcodec subcodecs", "unknown subcodec id {other}")),
        };

        sink.blit_rgba_block(
            surface_id,
            dst_x + i32::from(x_start),
            dst_y + i32::from(y_start),
            &pixels,
            u32::from(width),
            u32::from(height),
        );
    }

    Ok(())
}

fn decode_uncompressed(cursor: &mut ReadCursor<'_>, width: u16, height: u16) -> Result<Vec<u8>, GraphicsError> {
    let total = usize::from(width) * usize::from(height);
    let bytes = try_read_slice(cursor, total * 3)?;
    let mut out = vec![0u8; total * 4];
    for i in 0..total {
        out[i * 4] = bytes[i * 3 + 2];
        out[i * 4 + 1] = bytes[i * 3 + 1];
        out[i * 4 + 2] = bytes[i * 3];
        out[i * 4 + 3] = 0xFF;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSink {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    }

    impl PixelSink for FakeSink {
        fn surface_size(&self, _surface_id: u16) -> Option<(u32, u32)> {
            Some((self.width, self.height))
        }

        fn blit_rgba_block(&mut self, _surface_id: u16, x: i32, y: i32, src: &[u8], src_w: u32, src_h: u32) {
            let (w, h) = (self.width, self.height);
            crate::sink::FrameBuffer::new(w, h, &mut self.pixels).blit_rgba(x, y, src, src_w, src_h);
        }

        fn blit_rect(&mut self, _d: u16, _dx: i32, _dy: i32, _s: u16, _sx: i32, _sy: i32, _w: u32, _h: u32) {}

        fn read_rect(&self, _surface_id: u16, x: i32, y: i32, w: u32, h: u32) -> Vec<u8> {
            let (sw, sh) = (self.width, self.height);
            let mut pixels = self.pixels.clone();
            crate::sink::FrameBuffer::new(sw, sh, &mut pixels).read_rect(x, y, w, h)
        }

        fn fill_rect(&mut self, _s: u16, _x: i32, _y: i32, _w: u32, _h: u32, _rgba: [u8; 4]) {}
        fn compose_to_primary(&mut self, _s: u16) {}
    }

    fn fake_sink() -> FakeSink {
        FakeSink {
            width: 4,
            height: 4,
            pixels: vec![0u8; 4 * 4 * 4],
        }
    }

    #[test]
    fn first_message_seeds_the_sequence_number() {
        let mut session = ClearCodecSession::new();
        let mut sink = fake_sink();
        // header: glyphFlags=0, seqNumber=5; no glyph, no sub-regions
        let bytes = [0u8, 5];
        let mut cursor = ReadCursor::new(&bytes);
        session.decode(&mut cursor, &mut sink, 1, 0, 0, 2, 2).unwrap();
        assert_eq!(session.seq_number, Some(6));
    }

    #[test]
    fn sequence_mismatch_is_an_error() {
        let mut session = ClearCodecSession::new();
        session.seq_number = Some(5);
        let mut sink = fake_sink();
        let bytes = [0u8, 9];
        let mut cursor = ReadCursor::new(&bytes);
        assert!(session.decode(&mut cursor, &mut sink, 1, 0, 0, 2, 2).is_err());
    }

    #[test]
    fn glyph_hit_without_index_is_an_error() {
        let mut session = ClearCodecSession::new();
        let mut sink = fake_sink();
        let bytes = [GLYPH_HIT, 0];
        let mut cursor = ReadCursor::new(&bytes);
        assert!(session.decode(&mut cursor, &mut sink, 1, 0, 0, 2, 2).is_err());
    }

    #[test]
    fn glyph_hit_blits_the_current_messages_shape_not_the_cached_one() {
        let mut session = ClearCodecSession::new();
        let mut sink = fake_sink();

        // Cache a 4x1 glyph directly (bypassing GLYPH_INDEX capture, which is exercised
        // elsewhere) so the HIT below can request a different w x h for the same pixel count.
        session.glyphs.put(7, 4, &[1, 1, 1, 0xFF, 2, 2, 2, 0xFF, 3, 3, 3, 0xFF, 4, 4, 4, 0xFF]);

        // glyphFlags = HIT|INDEX, seqNumber=0, glyphIndex=7; request a 1x4 destination rect,
        // not the 4x1 shape the glyph was cached under.
        let mut bytes = vec![GLYPH_HIT | GLYPH_INDEX, 0];
        bytes.extend_from_slice(&7u16.to_le_bytes());
        let mut cursor = ReadCursor::new(&bytes);

        session.decode(&mut cursor, &mut sink, 1, 0, 0, 1, 4).unwrap();

        // A column of 4 pixels should have been written, in cached pixel order, not a 4-wide row.
        assert_eq!(&sink.pixels[0..4], &[1, 1, 1, 0xFF]);
        assert_eq!(&sink.pixels[4 * 4..4 * 4 + 4], &[2, 2, 2, 0xFF]);
        assert_eq!(&sink.pixels[8 * 4..8 * 4 + 4], &[3, 3, 3, 0xFF]);
        assert_eq!(&sink.pixels[12 * 4..12 * 4 + 4], &[4, 4, 4, 0xFF]);
    }

    #[test]
    fn residual_only_payload_paints_the_tile() {
        let mut session = ClearCodecSession::new();
        let mut sink = fake_sink();
        let mut bytes = vec![0u8, 1]; // glyphFlags=0, seqNumber=1
        bytes.extend_from_slice(&4u32.to_le_bytes()); // residualByteCount
        bytes.extend_from_slice(&0u32.to_le_bytes()); // bandsByteCount
        bytes.extend_from_slice(&0u32.to_le_bytes()); // subcodecByteCount
        bytes.extend_from_slice(&[10, 20, 30, 4]); // one run covering the whole 2x2 tile

        let mut cursor = ReadCursor::new(&bytes);
        session.decode(&mut cursor, &mut sink, 1, 0, 0, 2, 2).unwrap();
        assert_eq!(&sink.pixels[0..4], &[30, 20, 10, 0xFF]);
    }
}
