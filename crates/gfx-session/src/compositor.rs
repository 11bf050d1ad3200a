//! Compositor / frame loop and back-channel: surfaces, frame lifecycle, ordered dispatch of
//! every inbound GFX message, and `FrameAck` emission.
//!
//! A single `ingest`/`dispatch` pair handles every message kind, leaving the transport layer
//! (DVC channel framing, queueing, retransmit) entirely to the host.

use std::collections::{BTreeMap, BTreeSet};

use gfx_core::{Decode as _, ReadCursor};
use gfx_graphics::{ClearCodecSession, FrameBuffer, PixelSink, ProgressiveDecoder, CLIP_RECT_BROAD_THRESHOLD, TILE_SIZE};
use gfx_wire::{
    CacheToSurface, CapsConfirm, CreateSurface, DeleteSurface, EvictCacheEntry, FrameAck, GfxMessage, H264Frame,
    InitSettings, MapSurfaceToOutput, PixelFormat, QueueDepth, RawTile, ResetGraphics, SolidFill, SurfaceToCache,
    SurfaceToSurface, TaggedTile, TileCodec,
};

use crate::cache::BitmapCache;
use crate::delegate::{NullVideoDelegate, VideoDelegate};
use crate::surface::Surface;

/// Session-scoped compositor: bitmap cache, surface registry, frame loop and back-channel
/// ack emission all in one owner, since every one of those components shares the same
/// single-writer state.
pub struct Compositor {
    surfaces: BTreeMap<u16, Surface>,
    cache: BitmapCache,
    primary: Vec<u8>,
    primary_width: u16,
    primary_height: u16,
    primary_surface_id: Option<u16>,
    primary_origin: (u16, u16),
    current_frame_id: Option<u32>,
    touched: BTreeSet<u16>,
    last_completed_frame_id: Option<u32>,
    total_frames_decoded: u32,
    pending_async_ops: u32,
    clear: ClearCodecSession,
    progressive: ProgressiveDecoder,
    caps: Option<CapsConfirm>,
    settings: Option<InitSettings>,
    video_delegate: Box<dyn VideoDelegate>,
}

impl Compositor {
    /// Create a compositor whose primary output starts at `primary_width x primary_height`,
    /// opaque black, with no surfaces and a null video delegate.
    pub fn new(primary_width: u16, primary_height: u16) -> Self {
        Self::with_video_delegate(primary_width, primary_height, Box::new(NullVideoDelegate))
    }

    pub fn with_video_delegate(primary_width: u16, primary_height: u16, video_delegate: Box<dyn VideoDelegate>) -> Self {
        Self {
            surfaces: BTreeMap::new(),
            cache: BitmapCache::new(),
            primary: opaque_black(primary_width, primary_height),
            primary_width,
            primary_height,
            primary_surface_id: None,
            primary_origin: (0, 0),
            current_frame_id: None,
            touched: BTreeSet::new(),
            last_completed_frame_id: None,
            total_frames_decoded: 0,
            pending_async_ops: 0,
            clear: ClearCodecSession::new(),
            progressive: ProgressiveDecoder::new(),
            caps: None,
            settings: None,
            video_delegate,
        }
    }

    pub fn set_video_delegate(&mut self, video_delegate: Box<dyn VideoDelegate>) {
        self.video_delegate = video_delegate;
    }

    /// Parse one wire-format message and dispatch it. An unparseable message (unknown magic,
    /// truncated payload) is logged and dropped; it never reaches `dispatch`.
    pub fn ingest(&mut self, bytes: &[u8]) -> Option<FrameAck> {
        let mut cursor = ReadCursor::new(bytes);
        match GfxMessage::decode(&mut cursor) {
            Ok(message) => self.dispatch(message),
            Err(err) => {
                warn!(?err, "dropping malformed GFX message");
                None
            }
        }
    }

    /// Dispatch one already-decoded message to its handler. Returns the `FrameAck` to send
    /// back only when the message was an `EndFrame`.
    pub fn dispatch(&mut self, message: GfxMessage) -> Option<FrameAck> {
        match message {
            GfxMessage::CreateSurface(m) => {
                self.create_surface(m);
                None
            }
            GfxMessage::DeleteSurface(m) => {
                self.delete_surface(m);
                None
            }
            GfxMessage::MapSurfaceToOutput(m) => {
                self.map_surface_to_output(m);
                None
            }
            GfxMessage::StartFrame { frame_id } => {
                self.start_frame(frame_id);
                None
            }
            GfxMessage::EndFrame { frame_id } => Some(self.end_frame(frame_id)),
            GfxMessage::Tile(tile) => {
                self.handle_tile(tile);
                None
            }
            GfxMessage::RawTile(tile) => {
                self.handle_raw_tile(tile);
                None
            }
            GfxMessage::SolidFill(m) => {
                self.handle_solid_fill(m);
                None
            }
            GfxMessage::SurfaceToSurface(m) => {
                self.handle_surface_to_surface(m);
                None
            }
            GfxMessage::SurfaceToCache(m) => {
                self.handle_surface_to_cache(m);
                None
            }
            GfxMessage::CacheToSurface(m) => {
                self.handle_cache_to_surface(m);
                None
            }
            GfxMessage::EvictCacheEntry(EvictCacheEntry { cache_slot, .. }) => {
                self.cache.evict(cache_slot);
                None
            }
            GfxMessage::ResetGraphics(m) => {
                self.reset_graphics(m);
                None
            }
            GfxMessage::CapsConfirm(m) => {
                self.caps = Some(m);
                None
            }
            GfxMessage::InitSettings(m) => {
                self.settings = Some(m);
                None
            }
            GfxMessage::H264Frame(m) => {
                self.handle_h264(m);
                None
            }
        }
    }

    // -- Surface registry ----------------------------------------------------------------

    fn create_surface(&mut self, m: CreateSurface) {
        if self.surfaces.remove(&m.surface_id).is_some() {
            debug!(surface_id = m.surface_id, "CreateSurface replacing existing surface");
        }
        self.progressive.delete_surface(m.surface_id);
        self.progressive.create_surface(m.surface_id, m.width, m.height);
        self.surfaces
            .insert(m.surface_id, Surface::new_opaque_black(m.surface_id, m.width, m.height, m.pixel_format));
        debug!(surface_id = m.surface_id, width = m.width, height = m.height, "Surface created");
    }

    fn delete_surface(&mut self, m: DeleteSurface) {
        if self.surfaces.remove(&m.surface_id).is_some() {
            self.progressive.delete_surface(m.surface_id);
            self.touched.remove(&m.surface_id);
            if self.primary_surface_id == Some(m.surface_id) {
                self.primary_surface_id = None;
            }
            debug!(surface_id = m.surface_id, "Surface deleted");
        } else {
            warn!(surface_id = m.surface_id, "DeleteSurface for unknown surface");
        }
    }

    fn map_surface_to_output(&mut self, m: MapSurfaceToOutput) {
        if self.surfaces.contains_key(&m.surface_id) {
            self.primary_surface_id = Some(m.surface_id);
            self.primary_origin = (m.output_x, m.output_y);
            debug!(surface_id = m.surface_id, "Surface mapped to primary output");
        } else {
            warn!(surface_id = m.surface_id, "MapSurfaceToOutput for unknown surface");
        }
    }

    // -- Frame loop -----------------------------------------------------------------------

    fn start_frame(&mut self, frame_id: u32) {
        self.current_frame_id = Some(frame_id);
        self.touched.clear();
    }

    fn end_frame(&mut self, frame_id: u32) -> FrameAck {
        match self.primary_surface_id {
            Some(primary_id) if self.touched.contains(&primary_id) => {
                self.compose_to_primary(primary_id);
            }
            _ => {
                let ids: Vec<u16> = self.touched.iter().copied().collect();
                for id in ids {
                    self.compose_to_primary(id);
                }
            }
        }

        self.total_frames_decoded = self.total_frames_decoded.wrapping_add(1);
        self.last_completed_frame_id = Some(frame_id);
        self.current_frame_id = None;
        self.touched.clear();

        trace!(frame_id, "Sending FrameAcknowledge");
        FrameAck {
            frame_id,
            total_frames_decoded: self.total_frames_decoded,
            queue_depth: QueueDepth::from_u32(self.pending_async_ops),
        }
    }

    fn reset_graphics(&mut self, m: ResetGraphics) {
        let ids: Vec<u16> = self.surfaces.keys().copied().collect();
        for id in ids {
            self.progressive.delete_surface(id);
        }
        self.surfaces.clear();
        self.touched.clear();
        self.current_frame_id = None;
        self.primary_surface_id = None;
        self.primary_origin = (0, 0);
        self.clear.reset_sequence();
        self.video_delegate.reset();

        if self.primary_width != m.width || self.primary_height != m.height {
            self.primary_width = m.width;
            self.primary_height = m.height;
            self.primary = opaque_black(m.width, m.height);
        }

        debug!(width = m.width, height = m.height, "Graphics reset");
    }

    // -- Tile / blit / fill dispatch ------------------------------------------------------

    fn handle_tile(&mut self, tile: TaggedTile) {
        match tile.codec {
            TileCodec::ClearCodec => {
                let mut cursor = ReadCursor::new(&tile.data);
                // `ClearCodecSession::decode` needs `&mut dyn PixelSink` from the same
                // `Compositor` that owns it, so the session is borrowed out for the call
                // instead of aliasing `self` mutably through both paths at once.
                let mut clear = std::mem::take(&mut self.clear);
                let result = clear.decode(
                    &mut cursor,
                    self,
                    tile.surface_id,
                    i32::from(tile.x),
                    i32::from(tile.y),
                    tile.width,
                    tile.height,
                );
                self.clear = clear;
                if let Err(err) = result {
                    warn!(surface_id = tile.surface_id, %err, "ClearCodec tile failed");
                }
            }
            TileCodec::Progressive => match self.progressive.decompress(&tile.data, tile.surface_id, tile.frame_id) {
                Ok(()) => self.composite_progressive_updates(tile.surface_id),
                Err(err) => warn!(surface_id = tile.surface_id, %err, "Progressive tile failed"),
            },
            TileCodec::WebP => {
                self.pending_async_ops = self.pending_async_ops.saturating_add(1);
                let decoded = self.video_delegate.decode_webp(&tile.data, tile.width, tile.height);
                self.pending_async_ops = self.pending_async_ops.saturating_sub(1);
                match decoded {
                    Some(pixels) => {
                        self.blit_rgba_block(tile.surface_id, i32::from(tile.x), i32::from(tile.y), &pixels, u32::from(tile.width), u32::from(tile.height));
                    }
                    None => warn!(surface_id = tile.surface_id, "WebP tile dropped: delegate produced no pixels"),
                }
            }
        }
    }

    fn composite_progressive_updates(&mut self, surface_id: u16) {
        let Some((grid_width, _grid_height)) = self.progressive.grid_size(surface_id) else {
            return;
        };

        for k in 0..self.progressive.updated_tile_count() {
            let Some(index) = self.progressive.updated_tile_index(k) else {
                continue;
            };
            let x_idx = (index % grid_width) as u16;
            let y_idx = (index / grid_width) as u16;

            let Some(tile_rgba) = self.progressive.tile_data(surface_id, x_idx, y_idx) else {
                continue;
            };
            let rects = self.progressive.tile_clip_rects(surface_id, x_idx, y_idx).unwrap_or(&[]).to_vec();

            let tile_x = i32::from(x_idx) * i32::from(TILE_SIZE);
            let tile_y = i32::from(y_idx) * i32::from(TILE_SIZE);

            if rects.is_empty() || rects.len() > CLIP_RECT_BROAD_THRESHOLD {
                self.blit_rgba_block(surface_id, tile_x, tile_y, &tile_rgba, u32::from(TILE_SIZE), u32::from(TILE_SIZE));
                continue;
            }

            for rect in &rects {
                let sub = extract_sub_block(&tile_rgba, TILE_SIZE, TILE_SIZE, rect.x, rect.y, rect.width, rect.height);
                self.blit_rgba_block(
                    surface_id,
                    tile_x + i32::from(rect.x),
                    tile_y + i32::from(rect.y),
                    &sub,
                    u32::from(rect.width),
                    u32::from(rect.height),
                );
            }
        }
    }

    fn handle_raw_tile(&mut self, tile: RawTile) {
        self.blit_rgba_block(tile.surface_id, i32::from(tile.x), i32::from(tile.y), &tile.data, u32::from(tile.width), u32::from(tile.height));
    }

    fn handle_solid_fill(&mut self, m: SolidFill) {
        let [b, g, r, a] = m.color.to_le_bytes();
        self.fill_rect(m.surface_id, i32::from(m.x), i32::from(m.y), u32::from(m.width), u32::from(m.height), [r, g, b, a]);
    }

    fn handle_surface_to_surface(&mut self, m: SurfaceToSurface) {
        self.blit_rect(
            m.dst_surface_id,
            i32::from(m.dst_x),
            i32::from(m.dst_y),
            m.src_surface_id,
            i32::from(m.src_x),
            i32::from(m.src_y),
            u32::from(m.src_width),
            u32::from(m.src_height),
        );
    }

    fn handle_surface_to_cache(&mut self, m: SurfaceToCache) {
        if !self.surfaces.contains_key(&m.surface_id) {
            warn!(surface_id = m.surface_id, "SurfaceToCache for unknown surface");
            return;
        }
        let pixels = self.read_rect(m.surface_id, i32::from(m.x), i32::from(m.y), u32::from(m.width), u32::from(m.height));
        self.cache.insert(m.cache_slot, m.width, m.height, pixels);
    }

    fn handle_cache_to_surface(&mut self, m: CacheToSurface) {
        if !self.surfaces.contains_key(&m.surface_id) {
            warn!(surface_id = m.surface_id, "CacheToSurface for unknown surface");
            return;
        }
        let Some(cached) = self.cache.get(m.cache_slot).map(|e| (e.width, e.height, e.pixels.clone())) else {
            warn!(cache_slot = m.cache_slot, "CacheToSurface miss");
            return;
        };
        let (width, height, pixels) = cached;
        self.blit_rgba_block(m.surface_id, i32::from(m.dst_x), i32::from(m.dst_y), &pixels, u32::from(width), u32::from(height));
    }

    fn handle_h264(&mut self, m: H264Frame) {
        self.pending_async_ops = self.pending_async_ops.saturating_add(1);
        let decoded = self.video_delegate.decode_h264(&m.nal, &m.chroma_nal, m.dst_width, m.dst_height);
        self.pending_async_ops = self.pending_async_ops.saturating_sub(1);
        match decoded {
            Some(pixels) => {
                self.blit_rgba_block(m.surface_id, i32::from(m.dst_x), i32::from(m.dst_y), &pixels, u32::from(m.dst_width), u32::from(m.dst_height));
            }
            None => warn!(surface_id = m.surface_id, "H.264 frame dropped: delegate produced no pixels"),
        }
    }

    // -- Inspection ----------------------------------------------------------------------

    pub fn surface(&self, id: u16) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn primary_pixels(&self) -> &[u8] {
        &self.primary
    }

    pub fn primary_size(&self) -> (u16, u16) {
        (self.primary_width, self.primary_height)
    }

    pub fn current_frame_id(&self) -> Option<u32> {
        self.current_frame_id
    }

    pub fn last_completed_frame_id(&self) -> Option<u32> {
        self.last_completed_frame_id
    }

    pub fn total_frames_decoded(&self) -> u32 {
        self.total_frames_decoded
    }

    pub fn caps(&self) -> Option<&CapsConfirm> {
        self.caps.as_ref()
    }

    pub fn settings(&self) -> Option<&InitSettings> {
        self.settings.as_ref()
    }

    pub fn cache_contains(&self, slot: u16) -> bool {
        self.cache.contains(slot)
    }
}

impl PixelSink for Compositor {
    fn surface_size(&self, surface_id: u16) -> Option<(u32, u32)> {
        self.surfaces.get(&surface_id).map(|s| (u32::from(s.width), u32::from(s.height)))
    }

    fn blit_rgba_block(&mut self, surface_id: u16, x: i32, y: i32, src: &[u8], src_w: u32, src_h: u32) {
        let Some(surface) = self.surfaces.get_mut(&surface_id) else {
            warn!(surface_id, "blitRGBABlock against unknown surface");
            return;
        };

        let mut fb = FrameBuffer::new(u32::from(surface.width), u32::from(surface.height), &mut surface.pixels);
        if surface.pixel_format.carries_alpha() {
            fb.blit_rgba(x, y, src, src_w, src_h);
        } else {
            let mut opaque = src.to_vec();
            for chunk in opaque.chunks_exact_mut(4) {
                chunk[3] = 0xFF;
            }
            fb.blit_rgba(x, y, &opaque, src_w, src_h);
        }

        self.touched.insert(surface_id);
    }

    fn blit_rect(&mut self, dst_surface: u16, dst_x: i32, dst_y: i32, src_surface: u16, src_x: i32, src_y: i32, w: u32, h: u32) {
        let Some(src) = self.surfaces.get(&src_surface) else {
            warn!(surface_id = src_surface, "blitRect against unknown source surface");
            return;
        };
        // Captured into an owned intermediate buffer before any write happens, so src==dst
        // with overlapping regions behaves exactly like a non-overlapping copy.
        let block = read_rect_raw(&src.pixels, u32::from(src.width), u32::from(src.height), src_x, src_y, w, h);
        self.blit_rgba_block(dst_surface, dst_x, dst_y, &block, w, h);
    }

    fn read_rect(&self, surface_id: u16, x: i32, y: i32, w: u32, h: u32) -> Vec<u8> {
        match self.surfaces.get(&surface_id) {
            Some(surface) => read_rect_raw(&surface.pixels, u32::from(surface.width), u32::from(surface.height), x, y, w, h),
            None => vec![0u8; (w as usize) * (h as usize) * 4],
        }
    }

    fn fill_rect(&mut self, surface_id: u16, x: i32, y: i32, w: u32, h: u32, rgba: [u8; 4]) {
        let Some(surface) = self.surfaces.get_mut(&surface_id) else {
            warn!(surface_id, "fillRect against unknown surface");
            return;
        };

        let mut color = rgba;
        if !surface.pixel_format.carries_alpha() {
            color[3] = 0xFF;
        }

        let mut fb = FrameBuffer::new(u32::from(surface.width), u32::from(surface.height), &mut surface.pixels);
        fb.fill(x, y, w, h, color);

        self.touched.insert(surface_id);
    }

    fn compose_to_primary(&mut self, surface_id: u16) {
        let Some(surface) = self.surfaces.get(&surface_id) else {
            warn!(surface_id, "composeToPrimary against unknown surface");
            return;
        };

        let (origin_x, origin_y) = if Some(surface_id) == self.primary_surface_id {
            self.primary_origin
        } else {
            (0, 0)
        };
        let (width, height) = (u32::from(surface.width), u32::from(surface.height));
        let block = surface.pixels.clone();

        let mut fb = FrameBuffer::new(u32::from(self.primary_width), u32::from(self.primary_height), &mut self.primary);
        fb.blit_rgba(i32::from(origin_x), i32::from(origin_y), &block, width, height);
    }
}

fn opaque_black(width: u16, height: u16) -> Vec<u8> {
    let mut pixels = vec![0u8; usize::from(width) * usize::from(height) * 4];
    for chunk in pixels.chunks_exact_mut(4) {
        chunk[3] = 0xFF;
    }
    pixels
}

/// Clip `(x, y, w, h)` against a `buf_w x buf_h` source buffer and copy the overlapping
/// region into a `w * h * 4`-byte output, zero-filling whatever fell outside.
fn read_rect_raw(pixels: &[u8], buf_w: u32, buf_h: u32, x: i32, y: i32, w: u32, h: u32) -> Vec<u8> {
    let mut out = vec![0u8; (w as usize) * (h as usize) * 4];
    if w == 0 || h == 0 || buf_w == 0 || buf_h == 0 {
        return out;
    }

    let (src_x, dst_off_x) = if x < 0 {
        let off = x.unsigned_abs();
        if off >= w {
            return out;
        }
        (0u32, off)
    } else {
        let src_x = x as u32;
        if src_x >= buf_w {
            return out;
        }
        (src_x, 0u32)
    };
    let (src_y, dst_off_y) = if y < 0 {
        let off = y.unsigned_abs();
        if off >= h {
            return out;
        }
        (0u32, off)
    } else {
        let src_y = y as u32;
        if src_y >= buf_h {
            return out;
        }
        (src_y, 0u32)
    };

    let copy_w = (w - dst_off_x).min(buf_w - src_x);
    let copy_h = (h - dst_off_y).min(buf_h - src_y);
    if copy_w == 0 || copy_h == 0 {
        return out;
    }

    for row in 0..copy_h {
        let src_start = (((src_y + row) * buf_w + src_x) * 4) as usize;
        let dst_start = (((dst_off_y + row) * w + dst_off_x) * 4) as usize;
        let len = (copy_w * 4) as usize;
        out[dst_start..dst_start + len].copy_from_slice(&pixels[src_start..src_start + len]);
    }

    out
}

/// Extract a `w x h` rectangle at tile-local `(x, y)` out of a `TILE_SIZE x TILE_SIZE` RGBA
/// buffer, clipped to the tile bounds (clip rects are attacker/server controlled, never
/// trusted to fit).
fn extract_sub_block(tile: &[u8], tile_w: u16, tile_h: u16, x: u16, y: u16, w: u16, h: u16) -> Vec<u8> {
    read_rect_raw(tile, u32::from(tile_w), u32::from(tile_h), i32::from(x), i32::from(y), u32::from(w), u32::from(h))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(compositor: &mut Compositor, id: u16, w: u16, h: u16) {
        compositor.dispatch(GfxMessage::CreateSurface(CreateSurface {
            surface_id: id,
            width: w,
            height: h,
            pixel_format: PixelFormat::XRgb,
        }));
    }

    #[test]
    fn create_surface_is_opaque_black() {
        let mut compositor = Compositor::new(4, 4);
        create(&mut compositor, 1, 4, 4);
        let surface = compositor.surface(1).unwrap();
        assert!(surface.pixels().chunks_exact(4).all(|p| p == [0, 0, 0, 0xFF]));
    }

    #[test]
    fn scenario_s1_create_fill_frame() {
        let mut compositor = Compositor::new(4, 4);
        create(&mut compositor, 1, 4, 4);
        compositor.dispatch(GfxMessage::MapSurfaceToOutput(MapSurfaceToOutput {
            surface_id: 1,
            output_x: 0,
            output_y: 0,
        }));
        compositor.dispatch(GfxMessage::StartFrame { frame_id: 7 });
        compositor.dispatch(GfxMessage::SolidFill(SolidFill {
            frame_id: 7,
            surface_id: 1,
            x: 0,
            y: 0,
            width: 4,
            height: 4,
            color: 0x00FF_8040,
        }));
        let ack = compositor.dispatch(GfxMessage::EndFrame { frame_id: 7 }).unwrap();

        assert_eq!(ack.frame_id, 7);
        assert_eq!(ack.total_frames_decoded, 1);
        assert!(compositor.primary_pixels().chunks_exact(4).all(|p| p == [0xFF, 0x80, 0x40, 0xFF]));
    }

    #[test]
    fn scenario_s2_cache_survives_delete() {
        let mut compositor = Compositor::new(2, 2);
        create(&mut compositor, 1, 2, 2);
        compositor.dispatch(GfxMessage::SolidFill(SolidFill {
            frame_id: 1,
            surface_id: 1,
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            color: 0x00FF_FFFF,
        }));
        compositor.dispatch(GfxMessage::SurfaceToCache(SurfaceToCache {
            frame_id: 1,
            surface_id: 1,
            cache_slot: 5,
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        }));
        compositor.dispatch(GfxMessage::DeleteSurface(DeleteSurface { surface_id: 1 }));
        create(&mut compositor, 2, 2, 2);
        compositor.dispatch(GfxMessage::CacheToSurface(CacheToSurface {
            frame_id: 2,
            surface_id: 2,
            cache_slot: 5,
            dst_x: 0,
            dst_y: 0,
        }));

        let surface = compositor.surface(2).unwrap();
        assert!(surface.pixels().chunks_exact(4).all(|p| p == [0xFF, 0xFF, 0xFF, 0xFF]));
    }

    #[test]
    fn scenario_s3_reset_graphics_preserves_cache_resizes_primary() {
        let mut compositor = Compositor::new(2, 2);
        create(&mut compositor, 1, 2, 2);
        compositor.dispatch(GfxMessage::SolidFill(SolidFill {
            frame_id: 1,
            surface_id: 1,
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            color: 0x00FF_FFFF,
        }));
        compositor.dispatch(GfxMessage::SurfaceToCache(SurfaceToCache {
            frame_id: 1,
            surface_id: 1,
            cache_slot: 5,
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        }));

        compositor.dispatch(GfxMessage::ResetGraphics(ResetGraphics { width: 8, height: 8 }));
        assert_eq!(compositor.primary_size(), (8, 8));
        assert!(compositor.primary_pixels().chunks_exact(4).all(|p| p == [0, 0, 0, 0xFF]));
        assert!(compositor.surface(1).is_none());
        assert!(compositor.cache_contains(5));

        create(&mut compositor, 3, 8, 8);
        compositor.dispatch(GfxMessage::CacheToSurface(CacheToSurface {
            frame_id: 3,
            surface_id: 3,
            cache_slot: 5,
            dst_x: 1,
            dst_y: 1,
        }));

        let surface = compositor.surface(3).unwrap();
        let pixels = surface.pixels();
        let idx = ((1 * 8 + 1) * 4) as usize;
        assert_eq!(&pixels[idx..idx + 4], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn scenario_s5_self_blit_reads_before_writing() {
        let mut compositor = Compositor::new(4, 4);
        create(&mut compositor, 1, 4, 4);

        // pixel(x, y) = (x + y) gray gradient
        for y in 0..4u16 {
            for x in 0..4u16 {
                let v = (x + y) as u8;
                compositor.fill_rect(1, i32::from(x), i32::from(y), 1, 1, [v, v, v, 0xFF]);
            }
        }
        let before_2_2 = compositor.surface(1).unwrap().pixels()[((2 * 4 + 2) * 4) as usize];

        compositor.dispatch(GfxMessage::SurfaceToSurface(SurfaceToSurface {
            frame_id: 1,
            src_surface_id: 1,
            dst_surface_id: 1,
            src_x: 0,
            src_y: 0,
            src_width: 3,
            src_height: 3,
            dst_x: 1,
            dst_y: 1,
        }));

        let surface = compositor.surface(1).unwrap();
        let idx = ((3 * 4 + 3) * 4) as usize;
        assert_eq!(surface.pixels()[idx], before_2_2);
    }

    #[test]
    fn unknown_surface_tile_ops_are_no_ops() {
        let mut compositor = Compositor::new(2, 2);
        create(&mut compositor, 1, 2, 2);
        let before = compositor.surface(1).unwrap().pixels().to_vec();

        compositor.dispatch(GfxMessage::SolidFill(SolidFill {
            frame_id: 1,
            surface_id: 99,
            x: 0,
            y: 0,
            width: 2,
            height: 2,
            color: 0xFFFF_FFFF,
        }));

        assert_eq!(compositor.surface(1).unwrap().pixels(), before.as_slice());
    }

    #[test]
    fn frame_acks_are_strictly_monotonic() {
        let mut compositor = Compositor::new(1, 1);
        compositor.dispatch(GfxMessage::StartFrame { frame_id: 1 });
        let ack1 = compositor.dispatch(GfxMessage::EndFrame { frame_id: 1 }).unwrap();
        compositor.dispatch(GfxMessage::StartFrame { frame_id: 2 });
        let ack2 = compositor.dispatch(GfxMessage::EndFrame { frame_id: 2 }).unwrap();
        assert!(ack2.total_frames_decoded > ack1.total_frames_decoded);
    }
}
