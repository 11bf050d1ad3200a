//! Hooks for the two decode paths the core routes tiles to but does not implement itself: H.264
//! frames and WebP tiles. A host wires a platform video/image decoder in by implementing
//! [`VideoDelegate`]; [`NullVideoDelegate`] is the default used when none is supplied, so a
//! missing delegate quietly skips the frame instead of failing the whole stream.

/// Platform decode delegate for `WEBP` tiles and `H264` frames. Calls are synchronous from
/// this crate's point of view; a host backed by a genuinely asynchronous platform decoder is
/// expected to block on completion before returning, since the compositor's single-consumer
/// loop requires each message to fully commit before the next begins.
pub trait VideoDelegate {
    /// Decode one WebP tile payload into tightly packed RGBA8 of exactly `width * height * 4`
    /// bytes, or `None` if no delegate is available.
    fn decode_webp(&mut self, data: &[u8], width: u16, height: u16) -> Option<Vec<u8>>;

    /// Decode one H.264 frame (luma + optional chroma NAL) into tightly packed RGBA8 of
    /// exactly `width * height * 4` bytes, or `None` if no delegate is available.
    fn decode_h264(&mut self, nal: &[u8], chroma_nal: &[u8], width: u16, height: u16) -> Option<Vec<u8>>;

    /// Called on `ResetGraphics`: the next frame after a reset must be a key frame. Default
    /// no-op for delegates that don't need reset state.
    fn reset(&mut self) {}
}

/// Default delegate when the host hasn't wired a real video/image decoder: every tile is
/// logged and dropped, leaving the destination surface unchanged.
#[derive(Debug, Default)]
pub struct NullVideoDelegate;

impl VideoDelegate for NullVideoDelegate {
    fn decode_webp(&mut self, _data: &[u8], _width: u16, _height: u16) -> Option<Vec<u8>> {
        debug!("no WebP delegate configured, dropping tile");
        None
    }

    fn decode_h264(&mut self, _nal: &[u8], _chroma_nal: &[u8], _width: u16, _height: u16) -> Option<Vec<u8>> {
        debug!("no H.264 delegate configured, dropping frame");
        None
    }
}
