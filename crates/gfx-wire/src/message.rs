use bitflags::bitflags;
use gfx_core::{ensure_fixed_part_size, ensure_size, invalid_field_err, Decode, DecodeResult, ReadCursor};

use crate::pixel_format::PixelFormat;

const MAGIC_LEN: usize = 4;

/// One inbound RDPGFX message, tagged by its 4-byte ASCII magic.
///
/// `Decode::decode` never fails on an unrecognized magic for the whole stream: an unknown
/// tag or a truncated payload is reported by [`GfxMessage::decode`] as a
/// [`gfx_core::DecodeError`], and the caller is expected to log and drop it (the dispatcher
/// lives in the compositor crate, not here).
#[derive(Debug, Clone, PartialEq)]
pub enum GfxMessage {
    CreateSurface(CreateSurface),
    DeleteSurface(DeleteSurface),
    MapSurfaceToOutput(MapSurfaceToOutput),
    StartFrame { frame_id: u32 },
    EndFrame { frame_id: u32 },
    Tile(TaggedTile),
    RawTile(RawTile),
    SolidFill(SolidFill),
    SurfaceToSurface(SurfaceToSurface),
    SurfaceToCache(SurfaceToCache),
    CacheToSurface(CacheToSurface),
    EvictCacheEntry(EvictCacheEntry),
    ResetGraphics(ResetGraphics),
    CapsConfirm(CapsConfirm),
    InitSettings(InitSettings),
    H264Frame(H264Frame),
}

impl GfxMessage {
    const NAME: &'static str = "RDPGFX_MESSAGE";
}

impl<'de> Decode<'de> for GfxMessage {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_size!(in: src, size: MAGIC_LEN);
        let magic = src.peek_slice(MAGIC_LEN);

        match magic {
            b"SURF" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::CreateSurface(CreateSurface::decode(src)?))
            }
            b"DELS" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::DeleteSurface(DeleteSurface::decode(src)?))
            }
            b"MAPS" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::MapSurfaceToOutput(MapSurfaceToOutput::decode(src)?))
            }
            b"STFR" => {
                ensure_size!(in: src, size: MAGIC_LEN + 4);
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::StartFrame {
                    frame_id: src.read_u32(),
                })
            }
            b"ENFR" => {
                ensure_size!(in: src, size: MAGIC_LEN + 4);
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::EndFrame {
                    frame_id: src.read_u32(),
                })
            }
            b"PROG" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::Tile(TaggedTile::decode(TileCodec::Progressive, src)?))
            }
            b"WEBP" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::Tile(TaggedTile::decode(TileCodec::WebP, src)?))
            }
            b"CLRC" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::Tile(TaggedTile::decode(TileCodec::ClearCodec, src)?))
            }
            b"TILE" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::RawTile(RawTile::decode(src)?))
            }
            b"SFIL" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::SolidFill(SolidFill::decode(src)?))
            }
            b"S2SF" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::SurfaceToSurface(SurfaceToSurface::decode(src)?))
            }
            b"S2CH" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::SurfaceToCache(SurfaceToCache::decode(src)?))
            }
            b"C2SF" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::CacheToSurface(CacheToSurface::decode(src)?))
            }
            b"EVCT" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::EvictCacheEntry(EvictCacheEntry::decode(src)?))
            }
            b"RSGR" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::ResetGraphics(ResetGraphics::decode(src)?))
            }
            b"CAPS" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::CapsConfirm(CapsConfirm::decode(src)?))
            }
            b"INIT" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::InitSettings(InitSettings::decode(src)?))
            }
            b"H264" => {
                let _magic = src.read_array::<MAGIC_LEN>();
                Ok(Self::H264Frame(H264Frame::decode(src)?))
            }
            _ => Err(invalid_field_err!("magic", "unknown GFX message tag")),
        }
    }
}

/// `SURF`: createSurface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSurface {
    pub surface_id: u16,
    pub width: u16,
    pub height: u16,
    pub pixel_format: PixelFormat,
}

impl CreateSurface {
    const NAME: &'static str = "SURF";
    const FIXED_PART_SIZE: usize = 2 /* id */ + 2 /* w */ + 2 /* h */ + 2 /* pixelFormat */;
}

impl<'de> Decode<'de> for CreateSurface {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let surface_id = src.read_u16();
        let width = src.read_u16();
        let height = src.read_u16();
        let pixel_format = PixelFormat::try_from(src.read_u16())?;

        Ok(Self {
            surface_id,
            width,
            height,
            pixel_format,
        })
    }
}

/// `DELS`: deleteSurface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSurface {
    pub surface_id: u16,
}

impl DeleteSurface {
    const NAME: &'static str = "DELS";
    const FIXED_PART_SIZE: usize = 2 /* id */;
}

impl<'de> Decode<'de> for DeleteSurface {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            surface_id: src.read_u16(),
        })
    }
}

/// `MAPS`: mapSurfaceToOutput.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSurfaceToOutput {
    pub surface_id: u16,
    pub output_x: u16,
    pub output_y: u16,
}

impl MapSurfaceToOutput {
    const NAME: &'static str = "MAPS";
    const FIXED_PART_SIZE: usize = 2 /* id */ + 2 /* outX */ + 2 /* outY */;
}

impl<'de> Decode<'de> for MapSurfaceToOutput {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            surface_id: src.read_u16(),
            output_x: src.read_u16(),
            output_y: src.read_u16(),
        })
    }
}

/// Which sub-codec produced a [`TaggedTile`]'s payload. `PROG`, `WEBP` and `CLRC` share an
/// identical fixed layout and differ only in how `data` is interpreted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCodec {
    Progressive,
    WebP,
    ClearCodec,
}

/// `PROG`/`WEBP`/`CLRC`: a codec-compressed tile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedTile {
    pub codec: TileCodec,
    pub frame_id: u32,
    pub surface_id: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl TaggedTile {
    const NAME: &'static str = "PROG|WEBP|CLRC";
    const FIXED_PART_SIZE: usize =
        4 /* frameId */ + 2 /* id */ + 2 /* x */ + 2 /* y */ + 2 /* w */ + 2 /* h */ + 4 /* dataSize */;

    fn decode(codec: TileCodec, src: &mut ReadCursor<'_>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let frame_id = src.read_u32();
        let surface_id = src.read_u16();
        let x = src.read_u16();
        let y = src.read_u16();
        let width = src.read_u16();
        let height = src.read_u16();
        let data_size = src.read_u32() as usize;

        ensure_size!(in: src, size: data_size);
        let data = src.read_slice(data_size).to_vec();

        Ok(Self {
            codec,
            frame_id,
            surface_id,
            x,
            y,
            width,
            height,
            data,
        })
    }
}

/// `TILE`: an uncompressed RGBA tile (`width * height * 4` payload bytes, no explicit
/// length field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTile {
    pub frame_id: u32,
    pub surface_id: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl RawTile {
    const NAME: &'static str = "TILE";
    const FIXED_PART_SIZE: usize = 4 /* frameId */ + 2 /* id */ + 2 /* x */ + 2 /* y */ + 2 /* w */ + 2 /* h */;
}

impl<'de> Decode<'de> for RawTile {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let frame_id = src.read_u32();
        let surface_id = src.read_u16();
        let x = src.read_u16();
        let y = src.read_u16();
        let width = src.read_u16();
        let height = src.read_u16();

        let data_size = usize::from(width)
            .checked_mul(usize::from(height))
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| invalid_field_err!("width/height", "tile dimensions overflow"))?;

        ensure_size!(in: src, size: data_size);
        let data = src.read_slice(data_size).to_vec();

        Ok(Self {
            frame_id,
            surface_id,
            x,
            y,
            width,
            height,
            data,
        })
    }
}

/// `SFIL`: solidFill. `color` is the raw little-endian BGRA word as received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidFill {
    pub frame_id: u32,
    pub surface_id: u16,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub color: u32,
}

impl SolidFill {
    const NAME: &'static str = "SFIL";
    const FIXED_PART_SIZE: usize =
        4 /* frameId */ + 2 /* id */ + 2 /* x */ + 2 /* y */ + 2 /* w */ + 2 /* h */ + 4 /* BGRA */;
}

impl<'de> Decode<'de> for SolidFill {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            frame_id: src.read_u32(),
            surface_id: src.read_u16(),
            x: src.read_u16(),
            y: src.read_u16(),
            width: src.read_u16(),
            height: src.read_u16(),
            color: src.read_u32(),
        })
    }
}

/// `S2SF`: surfaceToSurface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceToSurface {
    pub frame_id: u32,
    pub src_surface_id: u16,
    pub dst_surface_id: u16,
    pub src_x: u16,
    pub src_y: u16,
    pub src_width: u16,
    pub src_height: u16,
    pub dst_x: u16,
    pub dst_y: u16,
}

impl SurfaceToSurface {
    const NAME: &'static str = "S2SF";
    const FIXED_PART_SIZE: usize = 4 + 2 + 2 + 2 + 2 + 2 + 2 + 2 + 2;
}

impl<'de> Decode<'de> for SurfaceToSurface {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            frame_id: src.read_u32(),
            src_surface_id: src.read_u16(),
            dst_surface_id: src.read_u16(),
            src_x: src.read_u16(),
            src_y: src.read_u16(),
            src_width: src.read_u16(),
            src_height: src.read_u16(),
            dst_x: src.read_u16(),
            dst_y: src.read_u16(),
        })
    }
}

/// `S2CH`: surfaceToCache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceToCache {
    pub frame_id: u32,
    pub surface_id: u16,
    pub cache_slot: u16,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
}

impl SurfaceToCache {
    const NAME: &'static str = "S2CH";
    const FIXED_PART_SIZE: usize = 4 + 2 + 2 + 2 + 2 + 2 + 2;
}

impl<'de> Decode<'de> for SurfaceToCache {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            frame_id: src.read_u32(),
            surface_id: src.read_u16(),
            cache_slot: src.read_u16(),
            x: src.read_i16(),
            y: src.read_i16(),
            width: src.read_u16(),
            height: src.read_u16(),
        })
    }
}

/// `C2SF`: cacheToSurface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheToSurface {
    pub frame_id: u32,
    pub surface_id: u16,
    pub cache_slot: u16,
    pub dst_x: i16,
    pub dst_y: i16,
}

impl CacheToSurface {
    const NAME: &'static str = "C2SF";
    const FIXED_PART_SIZE: usize = 4 + 2 + 2 + 2 + 2;
}

impl<'de> Decode<'de> for CacheToSurface {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            frame_id: src.read_u32(),
            surface_id: src.read_u16(),
            cache_slot: src.read_u16(),
            dst_x: src.read_i16(),
            dst_y: src.read_i16(),
        })
    }
}

/// `EVCT`: evictCache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictCacheEntry {
    pub frame_id: u32,
    pub cache_slot: u16,
}

impl EvictCacheEntry {
    const NAME: &'static str = "EVCT";
    const FIXED_PART_SIZE: usize = 4 + 2;
}

impl<'de> Decode<'de> for EvictCacheEntry {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            frame_id: src.read_u32(),
            cache_slot: src.read_u16(),
        })
    }
}

/// `RSGR`: resetGraphics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetGraphics {
    pub width: u16,
    pub height: u16,
}

impl ResetGraphics {
    const NAME: &'static str = "RSGR";
    const FIXED_PART_SIZE: usize = 2 + 2;
}

impl<'de> Decode<'de> for ResetGraphics {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            width: src.read_u16(),
            height: src.read_u16(),
        })
    }
}

bitflags! {
    /// `CAPS.flags`. The core stores these for inspection only; they never gate its own
    /// decode/compose behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CapsFlags: u32 {
        const THINCLIENT = 0x01;
        const SMALL_CACHE = 0x02;
        const AVC420_ENABLED = 0x10;
        const AVC_DISABLED = 0x20;
        const AVC_THINCLIENT = 0x40;
    }
}

/// `CAPS`: capsConfirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapsConfirm {
    pub version: u32,
    pub flags: CapsFlags,
}

impl CapsConfirm {
    const NAME: &'static str = "CAPS";
    const FIXED_PART_SIZE: usize = 4 + 4;
}

impl<'de> Decode<'de> for CapsConfirm {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            version: src.read_u32(),
            flags: CapsFlags::from_bits_truncate(src.read_u32()),
        })
    }
}

bitflags! {
    /// Low word of `INIT`'s 64 flag bits (bit positions 0..16, per the session-settings
    /// enumeration).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SessionFlagsLow: u32 {
        const SUPPORT_GRAPHICS_PIPELINE = 1 << 0;
        const GFX_H264 = 1 << 1;
        const GFX_AVC444 = 1 << 2;
        const GFX_AVC444V2 = 1 << 3;
        const GFX_PROGRESSIVE = 1 << 4;
        const GFX_PROGRESSIVE_V2 = 1 << 5;
        const REMOTEFX_CODEC = 1 << 6;
        const NS_CODEC = 1 << 7;
        const JPEG_CODEC = 1 << 8;
        const GFX_PLANAR = 1 << 9;
        const GFX_SMALL_CACHE = 1 << 10;
        const GFX_THINCLIENT = 1 << 11;
        const GFX_SEND_QOE_ACK = 1 << 12;
        const GFX_SUSPEND_FRAME_ACK = 1 << 13;
        const AUDIO_PLAYBACK = 1 << 14;
        const AUDIO_CAPTURE = 1 << 15;
        const REMOTE_CONSOLE_AUDIO = 1 << 16;
    }
}

/// `INIT`: initSettings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitSettings {
    pub color_depth: u32,
    pub flags_low: SessionFlagsLow,
    pub flags_high: u32,
}

impl InitSettings {
    const NAME: &'static str = "INIT";
    const FIXED_PART_SIZE: usize = 4 + 4 + 4;
}

impl<'de> Decode<'de> for InitSettings {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        Ok(Self {
            color_depth: src.read_u32(),
            flags_low: SessionFlagsLow::from_bits_truncate(src.read_u32()),
            flags_high: src.read_u32(),
        })
    }
}

/// `H264`: video frame, carrying both a luma and an (optional, possibly empty) chroma NAL
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct H264Frame {
    pub frame_id: u32,
    pub surface_id: u16,
    pub codec_id: u16,
    pub frame_type: u8,
    pub dst_x: i16,
    pub dst_y: i16,
    pub dst_width: u16,
    pub dst_height: u16,
    pub nal: Vec<u8>,
    pub chroma_nal: Vec<u8>,
}

impl H264Frame {
    const NAME: &'static str = "H264";
    #[rustfmt::skip]
    const FIXED_PART_SIZE: usize =
        4 /* frameId */ + 2 /* id */ + 2 /* codecId */ + 1 /* type */
        + 2 /* dX */ + 2 /* dY */ + 2 /* dW */ + 2 /* dH */
        + 4 /* nalSize */ + 4 /* chromaNalSize */;
}

impl<'de> Decode<'de> for H264Frame {
    fn decode(src: &mut ReadCursor<'de>) -> DecodeResult<Self> {
        ensure_fixed_part_size!(in: src);

        let frame_id = src.read_u32();
        let surface_id = src.read_u16();
        let codec_id = src.read_u16();
        let frame_type = src.read_u8();
        let dst_x = src.read_i16();
        let dst_y = src.read_i16();
        let dst_width = src.read_u16();
        let dst_height = src.read_u16();
        let nal_size = src.read_u32() as usize;
        let chroma_nal_size = src.read_u32() as usize;

        let total = nal_size
            .checked_add(chroma_nal_size)
            .ok_or_else(|| invalid_field_err!("nalSize", "NAL sizes overflow"))?;
        ensure_size!(in: src, size: total);

        let nal = src.read_slice(nal_size).to_vec();
        let chroma_nal = src.read_slice(chroma_nal_size).to_vec();

        Ok(Self {
            frame_id,
            surface_id,
            codec_id,
            frame_type,
            dst_x,
            dst_y,
            dst_width,
            dst_height,
            nal,
            chroma_nal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_bytes(magic: &[u8; 4], fields: &[&[u8]]) -> Vec<u8> {
        let mut buf = magic.to_vec();
        for field in fields {
            buf.extend_from_slice(field);
        }
        buf
    }

    #[test]
    fn decodes_create_surface() {
        let bytes = le_bytes(b"SURF", &[&1u16.to_le_bytes(), &4u16.to_le_bytes(), &4u16.to_le_bytes(), &0x20u16.to_le_bytes()]);
        let mut cursor = ReadCursor::new(&bytes);
        let msg = GfxMessage::decode(&mut cursor).unwrap();
        assert_eq!(
            msg,
            GfxMessage::CreateSurface(CreateSurface {
                surface_id: 1,
                width: 4,
                height: 4,
                pixel_format: PixelFormat::XRgb,
            })
        );
    }

    #[test]
    fn decodes_solid_fill() {
        let bytes = le_bytes(
            b"SFIL",
            &[
                &7u32.to_le_bytes(),
                &1u16.to_le_bytes(),
                &0u16.to_le_bytes(),
                &0u16.to_le_bytes(),
                &4u16.to_le_bytes(),
                &4u16.to_le_bytes(),
                &0x00FF_8040u32.to_le_bytes(),
            ],
        );
        let mut cursor = ReadCursor::new(&bytes);
        let msg = GfxMessage::decode(&mut cursor).unwrap();
        match msg {
            GfxMessage::SolidFill(fill) => {
                assert_eq!(fill.frame_id, 7);
                assert_eq!(fill.color, 0x00FF_8040);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_magic_is_an_error() {
        let bytes = le_bytes(b"ZZZZ", &[]);
        let mut cursor = ReadCursor::new(&bytes);
        assert!(GfxMessage::decode(&mut cursor).is_err());
    }

    #[test]
    fn truncated_payload_is_an_error() {
        let bytes = le_bytes(b"DELS", &[&1u8.to_le_bytes()]);
        let mut cursor = ReadCursor::new(&bytes);
        assert!(GfxMessage::decode(&mut cursor).is_err());
    }

    #[test]
    fn tile_reads_exact_data_size() {
        let payload = vec![1, 2, 3, 4, 5];
        let bytes = le_bytes(
            b"CLRC",
            &[
                &1u32.to_le_bytes(),
                &9u16.to_le_bytes(),
                &0u16.to_le_bytes(),
                &0u16.to_le_bytes(),
                &2u16.to_le_bytes(),
                &2u16.to_le_bytes(),
                &(payload.len() as u32).to_le_bytes(),
                &payload[..],
            ],
        );
        let mut cursor = ReadCursor::new(&bytes);
        let msg = GfxMessage::decode(&mut cursor).unwrap();
        match msg {
            GfxMessage::Tile(tile) => {
                assert_eq!(tile.codec, TileCodec::ClearCodec);
                assert_eq!(tile.data, payload);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
