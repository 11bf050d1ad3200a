//! Tagged message stream decoded and encoded at the RDPGFX client boundary.
//!
//! Every inbound message starts with a 4-byte ASCII magic identifying its shape; decoding
//! is a flat dispatch over that tag.
#![warn(clippy::std_instead_of_core)]
#![allow(clippy::cast_lossless)] // FIXME: remove
#![allow(clippy::cast_possible_truncation)] // FIXME: remove
#![allow(clippy::cast_possible_wrap)] // FIXME: remove
#![allow(clippy::cast_sign_loss)] // FIXME: remove

mod ack;
mod message;
mod pixel_format;

pub use ack::FrameAck;
pub use message::{
    CacheToSurface, CapsConfirm, CapsFlags, CreateSurface, DeleteSurface, EvictCacheEntry, GfxMessage, H264Frame,
    InitSettings, MapSurfaceToOutput, RawTile, ResetGraphics, SessionFlagsLow, SolidFill, SurfaceToCache,
    SurfaceToSurface, TaggedTile, TileCodec,
};
pub use pixel_format::PixelFormat;
