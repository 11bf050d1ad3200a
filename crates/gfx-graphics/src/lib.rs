//! ClearCodec and Progressive/RemoteFX tile decoders for the RDPGFX client pipeline.
//!
//! Decoders in this crate never own a concrete surface; they write through the
//! [`sink::PixelSink`] trait so that `gfx-session` can supply whatever backs the actual
//! pixel storage.
#![allow(clippy::cast_lossless)] // FIXME: remove
#![allow(clippy::cast_possible_truncation)] // FIXME: remove
#![allow(clippy::cast_possible_wrap)] // FIXME: remove
#![allow(clippy::cast_sign_loss)] // FIXME: remove
#![allow(clippy::as_conversions)] // FIXME: remove

pub mod clear;
pub mod error;
pub mod progressive;
pub mod sink;

pub use error::{GraphicsError, GraphicsErrorExt, GraphicsErrorKind, GraphicsResult};
pub use sink::{FrameBuffer, PixelSink, Rect};

pub use clear::ClearCodecSession;
pub use progressive::{ClipRect, ProgressiveDecoder, CLIP_RECT_BROAD_THRESHOLD, TILE_SIZE};
