//! Compositor state machine for the RDPGFX client pipeline: surfaces, bitmap cache, frame
//! lifecycle and ordered message dispatch, and `FrameAck` emission. This is the crate a host
//! embeds; `gfx-wire` and `gfx-graphics` are its building blocks.

#[macro_use]
extern crate tracing;

mod cache;
mod compositor;
mod delegate;
mod surface;

pub use cache::{BitmapCache, CacheEntry};
pub use compositor::Compositor;
pub use delegate::{NullVideoDelegate, VideoDelegate};
pub use surface::Surface;
