#![cfg_attr(doc, doc = include_str!("../README.md"))]
#![cfg_attr(rustfmt, rustfmt_skip)]

#[cfg(feature = "core")]
#[doc(inline)]
pub use gfx_core as core;

#[cfg(feature = "wire")]
#[doc(inline)]
pub use gfx_wire as wire;

#[cfg(feature = "graphics")]
#[doc(inline)]
pub use gfx_graphics as graphics;

#[cfg(feature = "session")]
#[doc(inline)]
pub use gfx_session as session;
