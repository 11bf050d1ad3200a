use gfx_core::{invalid_field_err, DecodeError};

/// `SURF.pixelFormat`.
///
/// The surface's internal buffer is always RGBA; alpha channel handling is the only
/// difference between the two wire formats (forced opaque for `XRgb`).
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PixelFormat {
    XRgb = 0x20,
    ARgb = 0x21,
}

impl PixelFormat {
    const NAME: &'static str = "PixelFormat";

    /// Whether the alpha channel carried on the wire should be honored, or forced to `0xFF`.
    pub fn carries_alpha(self) -> bool {
        matches!(self, Self::ARgb)
    }
}

impl TryFrom<u16> for PixelFormat {
    type Error = DecodeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0x20 => Ok(Self::XRgb),
            0x21 => Ok(Self::ARgb),
            _ => Err(invalid_field_err!("PixelFormat", "unknown pixel format")),
        }
    }
}

impl From<PixelFormat> for u16 {
    fn from(value: PixelFormat) -> Self {
        value as u16
    }
}
