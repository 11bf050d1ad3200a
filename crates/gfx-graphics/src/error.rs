use core::fmt;

pub type GraphicsResult<T> = Result<T, GraphicsError>;
pub type GraphicsError = gfx_error::Error<GraphicsErrorKind>;

#[non_exhaustive]
#[derive(Debug)]
pub enum GraphicsErrorKind {
    /// Decoder-level invariant violation (palette index out of range, pixel count mismatch,
    /// band height over 52, unknown subcodec id, inconsistent glyph flags, ...).
    Invalid,
    /// ClearCodec `seqNumber` did not match the session's expected next value.
    SequenceMismatch { expected: u8, got: u8 },
    /// The payload ended before a declared sub-region or record was fully read.
    Truncated,
    Reason(String),
}

impl fmt::Display for GraphicsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => write!(f, "decoder invariant violated"),
            Self::SequenceMismatch { expected, got } => {
                write!(f, "sequence mismatch: expected {expected}, got {got}")
            }
            Self::Truncated => write!(f, "truncated payload"),
            Self::Reason(reason) => write!(f, "{reason}"),
        }
    }
}

impl std::error::Error for GraphicsErrorKind {}

pub trait GraphicsErrorExt {
    fn invalid(context: &'static str) -> Self;
    fn sequence_mismatch(context: &'static str, expected: u8, got: u8) -> Self;
    fn truncated(context: &'static str) -> Self;
    fn reason(context: &'static str, reason: impl Into<String>) -> Self;
}

impl GraphicsErrorExt for GraphicsError {
    fn invalid(context: &'static str) -> Self {
        Self::new(context, GraphicsErrorKind::Invalid)
    }

    fn sequence_mismatch(context: &'static str, expected: u8, got: u8) -> Self {
        Self::new(context, GraphicsErrorKind::SequenceMismatch { expected, got })
    }

    fn truncated(context: &'static str) -> Self {
        Self::new(context, GraphicsErrorKind::Truncated)
    }

    fn reason(context: &'static str, reason: impl Into<String>) -> Self {
        Self::new(context, GraphicsErrorKind::Reason(reason.into()))
    }
}

#[macro_export]
macro_rules! invalid_err {
    ($context:expr) => {{
        <$crate::GraphicsError as $crate::GraphicsErrorExt>::invalid($context)
    }};
}

#[macro_export]
macro_rules! truncated_err {
    ($context:expr) => {{
        <$crate::GraphicsError as $crate::GraphicsErrorExt>::truncated($context)
    }};
}

#[macro_export]
macro_rules! reason_err {
    ($context:expr, $($arg:tt)*) => {{
        <$crate::GraphicsError as $crate::GraphicsErrorExt>::reason($context, format!($($arg)*))
    }};
}
