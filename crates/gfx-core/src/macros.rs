/// Asserts that the traits support dynamic dispatch.
///
/// From <https://docs.rs/static_assertions/1.1.0/src/static_assertions/assert_obj_safe.rs.html#72-76>
#[macro_export]
macro_rules! assert_obj_safe {
    ($($xs:path),+ $(,)?) => {
        $(const _: Option<&dyn $xs> = None;)+
    };
}

/// Asserts that the type implements _all_ of the given traits.
///
/// From <https://docs.rs/static_assertions/1.1.0/src/static_assertions/assert_impl.rs.html#113-121>
#[macro_export]
macro_rules! assert_impl {
    ($type:ty: $($trait:path),+ $(,)?) => {
        const _: fn() = || {
            // Only callable when `$type` implements all traits in `$($trait)+`.
            fn assert_impl_all<T: ?Sized $(+ $trait)+>() {}
            assert_impl_all::<$type>();
        };
    };
}

/// Bails out of the current function with a `NotEnoughBytes`-kind error when `$buf` holds
/// fewer than `$expected` bytes.
#[macro_export]
macro_rules! ensure_size {
    (in: $buf:ident, size: $expected:expr) => {{
        let received = $buf.len();
        let expected = $expected;
        if received < expected {
            return Err($crate::not_enough_bytes_err(Self::NAME, received, expected));
        }
    }};
}

/// Shorthand for [`ensure_size!`] checking against `Self::FIXED_PART_SIZE`.
#[macro_export]
macro_rules! ensure_fixed_part_size {
    (in: $buf:ident) => {{
        $crate::ensure_size!(in: $buf, size: Self::FIXED_PART_SIZE)
    }};
}

/// Creates an `InvalidField`-kind error for the calling PDU (`Self::NAME` is used as context).
#[macro_export]
macro_rules! invalid_field_err {
    ($field:expr, $reason:expr) => {{
        $crate::invalid_field_err(Self::NAME, $field, $reason)
    }};
}
