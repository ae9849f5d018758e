//! Clamp-narrowing of wide authored values into on-wire integer fields.
//!
//! Out-of-range values saturate at the destination bounds. In debug builds a
//! warning naming the context is logged so authoring mistakes surface early.

use log::warn;

/// Integer types an authored `i64` can be narrowed into.
pub trait NarrowTarget: Copy {
    const MIN_I64: i64;
    const MAX_I64: i64;
    const NAME: &'static str;
    fn from_i64_unchecked(v: i64) -> Self;
}

macro_rules! impl_narrow_target {
    ($($t:ty),*) => {
        $(
            impl NarrowTarget for $t {
                const MIN_I64: i64 = <$t>::MIN as i64;
                const MAX_I64: i64 = <$t>::MAX as i64;
                const NAME: &'static str = stringify!($t);
                #[inline]
                fn from_i64_unchecked(v: i64) -> Self {
                    v as $t
                }
            }
        )*
    };
}

impl_narrow_target!(i8, u8, i16, u16, i32, u32);

/// Narrow `value` into `T`, saturating at `T`'s range.
pub fn clamp_narrow<T: NarrowTarget>(value: i64, context: &str) -> T {
    let clamped = value.clamp(T::MIN_I64, T::MAX_I64);
    if clamped != value && cfg!(debug_assertions) {
        warn!(
            "{context}: value {value} outside {} range [{}, {}], clamped to {clamped}",
            T::NAME,
            T::MIN_I64,
            T::MAX_I64
        );
    }
    T::from_i64_unchecked(clamped)
}

/// Narrow a float after rounding toward zero; NaN maps to 0.
pub fn clamp_narrow_f32<T: NarrowTarget>(value: f32, context: &str) -> T {
    if value.is_nan() {
        return clamp_narrow(0, context);
    }
    // `as i64` saturates for out-of-range floats.
    clamp_narrow(value as i64, context)
}
