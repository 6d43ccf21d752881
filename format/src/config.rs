//! Limits applied while decoding untrusted input.

use crate::{error::ErrorKind, Error};
use core::ops::{Bound, RangeBounds};

/// Configuration for limiting the range of a value.
///
/// Used to bound lengths read from the wire before anything is allocated for them.
///
/// # Examples
///
/// ```
/// use commonware_format::RangeCfg;
///
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(&500));
/// assert!(!cfg.contains(&2000));
///
/// let at_least_one = RangeCfg::from(1..);
/// assert!(at_least_one.check(0).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg {
    start: Bound<usize>,
    end: Bound<usize>,
}

impl RangeCfg {
    pub fn new(r: impl RangeBounds<usize>) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Accepts every value.
    pub const fn unbounded() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Accepts only `value`.
    pub const fn exact(value: usize) -> Self {
        Self {
            start: Bound::Included(value),
            end: Bound::Included(value),
        }
    }

    /// Returns true if the value is within this range.
    pub fn contains(&self, value: &usize) -> bool {
        RangeBounds::contains(self, value)
    }

    /// Fails with [`ErrorKind::LengthOutOfRange`] if `len` is outside this range.
    pub fn check(&self, len: usize) -> Result<usize, Error> {
        if !self.contains(&len) {
            return Err(ErrorKind::LengthOutOfRange(len).into());
        }
        Ok(len)
    }
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RangeBounds<usize> for RangeCfg {
    fn start_bound(&self) -> Bound<&usize> {
        self.start.as_ref()
    }

    fn end_bound(&self) -> Bound<&usize> {
        self.end.as_ref()
    }
}

macro_rules! impl_from_range {
    ($($range:ty),*) => {
        $(
            impl From<$range> for RangeCfg {
                fn from(r: $range) -> Self {
                    Self::new(r)
                }
            }
        )*
    };
}
impl_from_range!(
    core::ops::Range<usize>,
    core::ops::RangeInclusive<usize>,
    core::ops::RangeFrom<usize>,
    core::ops::RangeTo<usize>,
    core::ops::RangeToInclusive<usize>,
    core::ops::RangeFull
);
