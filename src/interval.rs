use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A closed interval `[start, end]` of `u64` values, with `start <= end`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawInterval"))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start: u64,
    end: u64,
}

/// Unvalidated wire form, checked through [`Interval::new`] on deserialization.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawInterval {
    start: u64,
    end: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawInterval> for Interval {
    type Error = Error;

    fn try_from(raw: RawInterval) -> Result<Interval> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Creates the interval `[start, end]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use disjoint_interval_tree::{Error, Interval};
    ///
    /// let interval = Interval::new(3, 7).unwrap();
    /// assert!(interval.contains(3));
    /// assert!(interval.contains(7));
    /// assert!(!interval.contains(8));
    ///
    /// assert_eq!(
    ///     Interval::new(7, 3),
    ///     Err(Error::InvalidInterval { start: 7, end: 3 })
    /// );
    /// ```
    pub fn new(start: u64, end: u64) -> Result<Interval> {
        if start > end {
            return Err(Error::InvalidInterval { start, end });
        }
        Ok(Interval { start, end })
    }

    /// Builds an interval whose bounds are already known to be ordered.
    pub(crate) fn from_ordered(start: u64, end: u64) -> Interval {
        debug_assert!(start <= end);
        Interval { start, end }
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Returns whether `value` lies within the interval, bounds included.
    pub fn contains(&self, value: u64) -> bool {
        self.start <= value && value <= self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{} -- {}]", self.start, self.end)
    }
}
