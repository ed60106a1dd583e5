//! Muscle index selection for batch queries.

use std::ops::{Range, RangeFrom, RangeFull};

use crate::error::{MusculoskeletalError, Result};

/// A contiguous set of muscle indices. Defaults to every muscle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MuscleSelection {
    /// All muscles of the model.
    #[default]
    All,
    /// A single muscle.
    Single(usize),
    /// Muscles `start..end`.
    Range(Range<usize>),
    /// Muscles `start..`.
    From(usize),
}

impl MuscleSelection {
    /// Resolve against a muscle count.
    ///
    /// `All` is `0..count`, empty for a model without muscles. Explicit
    /// selections that are empty, reversed or past the count are rejected
    /// with the first offending index.
    pub fn resolve(&self, count: usize) -> Result<Range<usize>> {
        let range = match self {
            Self::All => return Ok(0..count),
            Self::Single(index) => *index..index.saturating_add(1),
            Self::Range(range) => range.clone(),
            Self::From(start) => *start..count,
        };
        if range.start >= count || range.end > count || range.start >= range.end {
            let index = if range.start >= count || range.start >= range.end {
                range.start
            } else {
                range.end - 1
            };
            return Err(MusculoskeletalError::MuscleIndexOutOfRange { index, count });
        }
        Ok(range)
    }
}

impl From<usize> for MuscleSelection {
    fn from(index: usize) -> Self {
        Self::Single(index)
    }
}

impl From<Range<usize>> for MuscleSelection {
    fn from(range: Range<usize>) -> Self {
        Self::Range(range)
    }
}

impl From<RangeFrom<usize>> for MuscleSelection {
    fn from(range: RangeFrom<usize>) -> Self {
        Self::From(range.start)
    }
}

impl From<RangeFull> for MuscleSelection {
    fn from(_: RangeFull) -> Self {
        Self::All
    }
}
