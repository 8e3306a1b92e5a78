//! Reconciliation of one axis across two grids with equal cell size but
//! independent alignment.
//!
//! Tiles produced by the culling engine are aligned to the world bottom on Y,
//! regions are aligned to multiples of their own height. Walking a tile's Y
//! extent split by region height yields every region the tile touches.

/// One aligned split that a half-open range passes through.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AxisSplit {
    /// Split coordinate in the world (`coordinate >> log2(split_size)`)
    pub split: i32,
    /// First covered unit inside the split (inclusive)
    pub start: i32,
    /// Last covered unit inside the split (exclusive)
    pub end: i32,
    /// Units of the input range consumed by earlier splits. Unsigned, since an
    /// `i32` range can be up to `u32::MAX` units long.
    pub processed: u32,
}

impl AxisSplit {
    #[inline]
    pub const fn len(&self) -> i32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether the split is covered from its first to its last unit.
    #[inline]
    pub const fn is_full(&self, split_size: i32) -> bool {
        self.start == 0 && self.end == split_size
    }

    /// Part of the input range, relative to its start, that this split covers.
    #[inline]
    pub fn source_range(&self) -> std::ops::Range<u32> {
        self.processed..self.processed + self.len() as u32
    }
}

/// Iterator over the aligned splits of `[start, end)`.
///
/// Boundaries are computed in `i64` so ranges ending near `i32::MAX` do not
/// overflow while rounding up to the next split. Any `i32` range is accepted,
/// including `[i32::MIN, i32::MAX)`.
#[derive(Clone, Debug)]
pub struct AxisSplits {
    current: i64,
    end: i64,
    split_shift: u32,
    split_mask: i64,
    processed: u32,
}

impl AxisSplits {
    /// `split_size` must be a power of two.
    pub fn new(start: i32, end: i32, split_size: i32) -> Self {
        assert!(
            split_size > 0 && (split_size as u32).is_power_of_two(),
            "split size must be a positive power of two, got {split_size}"
        );

        Self {
            current: start as i64,
            end: end as i64,
            split_shift: split_size.trailing_zeros(),
            split_mask: (split_size - 1) as i64,
            processed: 0,
        }
    }
}

impl Iterator for AxisSplits {
    type Item = AxisSplit;

    fn next(&mut self) -> Option<AxisSplit> {
        if self.current >= self.end {
            return None;
        }

        let next_boundary = (self.current + self.split_mask + 1) & !self.split_mask;
        let next = next_boundary.min(self.end);

        let split_start = (self.current & self.split_mask) as i32;
        let split_length = (next - self.current) as i32;

        let split = AxisSplit {
            split: (self.current >> self.split_shift) as i32,
            start: split_start,
            end: split_start + split_length,
            processed: self.processed,
        };

        self.processed += split_length as u32;
        self.current = next;

        Some(split)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.current >= self.end {
            return (0, Some(0));
        }
        let first = self.current >> self.split_shift;
        let last = (self.end - 1) >> self.split_shift;
        let count = (last - first + 1) as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for AxisSplits {}

impl std::iter::FusedIterator for AxisSplits {}

/// Callback form of [`AxisSplits`]. `start` is inclusive, `end` is exclusive.
#[inline]
pub fn iterate_splits_on_axis<F>(start: i32, end: i32, split_size: i32, mut processor: F)
where
    F: FnMut(AxisSplit),
{
    for split in AxisSplits::new(start, end, split_size) {
        processor(split);
    }
}
