//! Fixed-height viewport windowing for large ranked feeds.
//!
//! Only the rows returned by [`compute_range`] are materialized; the caller
//! sizes a spacer to [`ViewportWindow::total_height`] and translates the slice
//! by [`ViewportWindow::offset_y`] so it lands at its true scroll position.
//! Variable-height rows are not supported.

use std::ops::Range;

/// Contiguous index range of rows to materialize.
///
/// Stored half-open so an empty range (`0..0`) is distinct from a one-row
/// range (`0..1`). Accessors expose the inclusive `start_index`/`end_index`
/// view used by renderers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportRange {
    /// First materialized index.
    start: usize,
    /// One past the last materialized index.
    end: usize,
}

impl ViewportRange {
    /// The empty range.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// First index to materialize (0 for an empty range).
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start
    }

    /// Last index to materialize, inclusive; `None` for an empty range.
    #[must_use]
    pub const fn end_index(&self) -> Option<usize> {
        if self.end > self.start {
            Some(self.end - 1)
        } else {
            None
        }
    }

    /// True when nothing should be materialized.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Number of rows in the range.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Half-open range suitable for slicing.
    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Rows whose height or container is unusable collapse to the empty range.
fn usable(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// What: Compute which rows must be materialized for the current scroll position.
///
/// Inputs:
/// - `scroll_offset`: Distance scrolled from the top (negative values clamp to 0)
/// - `item_height`: Uniform row height
/// - `container_height`: Visible container height
/// - `item_count`: Number of rows in the ranked feed
/// - `overscan`: Extra rows kept above and below the visible area
///
/// Output:
/// - `ViewportRange` with `start_index = floor(offset / h) - overscan` and
///   `end_index = ceil((offset + container) / h) + overscan`, both clamped to
///   `[0, item_count - 1]`.
///
/// Details:
/// - Pure and idempotent; safe to call on every scroll event.
/// - Empty feeds, non-positive or non-finite heights yield [`ViewportRange::EMPTY`]
///   instead of panicking.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn compute_range(
    scroll_offset: f64,
    item_height: f64,
    container_height: f64,
    item_count: usize,
    overscan: usize,
) -> ViewportRange {
    if item_count == 0 || !usable(item_height) || !usable(container_height) {
        return ViewportRange::EMPTY;
    }
    let offset = if scroll_offset.is_finite() {
        scroll_offset.max(0.0)
    } else {
        0.0
    };
    let last = item_count - 1;
    let first_visible = (offset / item_height).floor() as usize;
    let last_visible = ((offset + container_height) / item_height).ceil() as usize;
    let start = first_visible.saturating_sub(overscan).min(last);
    let end = last_visible.saturating_add(overscan).min(last);
    ViewportRange {
        start,
        end: end.max(start) + 1,
    }
}

/// Fixed-height window configuration shared by every render tick of a feed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportWindow {
    /// Uniform row height.
    pub item_height: f64,
    /// Extra rows rendered beyond each viewport edge.
    pub overscan: usize,
}

impl ViewportWindow {
    /// Create a window for rows of `item_height` with `overscan` extra rows.
    #[must_use]
    pub const fn new(item_height: f64, overscan: usize) -> Self {
        Self {
            item_height,
            overscan,
        }
    }

    /// Range to materialize for the given scroll state.
    #[must_use]
    pub fn range(&self, scroll_offset: f64, container_height: f64, item_count: usize) -> ViewportRange {
        compute_range(
            scroll_offset,
            self.item_height,
            container_height,
            item_count,
            self.overscan,
        )
    }

    /// Scrollable extent as if every row were materialized.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_height(&self, item_count: usize) -> f64 {
        if usable(self.item_height) {
            item_count as f64 * self.item_height
        } else {
            0.0
        }
    }

    /// Translation applied to the materialized slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn offset_y(&self, range: ViewportRange) -> f64 {
        if usable(self.item_height) {
            range.start_index() as f64 * self.item_height
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Reference arithmetic for a mid-list scroll position
    ///
    /// - Input: 100 rows of 50, container 500, overscan 2, offset 1000
    /// - Output: 18..=32, `offset_y` 900, total 5000
    fn compute_range_reference_values() {
        let w = ViewportWindow::new(50.0, 2);
        let r = w.range(1000.0, 500.0, 100);
        assert_eq!(r.start_index(), 18);
        assert_eq!(r.end_index(), Some(32));
        assert_eq!(r.len(), 15);
        assert!((w.offset_y(r) - 900.0).abs() < f64::EPSILON);
        assert!((w.total_height(100) - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    /// What: Empty feed yields an empty range distinct from a single row
    fn compute_range_empty_and_single() {
        let empty = compute_range(0.0, 50.0, 500.0, 0, 2);
        assert!(empty.is_empty());
        assert_eq!(empty.end_index(), None);
        assert!(ViewportWindow::new(50.0, 2).total_height(0).abs() < f64::EPSILON);

        let one = compute_range(0.0, 50.0, 500.0, 1, 2);
        assert!(!one.is_empty());
        assert_eq!(one.start_index(), 0);
        assert_eq!(one.end_index(), Some(0));
    }

    #[test]
    /// What: Invalid geometry clamps to the empty range rather than panicking
    fn compute_range_invalid_inputs() {
        assert!(compute_range(0.0, 0.0, 500.0, 10, 2).is_empty());
        assert!(compute_range(0.0, -5.0, 500.0, 10, 2).is_empty());
        assert!(compute_range(0.0, 50.0, 0.0, 10, 2).is_empty());
        assert!(compute_range(0.0, f64::NAN, 500.0, 10, 2).is_empty());
        let negative_scroll = compute_range(-300.0, 50.0, 100.0, 10, 1);
        assert_eq!(negative_scroll.start_index(), 0);
        assert_eq!(negative_scroll.end_index(), Some(3));
    }

    #[test]
    /// What: Ranges stay within bounds at the top, the end and past the end
    fn compute_range_clamps_to_bounds() {
        let top = compute_range(0.0, 10.0, 35.0, 100, 3);
        assert_eq!(top.as_range(), 0..8);

        let tail = compute_range(950.0, 10.0, 100.0, 100, 3);
        assert_eq!(tail.start_index(), 92);
        assert_eq!(tail.end_index(), Some(99));

        let past = compute_range(5000.0, 10.0, 100.0, 100, 3);
        assert_eq!(past.start_index(), 99);
        assert_eq!(past.end_index(), Some(99));
    }

    #[test]
    /// What: Identical inputs produce identical output
    fn compute_range_is_idempotent() {
        let a = compute_range(1234.5, 17.0, 321.0, 1000, 4);
        for _ in 0..10 {
            assert_eq!(compute_range(1234.5, 17.0, 321.0, 1000, 4), a);
        }
    }
}
