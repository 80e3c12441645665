//! Per-field dropout (defect interval) maps.
//!
//! Line numbers are stored 1-based, as ld-decode writes them, while queries
//! use 0-based field coordinates. [`DropOut::covers`] is the only place the
//! two conventions meet.

use serde::{Deserialize, Serialize};

/// Inclusive column range on one field line flagged as defective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropOut {
    pub start_x: usize,
    pub end_x: usize,
    /// 1-based field line.
    pub field_line: usize,
}

impl DropOut {
    pub fn new(start_x: usize, end_x: usize, field_line: usize) -> Self {
        debug_assert!(start_x <= end_x, "dropout start {start_x} > end {end_x}");
        Self {
            start_x,
            end_x,
            field_line,
        }
    }

    /// True if the 0-based field coordinate `(x, y)` is inside this interval.
    #[inline]
    pub fn covers(&self, x: usize, y: usize) -> bool {
        self.field_line.checked_sub(1) == Some(y) && self.start_x <= x && x <= self.end_x
    }
}

/// Unordered collection of dropouts for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DropOuts {
    items: Vec<DropOut>,
}

impl DropOuts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an interval as-is; merging is left to [`DropOuts::concatenate`].
    pub fn append(&mut self, start_x: usize, end_x: usize, field_line: usize) {
        self.items.push(DropOut::new(start_x, end_x, field_line));
    }

    /// Linear scan; the set is not assumed to be sorted.
    pub fn is_dropout(&self, x: usize, y: usize) -> bool {
        self.items.iter().any(|d| d.covers(x, y))
    }

    /// Merges overlapping or touching intervals on the same line into their
    /// union. The result is sorted by line, then start column.
    pub fn concatenate(&mut self) {
        if self.items.len() < 2 {
            return;
        }

        self.items
            .sort_unstable_by_key(|d| (d.field_line, d.start_x, d.end_x));

        let mut merged: Vec<DropOut> = Vec::with_capacity(self.items.len());
        for d in self.items.drain(..) {
            match merged.last_mut() {
                Some(last)
                    if last.field_line == d.field_line
                        && d.start_x <= last.end_x.saturating_add(1) =>
                {
                    last.end_x = last.end_x.max(d.end_x);
                }
                _ => merged.push(d),
            }
        }
        self.items = merged;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DropOut> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[DropOut] {
        &self.items
    }
}

impl FromIterator<DropOut> for DropOuts {
    fn from_iter<I: IntoIterator<Item = DropOut>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DropOuts {
    type Item = &'a DropOut;
    type IntoIter = std::slice::Iter<'a, DropOut>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered(set: &DropOuts, width: usize, lines: usize) -> Vec<(usize, usize)> {
        let mut points = Vec::new();
        for y in 0..lines {
            for x in 0..width {
                if set.is_dropout(x, y) {
                    points.push((x, y));
                }
            }
        }
        points
    }

    #[test]
    fn test_is_dropout_uses_one_based_lines() {
        let mut set = DropOuts::new();
        set.append(10, 20, 5);

        assert!(set.is_dropout(10, 4));
        assert!(set.is_dropout(20, 4));
        assert!(set.is_dropout(15, 4));
        assert!(!set.is_dropout(15, 5), "line 5 is y = 4, not y = 5");
        assert!(!set.is_dropout(9, 4));
        assert!(!set.is_dropout(21, 4));
    }

    #[test]
    fn test_line_zero_never_matches() {
        let set: DropOuts = [DropOut::new(0, 100, 0)].into_iter().collect();
        for y in 0..3 {
            assert!(!set.is_dropout(50, y));
        }
    }

    #[test]
    fn test_is_dropout_unsorted() {
        let set: DropOuts = [
            DropOut::new(50, 60, 3),
            DropOut::new(1, 2, 1),
            DropOut::new(30, 30, 3),
        ]
        .into_iter()
        .collect();

        assert!(set.is_dropout(30, 2));
        assert!(set.is_dropout(55, 2));
        assert!(set.is_dropout(1, 0));
        assert!(!set.is_dropout(40, 2));
    }

    #[test]
    fn test_append_does_not_merge() {
        let mut set = DropOuts::new();
        set.append(5, 5, 1);
        set.append(6, 6, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_concatenate_merges_adjacent_single_columns() {
        let mut set = DropOuts::new();
        for x in 100..110 {
            set.append(x, x, 7);
        }
        set.concatenate();
        assert_eq!(set.as_slice(), &[DropOut::new(100, 109, 7)]);
    }

    #[test]
    fn test_concatenate_merges_overlaps_out_of_order() {
        let mut set: DropOuts = [
            DropOut::new(40, 50, 2),
            DropOut::new(10, 20, 2),
            DropOut::new(15, 35, 2),
            DropOut::new(36, 38, 2),
            DropOut::new(12, 14, 2),
        ]
        .into_iter()
        .collect();
        set.concatenate();
        assert_eq!(
            set.as_slice(),
            &[DropOut::new(10, 38, 2), DropOut::new(40, 50, 2)]
        );
    }

    #[test]
    fn test_concatenate_keeps_lines_apart() {
        let mut set = DropOuts::new();
        set.append(5, 10, 1);
        set.append(5, 10, 2);
        set.append(11, 12, 2);
        set.concatenate();
        assert_eq!(
            set.as_slice(),
            &[DropOut::new(5, 10, 1), DropOut::new(5, 12, 2)]
        );
    }

    #[test]
    fn test_concatenate_preserves_coverage() {
        let mut set: DropOuts = [
            DropOut::new(3, 9, 1),
            DropOut::new(0, 0, 2),
            DropOut::new(8, 12, 1),
            DropOut::new(1, 1, 2),
            DropOut::new(20, 25, 3),
            DropOut::new(22, 23, 3),
            DropOut::new(27, 29, 3),
        ]
        .into_iter()
        .collect();

        let before = covered(&set, 32, 4);
        set.concatenate();
        let after = covered(&set, 32, 4);

        assert_eq!(before, after);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_concatenate_empty_is_noop() {
        let mut set = DropOuts::new();
        set.concatenate();
        assert!(set.is_empty());
    }

    #[test]
    fn test_json_layout() {
        let mut set = DropOuts::new();
        set.append(1, 2, 3);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"[{"startX":1,"endX":2,"fieldLine":3}]"#);
    }
}
