//! Line clearing.

use crate::field::PlayField;
use serde::{Deserialize, Serialize};

/// Rows that a locked piece may have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    start: usize,
    len: usize,
}

impl RowSpan {
    /// Creates a span of `len` rows starting at `start`.
    ///
    /// The floor is never scanned: a start below row 1 is moved up to row 1 and the span keeps
    /// its length.
    pub fn new(start: isize, len: usize) -> RowSpan {
        RowSpan {
            start: start.max(1) as usize,
            len,
        }
    }

    /// Returns the span covered by a shape of `size` rows whose top row is `anchor_y`.
    pub fn for_piece(anchor_y: isize, size: usize) -> RowSpan {
        RowSpan::new(anchor_y + 1 - size as isize, size)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Result of a line clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    /// Row index of each deletion, in the order they happened.
    ///
    /// A cascade deletes several rows at the same index, so an index may repeat.
    pub rows: Vec<usize>,
}

impl ClearReport {
    /// Returns the number of deleted rows.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Deletes every full row in `span`, scanning upwards.
///
/// After a deletion the rows above have moved down into the same index, so that index is
/// checked again before moving on.
pub fn clear_lines(field: &mut PlayField, span: RowSpan) -> ClearReport {
    let mut report = ClearReport::default();
    let end = span.end().min(field.height());

    let mut y = span.start();
    while y < end {
        // the top row is emptied by every shift, so this runs out
        if field.is_row_full(y) {
            field.shift_rows_down(y);
            report.rows.push(y);
        } else {
            y += 1;
        }
    }

    if !report.is_empty() {
        debug!("cleared rows {:?}", report.rows);
    }
    report
}

#[cfg(test)]
use crate::field::Cell;

#[cfg(test)]
fn fill_row(field: &mut PlayField, y: usize, except: Option<usize>) {
    for x in field.playable_columns() {
        if Some(x) != except {
            field.set_cell(x, y, Cell::Occupied);
        }
    }
}

#[test]
fn span_is_clamped_above_floor() {
    let span = RowSpan::for_piece(1, 3);
    assert_eq!(span.start(), 1);
    assert_eq!(span.end(), 4);

    let span = RowSpan::for_piece(7, 3);
    assert_eq!((span.start(), span.end()), (5, 8));
}

#[test]
fn single_full_row() {
    let mut field = PlayField::new(4, 6, 2).unwrap();
    fill_row(&mut field, 1, None);
    field.set_cell(2, 2, Cell::Occupied);

    let report = clear_lines(&mut field, RowSpan::new(1, 2));
    assert_eq!(report.rows, vec![1]);
    assert_eq!(field.get_cell(2, 1), Some(Cell::Occupied));
    assert_eq!(field.stack_count(), 1);
}

#[test]
fn cascade_clears_adjacent_rows() {
    let mut field = PlayField::new(4, 6, 2).unwrap();
    fill_row(&mut field, 1, None);
    fill_row(&mut field, 2, None);
    fill_row(&mut field, 3, None);
    field.set_cell(5, 4, Cell::Occupied);

    let report = clear_lines(&mut field, RowSpan::new(1, 3));
    assert_eq!(report.rows, vec![1, 1, 1]);
    assert_eq!(report.count(), 3);
    assert_eq!(field.stack_count(), 1);
    assert_eq!(field.get_cell(5, 1), Some(Cell::Occupied));
}

#[test]
fn gap_between_full_rows() {
    let mut field = PlayField::new(4, 6, 2).unwrap();
    fill_row(&mut field, 1, None);
    fill_row(&mut field, 2, Some(3));
    fill_row(&mut field, 3, None);

    let report = clear_lines(&mut field, RowSpan::new(1, 3));
    assert_eq!(report.rows, vec![1, 2]);
    // the partial row is all that is left, now at the bottom
    assert!(!field.is_row_full(1));
    assert_eq!(field.get_cell(3, 1), Some(Cell::Empty));
    assert_eq!(field.stack_count(), 3);
}

#[test]
fn rows_outside_span_are_left_alone() {
    let mut field = PlayField::new(4, 6, 2).unwrap();
    fill_row(&mut field, 1, None);
    fill_row(&mut field, 4, None);

    let report = clear_lines(&mut field, RowSpan::new(2, 2));
    assert!(report.is_empty());
    assert!(field.is_row_full(1));
    assert!(field.is_row_full(4));
}

#[test]
fn span_past_the_top_is_cut_off() {
    let mut field = PlayField::new(4, 2, 2).unwrap();
    let top = field.height() - 1;
    fill_row(&mut field, top, None);

    let report = clear_lines(&mut field, RowSpan::new(top as isize, 5));
    assert_eq!(report.rows, vec![top]);
    assert_eq!(field.stack_count(), 0);
}
