//! # Nested-Table Merge
//!
//! Reconciles every nested table with its parent's column grid, producing
//! one flat matrix. Each nested table carries its own percentage column
//! widths, generally incommensurate with the parent's and with other
//! nested tables sharing the same parent column. The merge computes, per
//! parent column, the union of all cumulative-width breakpoints found in
//! that column, so the refined grid has a column boundary wherever *any*
//! source grid had one. Parent rows expand to the tallest nested table
//! they contain.
//!
//! The pass consumes the old matrix and rebuilds a new one:
//!
//! - a plain cell's span inflates by the contributions of every original
//!   column and row it covered;
//! - a nested cell re-anchors through the breakpoint correspondence of its
//!   parent column and its span is recomputed from the number of refined
//!   columns it covers.
//!
//! Callers re-locate their cells in the rebuilt grid through the returned
//! [`MergeMap`]. The old matrix and the nested tables are gone afterwards.
//!
//! Reconciliation runs once, eagerly, at completion time. Triggering it on
//! every insertion would redo the breakpoint union per nested table;
//! running it lazily keeps insertion O(span) and leaves the quadratic
//! bookkeeping to a single pass.

use std::collections::HashMap;

use super::cell::CellId;
use super::row::{Row, Slot};
use super::{place_cell, Location, Table};

/// Tolerance for treating two cumulative widths as the same breakpoint.
pub const EPSILON: f64 = 0.0001;

/// Where a cell ended up after a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub column: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

/// Old cell identity to new placement, for every cell the merge re-placed.
pub type MergeMap = HashMap<CellId, Placement>;

/// Merges every nested table into the parent grid.
///
/// Consumes the parent; the returned table is the reconciled flat matrix.
/// When the parent holds no nested table this is the identity (same
/// object, no rebuild) and the map is empty.
pub(crate) fn merge_nested(table: Table) -> (Table, MergeMap) {
    let columns = table.columns;

    // Per parent column: the union of nested segment widths, in the 0-100
    // percent space of that column. None for columns without nested tables.
    let mut col_segments: Vec<Option<Vec<f64>>> = vec![None; columns];
    let mut any_nested = false;
    for j in 0..columns {
        for row in &table.rows {
            if let Slot::Table(nested) = row.slot(j) {
                any_nested = true;
                col_segments[j] = Some(match col_segments[j].take() {
                    None => nested.widths().to_vec(),
                    Some(acc) => union_segments(&acc, nested.widths()),
                });
            }
        }
    }
    if !any_nested {
        return (table, MergeMap::new());
    }

    // How many refined columns/rows each original one becomes.
    let col_contrib: Vec<usize> = col_segments
        .iter()
        .map(|segments| segments.as_ref().map_or(1, Vec::len))
        .collect();
    let total_columns: usize = col_contrib.iter().sum();
    let row_contrib: Vec<usize> = table
        .rows
        .iter()
        .map(|row| {
            (0..columns)
                .filter_map(|j| row.slot(j).as_table())
                .map(Table::row_count)
                .max()
                .unwrap_or(1)
                .max(1)
        })
        .collect();
    let total_rows: usize = row_contrib.iter().sum();

    // Refined widths: a parent column's width subdivided proportionally by
    // its segments; untouched columns keep theirs.
    let mut new_widths = Vec::with_capacity(total_columns);
    for j in 0..columns {
        match &col_segments[j] {
            None => new_widths.push(table.widths[j]),
            Some(segments) => {
                new_widths.extend(segments.iter().map(|seg| table.widths[j] * seg / 100.0));
            }
        }
    }

    // Header rows keep their meaning: remap the marker through the row
    // expansion.
    let last_header_row = table
        .last_header_row
        .map(|last| row_contrib[..=last].iter().sum::<usize>() - 1);

    let Table {
        rows,
        default_cell,
        alignment,
        cell_padding,
        cell_spacing,
        width,
        locked,
        offset,
        auto_fill,
        complete,
        ..
    } = table;

    let mut new_rows: Vec<Row> = (0..total_rows).map(|_| Row::new(total_columns)).collect();
    let mut map = MergeMap::new();

    let mut new_row_cursor = 0;
    for (i, row) in rows.into_iter().enumerate() {
        let mut new_col_cursor = 0;
        for (j, slot) in row.into_slots().into_iter().enumerate() {
            match slot {
                Slot::Table(nested) => {
                    let segments = col_segments[j]
                        .as_ref()
                        .expect("a column holding a nested table has segments");
                    let col_map = build_col_map(nested.widths(), segments, new_col_cursor);
                    for (k, sub_row) in nested.rows.into_iter().enumerate() {
                        for (l, sub_slot) in sub_row.into_slots().into_iter().enumerate() {
                            match sub_slot {
                                Slot::Cell(mut sub_cell) => {
                                    let column = col_map[l];
                                    let end = col_map[l + sub_cell.colspan()];
                                    assert!(
                                        end > column,
                                        "breakpoint mapping produced a zero-width span \
                                         for nested cell at ({}, {}) of parent slot ({}, {})",
                                        k,
                                        l,
                                        i,
                                        j
                                    );
                                    sub_cell.set_colspan(end - column);
                                    let placement = Placement {
                                        row: new_row_cursor + k,
                                        column,
                                        rowspan: sub_cell.rowspan(),
                                        colspan: sub_cell.colspan(),
                                    };
                                    map.insert(sub_cell.id(), placement);
                                    place_cell(
                                        &mut new_rows,
                                        total_columns,
                                        sub_cell,
                                        Location::new(placement.row, placement.column),
                                    );
                                }
                                Slot::Table(_) => {
                                    // insert_table completeness-closes what it stores,
                                    // so a nested matrix is always flat by now
                                    unreachable!(
                                        "nested matrix still holds a table after completion"
                                    );
                                }
                                Slot::Empty | Slot::Reserved => {}
                            }
                        }
                    }
                }
                Slot::Cell(mut cell) => {
                    let new_colspan: usize = col_contrib[j..j + cell.colspan()].iter().sum();
                    let new_rowspan: usize = row_contrib[i..i + cell.rowspan()].iter().sum();
                    cell.set_colspan(new_colspan);
                    cell.set_rowspan(new_rowspan);
                    let placement = Placement {
                        row: new_row_cursor,
                        column: new_col_cursor,
                        rowspan: new_rowspan,
                        colspan: new_colspan,
                    };
                    map.insert(cell.id(), placement);
                    place_cell(
                        &mut new_rows,
                        total_columns,
                        cell,
                        Location::new(new_row_cursor, new_col_cursor),
                    );
                }
                Slot::Empty | Slot::Reserved => {}
            }
            new_col_cursor += col_contrib[j];
        }
        new_row_cursor += row_contrib[i];
    }

    let merged = Table {
        columns: total_columns,
        rows: new_rows,
        cursor: Location::new(0, 0),
        default_cell,
        last_header_row,
        alignment,
        cell_padding,
        cell_spacing,
        width,
        locked,
        widths: new_widths,
        offset,
        table_inserted: false,
        auto_fill,
        complete,
        merge_map: None,
    };
    (merged, map)
}

/// Unions two segment-width sequences (each summing to 100) into the
/// sequence whose cumulative sums are the merged breakpoints of both.
///
/// Two-pointer walk over the cumulative sums: the smaller boundary emits a
/// segment; boundaries equal within [`EPSILON`] advance both sides, so
/// shared breakpoints appear once.
fn union_segments(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut ai = 0;
    let mut bi = 0;
    let mut a_cum = a[0];
    let mut b_cum = b[0];
    let mut total = 0.0;
    while ai < a.len() && bi < b.len() {
        if b_cum > a_cum + EPSILON {
            out.push(a_cum - total);
            total = a_cum;
            ai += 1;
            if ai < a.len() {
                a_cum += a[ai];
            }
        } else {
            out.push(b_cum - total);
            total = b_cum;
            if (b_cum - a_cum).abs() < EPSILON {
                ai += 1;
                if ai < a.len() {
                    a_cum += a[ai];
                }
            }
            bi += 1;
            if bi < b.len() {
                b_cum += b[bi];
            }
        }
    }
    out
}

/// For one nested table in a reconciled column: maps each of its column
/// boundaries (indices `0..=widths.len()`) to an absolute column index of
/// the refined grid. Nested boundaries land on union breakpoints by
/// construction; a run of segments is consumed until the cumulative widths
/// agree within [`EPSILON`].
fn build_col_map(nested_widths: &[f64], segments: &[f64], base: usize) -> Vec<usize> {
    let mut col_map = Vec::with_capacity(nested_widths.len() + 1);
    let mut ct = 0;
    for &nested_width in nested_widths {
        col_map.push(base + ct);
        let mut covered = 0.0;
        while ct < segments.len() {
            covered += segments[ct];
            ct += 1;
            if (nested_width - covered).abs() < EPSILON {
                break;
            }
        }
    }
    col_map.push(base + ct);
    col_map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn nested(widths: &[f64], texts: &[&str]) -> Table {
        let mut table = Table::new(widths.len()).unwrap();
        table.set_widths(widths).unwrap();
        for text in texts {
            table.add_cell(Cell::from_text(text));
        }
        table
    }

    #[test]
    fn test_union_identical_splits() {
        let merged = union_segments(&[50.0, 50.0], &[50.0, 50.0]);
        assert_eq!(merged.len(), 2);
        assert!((merged[0] - 50.0).abs() < EPSILON);
    }

    #[test]
    fn test_union_of_thirds_and_halves() {
        // breakpoints {33.3, 66.6, 100} against {50, 100}
        let merged = union_segments(&[33.3, 33.3, 33.4], &[50.0, 50.0]);
        assert_eq!(merged.len(), 4);
        let expected = [33.3, 16.7, 16.6, 33.4];
        for (got, want) in merged.iter().zip(expected) {
            assert!((got - want).abs() < EPSILON, "{:?}", merged);
        }
        assert!((merged.iter().sum::<f64>() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_union_order_independent_for_refinement() {
        let coarse = [50.0, 50.0];
        let fine = [25.0, 25.0, 50.0];
        assert_eq!(union_segments(&coarse, &fine).len(), 3);
        assert_eq!(union_segments(&fine, &coarse).len(), 3);
    }

    #[test]
    fn test_col_map_consumes_segment_runs() {
        // nested [70, 30] against the union with [40, 60]: segments [40, 30, 30]
        let map = build_col_map(&[70.0, 30.0], &[40.0, 30.0, 30.0], 0);
        assert_eq!(map, vec![0, 2, 3]);
        let map = build_col_map(&[40.0, 60.0], &[40.0, 30.0, 30.0], 0);
        assert_eq!(map, vec![0, 1, 3]);
    }

    #[test]
    fn test_merge_expands_shared_column() {
        // 3-column parent; column 1 holds the same 2-column split twice
        let mut parent = Table::new(3).unwrap();
        parent.add_text("r0c0");
        parent
            .insert_table(nested(&[50.0, 50.0], &["a", "b"]), Location::new(0, 1))
            .unwrap();
        parent.add_text("r0c2");
        parent
            .insert_table(nested(&[50.0, 50.0], &["c", "d"]), Location::new(1, 1))
            .unwrap();

        let (merged, _) = merge_nested(parent);
        // column 1 expands to 2, the others stay: 3 - 1 + 2
        assert_eq!(merged.columns(), 4);
        assert_eq!(merged.row_count(), 2);
    }

    #[test]
    fn test_merge_no_nested_is_identity() {
        let mut parent = Table::new(2).unwrap();
        parent.add_text("a");
        parent.add_text("b");
        let (merged, map) = merge_nested(parent);
        assert_eq!(merged.columns(), 2);
        assert_eq!(merged.row_count(), 1);
        assert!(map.is_empty());
    }

    #[test]
    fn test_merge_widths_subdivide_parent_column() {
        let mut parent = Table::new(2).unwrap();
        parent.set_widths(&[50.0, 50.0]).unwrap();
        parent
            .insert_table(nested(&[50.0, 50.0], &["a", "b"]), Location::new(0, 0))
            .unwrap();
        parent.add_text("side");

        let (merged, _) = merge_nested(parent);
        let widths = merged.widths();
        assert_eq!(widths.len(), 3);
        assert!((widths[0] - 25.0).abs() < 1e-6);
        assert!((widths[1] - 25.0).abs() < 1e-6);
        assert!((widths[2] - 50.0).abs() < 1e-6);
        assert!((widths.iter().sum::<f64>() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_merge_inflates_plain_cell_spans() {
        // plain cell spans both columns; column 1 refines into 2
        let mut parent = Table::new(2).unwrap();
        let mut wide = Cell::from_text("wide");
        wide.set_colspan(2);
        let wide_id = parent.add_cell_at(wide, Location::new(0, 0)).unwrap();
        parent
            .insert_table(nested(&[50.0, 50.0], &["a", "b"]), Location::new(1, 1))
            .unwrap();
        parent
            .add_cell_at(Cell::from_text("r1c0"), Location::new(1, 0))
            .unwrap();

        let (merged, map) = merge_nested(parent);
        assert_eq!(merged.columns(), 3);
        let placement = map[&wide_id];
        assert_eq!(placement.colspan, 3);
        assert_eq!(placement.row, 0);
        assert_eq!(placement.column, 0);
    }

    #[test]
    fn test_merge_expands_rows_to_tallest_nested() {
        // nested table is 2 rows tall; the neighbor cell stretches with it
        let mut parent = Table::new(2).unwrap();
        let neighbor_id = parent
            .add_cell_at(Cell::from_text("neighbor"), Location::new(0, 0))
            .unwrap();
        parent
            .insert_table(
                nested(&[100.0], &["upper", "lower"]),
                Location::new(0, 1),
            )
            .unwrap();

        let (merged, map) = merge_nested(parent);
        assert_eq!(merged.row_count(), 2);
        let placement = map[&neighbor_id];
        assert_eq!(placement.rowspan, 2);
        // the slot under the neighbor is reserved by its expanded span
        assert!(merged.rows()[1].is_reserved(0));
    }

    #[test]
    fn test_merge_nonmatching_widths_remap_spans() {
        // row 0: [70, 30], row 1: [40, 60] in the same single parent column
        let mut parent = Table::new(1).unwrap();
        parent
            .insert_table(nested(&[70.0, 30.0], &["a", "b"]), Location::new(0, 0))
            .unwrap();
        parent
            .insert_table(nested(&[40.0, 60.0], &["c", "d"]), Location::new(1, 0))
            .unwrap();

        let (merged, _) = merge_nested(parent);
        // union breakpoints {40, 70, 100}
        assert_eq!(merged.columns(), 3);
        let widths = merged.widths();
        assert!((widths[0] - 40.0).abs() < EPSILON);
        assert!((widths[1] - 30.0).abs() < EPSILON);
        assert!((widths[2] - 30.0).abs() < EPSILON);

        // row 0: "a" covers segments {40, 30}, "b" the last
        assert_eq!(merged.rows()[0].slot(0).as_cell().unwrap().colspan(), 2);
        assert_eq!(merged.rows()[0].slot(2).as_cell().unwrap().colspan(), 1);
        // row 1: "c" covers {40}, "d" covers {30, 30}
        assert_eq!(merged.rows()[1].slot(0).as_cell().unwrap().colspan(), 1);
        assert_eq!(merged.rows()[1].slot(1).as_cell().unwrap().colspan(), 2);
    }

    #[test]
    fn test_three_nested_tables_share_column() {
        // breakpoints {50}, {25, 50}, {20} union to {20, 25, 50, 100}
        let mut parent = Table::new(1).unwrap();
        parent
            .insert_table(nested(&[50.0, 50.0], &["a", "b"]), Location::new(0, 0))
            .unwrap();
        parent
            .insert_table(
                nested(&[25.0, 25.0, 50.0], &["c", "d", "e"]),
                Location::new(1, 0),
            )
            .unwrap();
        parent
            .insert_table(nested(&[20.0, 80.0], &["f", "g"]), Location::new(2, 0))
            .unwrap();

        let (merged, _) = merge_nested(parent);
        assert_eq!(merged.columns(), 4);
        let widths = merged.widths();
        let expected = [20.0, 5.0, 25.0, 50.0];
        for (got, want) in widths.iter().zip(expected) {
            assert!((got - want).abs() < EPSILON, "{:?}", widths);
        }
        // every row's spans add up to the full refined width
        for row in merged.rows() {
            let total: usize = (0..merged.columns())
                .filter_map(|j| row.slot(j).as_cell())
                .map(Cell::colspan)
                .sum();
            assert_eq!(total, 4);
        }
    }
}
