//! # Table Matrix Engine
//!
//! A table is a sparse row/column matrix of cells. Cells can span rows and
//! columns; the slots a span covers are reserved so that every placement is
//! validated against earlier insertions. The matrix is not necessarily
//! rectangular in content terms: it can contain holes, which auto-fill
//! plugs at completion time.
//!
//! Insertion comes in two flavors with deliberately different contracts:
//!
//! - **Strict** (`add_cell_at`, `insert_table`): explicit coordinates,
//!   placement errors are returned to the caller.
//! - **Convenience** (`add_cell`, `add_text`, `add_phrase`): an
//!   auto-advancing row-major cursor, best-effort. A cell that doesn't fit
//!   is silently dropped.
//!
//! Nested tables are first-class occupants. [`Table::complete`] reconciles
//! every nested table's column grid with the parent's (see [`merge`]) and
//! then runs auto-fill, producing the flat matrix the downstream renderer
//! iterates row-major.

pub mod cell;
pub mod merge;
pub mod row;

pub use cell::{Cell, CellContent, CellId, CellStyle};
pub use merge::{MergeMap, Placement};
pub use row::{Row, Slot};

use crate::content::Phrase;
use crate::error::TrellisError;
use crate::style::{BorderSides, HorizontalAlignment};

/// A (row, column) coordinate in the matrix. Row 0 is the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub row: usize,
    pub column: usize,
}

impl Location {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// The table matrix. Construct with a fixed column count; rows grow on
/// demand as cells are placed.
#[derive(Debug, Clone)]
pub struct Table {
    /// Number of columns. Fixed except through `add_columns`/`delete_column`.
    columns: usize,
    rows: Vec<Row>,
    /// Next insertion point for the convenience path.
    cursor: Location,
    /// Template for auto-filled cells and for styling convenience
    /// insertions.
    default_cell: Cell,
    /// Index of the last header row, if a header section was marked.
    last_header_row: Option<usize>,
    /// Horizontal placement of the table in its available width.
    alignment: HorizontalAlignment,
    /// Default padding inside cells, in points.
    cell_padding: f64,
    /// Spacing between cells, in points.
    cell_spacing: f64,
    /// Width of the table: a percentage of the available space, or an
    /// absolute point value when `locked`.
    width: f64,
    locked: bool,
    /// Proportional column widths, percentages summing to 100.
    widths: Vec<f64>,
    /// Space between the table and the preceding element, in points.
    offset: Option<f64>,
    /// Set when a nested table was inserted since the last completion.
    table_inserted: bool,
    /// Fill empty slots with copies of the default cell at completion.
    auto_fill: bool,
    /// Streaming completeness: `false` marks a large table whose processed
    /// rows may be flushed incrementally.
    complete: bool,
    /// Old-identity to new-placement mapping from the last merge pass.
    merge_map: Option<MergeMap>,
}

impl Default for Table {
    fn default() -> Self {
        Table::new(1).expect("1-column table is always valid")
    }
}

impl Table {
    /// Constructs a table with `columns` columns and one (empty) row.
    /// Fails if `columns` is zero.
    pub fn new(columns: usize) -> Result<Self, TrellisError> {
        Table::with_rows(columns, 1)
    }

    /// Constructs a table with `columns` columns and `rows` pre-created
    /// empty rows.
    pub fn with_rows(columns: usize, rows: usize) -> Result<Self, TrellisError> {
        if columns == 0 {
            return Err(TrellisError::BadElement(
                "a table should have at least 1 column".to_string(),
            ));
        }
        let mut default_cell = Cell::new();
        default_cell.style_mut().border = Some(BorderSides::BOX);
        default_cell.fill();

        Ok(Self {
            columns,
            rows: (0..rows).map(|_| Row::new(columns)).collect(),
            cursor: Location::new(0, 0),
            default_cell,
            last_header_row: None,
            alignment: HorizontalAlignment::Center,
            cell_padding: 0.0,
            cell_spacing: 0.0,
            width: 80.0,
            locked: false,
            widths: vec![100.0 / columns as f64; columns],
            offset: None,
            table_inserted: false,
            auto_fill: false,
            complete: true,
            merge_map: None,
        })
    }

    // ── Shape accessors ────────────────────────────────────────

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows currently in the matrix.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// `(columns, rows)`.
    pub fn dimension(&self) -> (usize, usize) {
        (self.columns, self.rows.len())
    }

    /// Row-major access for the downstream renderer.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The slot at `(row, column)`.
    pub fn element_at(&self, row: usize, column: usize) -> &Slot {
        self.rows[row].slot(column)
    }

    /// Where the next convenience insertion will land.
    pub fn cursor(&self) -> Location {
        self.cursor
    }

    // ── Attributes ─────────────────────────────────────────────

    /// The default cell template used by auto-fill and convenience
    /// insertions.
    pub fn default_cell(&self) -> &Cell {
        &self.default_cell
    }

    pub fn default_cell_mut(&mut self) -> &mut Cell {
        &mut self.default_cell
    }

    pub fn set_default_cell(&mut self, cell: Cell) {
        self.default_cell = cell;
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, value: HorizontalAlignment) {
        self.alignment = value;
    }

    pub fn cell_padding(&self) -> f64 {
        self.cell_padding
    }

    pub fn set_cell_padding(&mut self, value: f64) {
        self.cell_padding = value;
    }

    pub fn cell_spacing(&self) -> f64 {
        self.cell_spacing
    }

    pub fn set_cell_spacing(&mut self, value: f64) {
        self.cell_spacing = value;
    }

    /// The table width: a percentage of the available space (default 80),
    /// or absolute points when [`Table::is_locked`].
    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn set_width(&mut self, value: f64) {
        self.width = value;
    }

    /// Is the width an absolute point value rather than a percentage?
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    /// Space before the table in points; `None` lets the consumer use its
    /// current leading.
    pub fn offset(&self) -> Option<f64> {
        self.offset
    }

    pub fn set_offset(&mut self, value: f64) {
        self.offset = Some(value);
    }

    /// Enables filling of empty slots with default-cell copies during
    /// [`Table::complete`]. Off by default; costs a full matrix scan.
    pub fn set_auto_fill(&mut self, value: bool) {
        self.auto_fill = value;
    }

    // ── Column widths ──────────────────────────────────────────

    /// Proportional column widths, percentages summing to 100.
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// Sets the column widths from relative values.
    ///
    /// The values don't have to sum to anything in particular; their sum is
    /// treated as 100% and each column gets its proportional share. The
    /// last column absorbs the rounding remainder so the stored widths sum
    /// to exactly 100.
    pub fn set_widths(&mut self, relative: &[f64]) -> Result<(), TrellisError> {
        if relative.len() != self.columns {
            return Err(TrellisError::BadElement(format!(
                "wrong number of columns: got {} widths for {} columns",
                relative.len(),
                self.columns
            )));
        }
        let total: f64 = relative.iter().sum();
        if total <= 0.0 {
            return Err(TrellisError::BadElement(
                "column widths must have a positive sum".to_string(),
            ));
        }
        let last = self.columns - 1;
        self.widths[last] = 100.0;
        for i in 0..last {
            let width = 100.0 * relative[i] / total;
            self.widths[i] = width;
            self.widths[last] -= width;
        }
        Ok(())
    }

    /// Translates the percentage widths into the x-coordinates of the
    /// column borders on a concrete canvas. Returns `columns + 1` border
    /// positions; the first one depends on the table alignment.
    ///
    /// `left` is the position of the leftmost possible border, and
    /// `total_width` the space available between the outermost borders.
    pub fn column_positions(&self, left: f64, total_width: f64) -> Vec<f64> {
        // for n columns there are n + 1 borders
        let mut positions = vec![0.0; self.columns + 1];
        let percentage = if self.locked {
            100.0 * self.width / total_width
        } else {
            self.width
        };
        positions[0] = match self.alignment {
            HorizontalAlignment::Left => left,
            HorizontalAlignment::Right => left + total_width * (100.0 - percentage) / 100.0,
            _ => left + total_width * (100.0 - percentage) / 200.0,
        };
        let table_width = total_width * percentage / 100.0;
        for i in 1..self.columns {
            positions[i] = positions[i - 1] + self.widths[i - 1] * table_width / 100.0;
        }
        positions[self.columns] = positions[0] + table_width;
        positions
    }

    // ── Headers ────────────────────────────────────────────────

    /// Marks every row inserted so far as the header section. Returns the
    /// index of the last header row, or `None` when nothing was inserted.
    pub fn end_headers(&mut self) -> Option<usize> {
        self.last_header_row = self.cursor.row.checked_sub(1);
        self.last_header_row
    }

    pub fn last_header_row(&self) -> Option<usize> {
        self.last_header_row
    }

    pub fn set_last_header_row(&mut self, value: Option<usize>) {
        self.last_header_row = value;
    }

    // ── Insertion ──────────────────────────────────────────────

    /// Adds a cell at the cursor, best-effort: a placement failure drops
    /// the cell silently. Use [`Table::add_cell_at`] for the strict
    /// contract.
    pub fn add_cell(&mut self, cell: Cell) {
        let location = self.cursor;
        let _ = self.add_cell_at(cell, location);
    }

    /// Adds a cell at an explicit location.
    ///
    /// The cell's span rectangle must stay within the column bounds and
    /// must not overlap any occupied or reserved slot. Rows are created on
    /// demand when the rectangle extends below the current last row. On
    /// success the cursor advances to the next free slot and the placed
    /// cell's identity is returned.
    ///
    /// A table-placeholder cell (sole content is a nested table) routes to
    /// [`Table::insert_table`]; the returned id is not tracked by the merge
    /// map, but the nested table's own cells are.
    pub fn add_cell_at(
        &mut self,
        mut cell: Cell,
        location: Location,
    ) -> Result<CellId, TrellisError> {
        if cell.is_table() {
            let id = cell.id();
            let wrapper = match cell.take_content() {
                CellContent::Table(table) => *table,
                CellContent::Elements(_) => unreachable!("is_table() checked"),
            };
            self.insert_table(wrapper, location)?;
            return Ok(id);
        }

        if !self.is_valid_location(&cell, location) {
            return Err(TrellisError::Placement {
                row: location.row,
                column: location.column,
                rowspan: cell.rowspan(),
                colspan: cell.colspan(),
            });
        }

        cell.inherit_style(self.default_cell.style());
        cell.fill();
        let id = cell.assign_fresh_id();
        place_cell(&mut self.rows, self.columns, cell, location);
        self.advance_cursor(location);
        Ok(id)
    }

    /// Adds a phrase at the cursor as a cell styled and spanned like the
    /// default cell. Best-effort.
    pub fn add_phrase(&mut self, phrase: Phrase) {
        let location = self.cursor;
        let _ = self.add_phrase_at(phrase, location);
    }

    /// Adds a phrase at an explicit location, strict contract.
    pub fn add_phrase_at(
        &mut self,
        phrase: Phrase,
        location: Location,
    ) -> Result<CellId, TrellisError> {
        let mut cell = Cell::from_phrase(phrase);
        *cell.style_mut() = self.default_cell.style().clone();
        cell.set_colspan(self.default_cell.colspan());
        cell.set_rowspan(self.default_cell.rowspan());
        self.add_cell_at(cell, location)
    }

    /// Adds plain text at the cursor. Best-effort.
    pub fn add_text(&mut self, content: &str) {
        self.add_phrase(Phrase::new(content));
    }

    /// Adds plain text at an explicit location, strict contract.
    pub fn add_text_at(&mut self, content: &str, location: Location) -> Result<CellId, TrellisError> {
        self.add_phrase_at(Phrase::new(content), location)
    }

    /// Nests a whole table at the cursor position.
    pub fn insert_table_at_cursor(&mut self, table: Table) -> Result<(), TrellisError> {
        let location = self.cursor;
        self.insert_table(table, location)
    }

    /// Nests a whole table at an explicit location.
    ///
    /// The nested table is completeness-closed here (its own nested tables
    /// merge, its auto-fill runs) and stored as a slot occupant; the
    /// parent's next [`Table::complete`] absorbs it into the parent grid.
    pub fn insert_table(&mut self, mut table: Table, location: Location) -> Result<(), TrellisError> {
        if location.column >= self.columns {
            return Err(TrellisError::Placement {
                row: location.row,
                column: location.column,
                rowspan: 1,
                colspan: 1,
            });
        }
        table.complete()?;

        while self.rows.len() <= location.row {
            self.rows.push(Row::new(self.columns));
        }
        if !self.rows[location.row].set_element(location.column, Slot::Table(table)) {
            return Err(TrellisError::Placement {
                row: location.row,
                column: location.column,
                rowspan: 1,
                colspan: 1,
            });
        }
        self.table_inserted = true;
        self.advance_cursor(location);
        Ok(())
    }

    // ── Matrix reshaping ───────────────────────────────────────

    /// Appends `count` columns to the right edge. The new columns get a
    /// width of 0 so the sum invariant holds; give them real widths with
    /// [`Table::set_widths`].
    pub fn add_columns(&mut self, count: usize) {
        for row in &mut self.rows {
            row.grow(count);
        }
        self.columns += count;
        self.widths.resize(self.columns, 0.0);
    }

    /// Deletes one column, shifting later columns left and renormalizing
    /// the remaining widths back to a 100% sum.
    pub fn delete_column(&mut self, column: usize) -> Result<(), TrellisError> {
        if column >= self.columns || self.columns == 1 {
            return Err(TrellisError::BadElement(format!(
                "cannot delete column {} of a {}-column table",
                column, self.columns
            )));
        }
        self.columns -= 1;
        let mut remaining = self.widths.clone();
        remaining.remove(column);
        self.widths = remaining.clone();
        self.set_widths(&remaining)?;
        for row in &mut self.rows {
            row.delete_column(column);
        }
        if self.cursor.column >= self.columns {
            self.cursor = Location::new(self.cursor.row + 1, 0);
        }
        Ok(())
    }

    /// Deletes a row. Returns `false` when the index is out of range.
    pub fn delete_row(&mut self, row: usize) -> bool {
        if row >= self.rows.len() {
            return false;
        }
        self.rows.remove(row);
        self.cursor.row = self.cursor.row.saturating_sub(1);
        true
    }

    /// Deletes the last row. Returns `false` on an empty matrix.
    pub fn delete_last_row(&mut self) -> bool {
        match self.rows.len() {
            0 => false,
            n => self.delete_row(n - 1),
        }
    }

    /// Drops every row and resets to a single empty one.
    pub fn delete_all_rows(&mut self) {
        self.rows.clear();
        self.rows.push(Row::new(self.columns));
        self.cursor = Location::new(0, 0);
        self.last_header_row = None;
    }

    // ── Finalization ───────────────────────────────────────────

    /// Finalizes the matrix for rendering.
    ///
    /// Runs the nested-table merge pass if any table was inserted since the
    /// last completion (see [`merge`]), then fills every remaining empty
    /// slot with a copy of the default cell when auto-fill is enabled.
    /// After a merge, [`Table::merge_map`] tells where previously placed
    /// cells ended up.
    pub fn complete(&mut self) -> Result<(), TrellisError> {
        if self.table_inserted {
            let old = std::mem::take(self);
            let (merged, map) = merge::merge_nested(old);
            *self = merged;
            self.merge_map = Some(map);
            self.cursor = self.first_free_slot();
        }
        if self.auto_fill {
            self.fill_empty_cells()?;
        }
        Ok(())
    }

    /// Where previously placed cells landed in the last merge, keyed by
    /// [`CellId`]. `None` until a merge has run.
    pub fn merge_map(&self) -> Option<&MergeMap> {
        self.merge_map.as_ref()
    }

    /// Streaming completeness flag: `false` marks a large table whose
    /// processed rows are flushed incrementally via
    /// [`Table::flush_content`].
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn set_complete(&mut self, complete: bool) {
        self.complete = complete;
    }

    /// Drops every already-processed body row, retaining only the header
    /// section, to bound memory while streaming a very large table.
    pub fn flush_content(&mut self) {
        let keep = match self.last_header_row {
            Some(last) => last + 1,
            None => 0,
        };
        self.rows.truncate(keep);
        self.cursor = Location::new(keep, 0);
    }

    // ── Internals ──────────────────────────────────────────────

    /// Checks that the cell's span rectangle stays inside the column
    /// bounds and doesn't overlap occupied or reserved slots. Rows beyond
    /// the current last row don't need checking; they will be created.
    fn is_valid_location(&self, cell: &Cell, location: Location) -> bool {
        if location.column + cell.colspan() > self.columns {
            return false;
        }
        let row_end = (location.row + cell.rowspan()).min(self.rows.len());
        for i in location.row..row_end {
            for j in location.column..location.column + cell.colspan() {
                if self.rows[i].is_reserved(j) {
                    return false;
                }
            }
        }
        true
    }

    /// Moves the cursor to the next non-reserved slot in row-major order,
    /// starting just after `location`. Lands one row past the end when the
    /// matrix is full.
    fn advance_cursor(&mut self, location: Location) {
        let mut i = location.row;
        let mut j = location.column;
        loop {
            if j + 1 == self.columns {
                i += 1;
                j = 0;
            } else {
                j += 1;
            }
            if i >= self.rows.len() || !self.rows[i].is_reserved(j) {
                break;
            }
        }
        self.cursor = Location::new(i, j);
    }

    fn first_free_slot(&self) -> Location {
        for (i, row) in self.rows.iter().enumerate() {
            for j in 0..self.columns {
                if !row.is_reserved(j) {
                    return Location::new(i, j);
                }
            }
        }
        Location::new(self.rows.len(), 0)
    }

    /// Gives every empty slot a copy of the default cell, through the
    /// normal placement path so reservations stay consistent.
    fn fill_empty_cells(&mut self) -> Result<(), TrellisError> {
        for i in 0..self.rows.len() {
            for j in 0..self.columns {
                if !self.rows[i].is_reserved(j) {
                    let filler = self.default_cell.clone();
                    self.add_cell_at(filler, Location::new(i, j))?;
                }
            }
        }
        Ok(())
    }
}

/// Stores a cell at its anchor and reserves the rest of its span
/// rectangle, growing `rows` as needed. The anchor slot must be free and
/// the rectangle within `columns`; both were validated by the caller, so a
/// conflict here is an engine bug.
pub(crate) fn place_cell(rows: &mut Vec<Row>, columns: usize, cell: Cell, location: Location) {
    let rowspan = cell.rowspan();
    let colspan = cell.colspan();
    while rows.len() < location.row + rowspan {
        rows.push(Row::new(columns));
    }

    // rows below the anchor reserve the full colspan
    for i in location.row + 1..location.row + rowspan {
        assert!(
            rows[i].reserve(location.column, colspan),
            "reservation conflict at row {} while placing a validated cell",
            i
        );
    }
    // the anchor row reserves everything except the anchor slot itself
    let anchor = &mut rows[location.row];
    assert!(
        anchor.reserve(location.column + 1, colspan.saturating_sub(1)),
        "reservation conflict in anchor row {} while placing a validated cell",
        location.row
    );
    assert!(
        anchor.set_element(location.column, Slot::Cell(cell)),
        "anchor slot ({}, {}) taken while placing a validated cell",
        location.row,
        location.column
    );
}
