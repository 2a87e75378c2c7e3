//! Row storage for the table matrix.
//!
//! A row owns one slot per column. Each slot is in exactly one of four
//! states: empty, reserved (covered by the span of a cell anchored
//! elsewhere), occupied by a cell, or occupied by a nested table. Rows are
//! only ever constructed and mutated by their parent [`Table`]; spanning
//! cells mark the slots they cover as reserved so later insertions can be
//! validated without consulting neighbors.

use super::cell::Cell;
use super::Table;

/// The state of one grid position.
#[derive(Debug, Clone, Default)]
pub enum Slot {
    /// Nothing here yet; auto-fill may claim it.
    #[default]
    Empty,
    /// Covered by another cell's row/col span. Not independently writable.
    Reserved,
    /// Anchor of a placed cell.
    Cell(Cell),
    /// Anchor of a nested table, absorbed by the merge pass.
    Table(Table),
}

impl Slot {
    /// Reserved or occupied. The slot cannot accept a new occupant.
    pub fn is_taken(&self) -> bool {
        !matches!(self, Slot::Empty)
    }

    /// Holds an actual occupant (cell or nested table).
    pub fn is_occupied(&self) -> bool {
        matches!(self, Slot::Cell(_) | Slot::Table(_))
    }

    pub fn as_cell(&self) -> Option<&Cell> {
        match self {
            Slot::Cell(cell) => Some(cell),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Slot::Table(table) => Some(table),
            _ => None,
        }
    }
}

/// One row of the matrix. Never outlives its parent table.
#[derive(Debug, Clone, Default)]
pub struct Row {
    slots: Vec<Slot>,
}

impl Row {
    pub(crate) fn new(columns: usize) -> Self {
        let mut slots = Vec::with_capacity(columns);
        slots.resize_with(columns, Slot::default);
        Self { slots }
    }

    /// Number of column slots.
    pub fn columns(&self) -> usize {
        self.slots.len()
    }

    /// Occupied-or-reserved status, used for placement validation.
    pub fn is_reserved(&self, column: usize) -> bool {
        self.slots[column].is_taken()
    }

    /// The slot at `column`.
    pub fn slot(&self, column: usize) -> &Slot {
        &self.slots[column]
    }

    /// True when no slot holds an occupant (reservations don't count).
    pub fn is_empty(&self) -> bool {
        !self.slots.iter().any(Slot::is_occupied)
    }

    /// Marks `span` consecutive slots starting at `column` as reserved.
    /// Returns `false` and rolls back if any target slot is already taken.
    pub(crate) fn reserve(&mut self, column: usize, span: usize) -> bool {
        assert!(
            column + span <= self.slots.len(),
            "reserve of columns {}..{} outside a {}-column row",
            column,
            column + span,
            self.slots.len()
        );
        for i in column..column + span {
            if self.slots[i].is_taken() {
                // undo reserve
                for slot in &mut self.slots[column..i] {
                    *slot = Slot::Empty;
                }
                return false;
            }
            self.slots[i] = Slot::Reserved;
        }
        true
    }

    /// Stores an occupant at `column`. Returns `false` if the slot is
    /// already taken; the occupant is returned untouched in the slot then.
    pub(crate) fn set_element(&mut self, column: usize, occupant: Slot) -> bool {
        if self.slots[column].is_taken() {
            return false;
        }
        self.slots[column] = occupant;
        true
    }

    /// Appends `additional` empty slots at the right edge.
    pub(crate) fn grow(&mut self, additional: usize) {
        self.slots
            .resize_with(self.slots.len() + additional, Slot::default);
    }

    /// Removes the slot at `index`, shifting subsequent slots left.
    ///
    /// Cells anchored before `index` whose colspan crosses it shrink by one
    /// column; a cell anchored exactly at `index` with colspan > 1 survives
    /// in place of its first covered slot, also one column narrower.
    pub(crate) fn delete_column(&mut self, index: usize) {
        for i in 0..index {
            if let Slot::Cell(cell) = &mut self.slots[i] {
                if i + cell.colspan() > index {
                    cell.set_colspan(cell.colspan() - 1);
                }
            }
        }
        let removed = self.slots.remove(index);
        if let Slot::Cell(mut cell) = removed {
            if cell.colspan() > 1 && index < self.slots.len() {
                cell.set_colspan(cell.colspan() - 1);
                self.slots[index] = Slot::Cell(cell);
            }
        }
    }

    /// Consumes the row, yielding its slots. Used by the merge rebuild.
    pub(crate) fn into_slots(self) -> Vec<Slot> {
        self.slots
    }
}
