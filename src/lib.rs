//! # Trellis
//!
//! A document-composition table engine.
//!
//! Most table models force a choice: either every cell lives in a rigid
//! m × n grid, or nesting a table inside a cell pushes coordinate
//! translation into every downstream consumer. Trellis does neither:
//! cells (with row/column spans) and whole nested tables are placed into a
//! sparse matrix, and a single eager reconciliation pass (the merge)
//! flattens everything into one grid with one set of proportional column
//! widths. The renderer only ever sees a flat matrix.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — Declarative descriptions: tables, cells, nesting
//!       ↓
//!   [content]  — Leaf payloads: chunks, phrases, paragraphs, lists
//!       ↓
//!   [table]    — The matrix engine: placement, validation, merge
//!       ↓
//!   Renderer   — Consumes the flat grid row-major (external)
//! ```
//!
//! ## Example
//!
//! ```
//! use trellis::{Cell, Table};
//!
//! let mut table = Table::new(3)?;
//! let mut header = Cell::from_text("header");
//! header.set_colspan(3);
//! header.set_header(true);
//! table.add_cell(header);
//! table.end_headers();
//! table.add_text("1.1");
//! table.add_text("2.1");
//! table.add_text("3.1");
//! table.complete()?;
//! assert_eq!(table.dimension(), (3, 2));
//! # Ok::<(), trellis::TrellisError>(())
//! ```

pub mod content;
pub mod error;
pub mod model;
pub mod style;
pub mod table;

pub use error::TrellisError;
pub use table::{
    Cell, CellContent, CellId, CellStyle, Location, MergeMap, Placement, Row, Slot, Table,
};

use crate::model::TableDesc;

/// Builds a completed table from a JSON description.
///
/// This is the declarative entry point. The returned table has been
/// through [`Table::complete`]: nested tables are merged into the parent
/// grid and, when the description asks for it, empty slots are filled.
pub fn table_from_json(json: &str) -> Result<Table, TrellisError> {
    let desc: TableDesc = serde_json::from_str(json)?;
    desc.build()
}
