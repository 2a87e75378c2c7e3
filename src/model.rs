//! # Declarative Table Descriptions
//!
//! A serde-friendly description of a table, designed to be easily produced
//! by a template engine, an HTML converter, or direct JSON construction.
//! Building a description yields a finished [`Table`]: cells placed,
//! nested tables merged, auto-fill applied.
//!
//! Unlike the programmatic cursor API, the description path is strict:
//! a cell that doesn't fit fails the build instead of being dropped.

use serde::{Deserialize, Serialize};

use crate::error::TrellisError;
use crate::style::{Color, HorizontalAlignment, VerticalAlignment};
use crate::table::{Cell, Location, Table};

fn default_one() -> usize {
    1
}

/// A complete table, described declaratively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDesc {
    /// Number of columns. Must be at least 1.
    pub columns: usize,

    /// Relative column widths; renormalized to percentages summing to 100.
    /// Omitted columns distribute evenly.
    #[serde(default)]
    pub widths: Option<Vec<f64>>,

    /// Table width as a percentage of the available space.
    #[serde(default)]
    pub width: Option<f64>,

    /// Horizontal placement of the table.
    #[serde(default)]
    pub alignment: Option<HorizontalAlignment>,

    /// Default padding inside cells, in points.
    #[serde(default)]
    pub cell_padding: Option<f64>,

    /// Spacing between cells, in points.
    #[serde(default)]
    pub cell_spacing: Option<f64>,

    /// Fill leftover empty slots with default cells when building.
    #[serde(default)]
    pub auto_fill: bool,

    /// The cells, in insertion order.
    #[serde(default)]
    pub cells: Vec<CellDesc>,
}

/// One cell of a described table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellDesc {
    /// Plain text content.
    #[serde(default)]
    pub text: Option<String>,

    /// A nested table as the cell's content. Mutually exclusive with
    /// `text`; the nested table is merged into the parent grid on build.
    #[serde(default)]
    pub table: Option<Box<TableDesc>>,

    /// Explicit anchor row. Give both `row` and `column` or neither;
    /// omitted means "at the cursor".
    #[serde(default)]
    pub row: Option<usize>,

    /// Explicit anchor column.
    #[serde(default)]
    pub column: Option<usize>,

    #[serde(default = "default_one")]
    pub col_span: usize,

    #[serde(default = "default_one")]
    pub row_span: usize,

    /// Header cells repeat when the table breaks across pages.
    #[serde(default)]
    pub header: bool,

    #[serde(default)]
    pub align: Option<HorizontalAlignment>,

    #[serde(default)]
    pub valign: Option<VerticalAlignment>,

    #[serde(default)]
    pub background: Option<Color>,

    /// Line height of the cell content, in points.
    #[serde(default)]
    pub leading: Option<f64>,
}

impl TableDesc {
    /// Builds the described table and completes it: nested tables are
    /// merged and, when `auto_fill` is set, holes are plugged.
    pub fn build(&self) -> Result<Table, TrellisError> {
        let mut table = Table::new(self.columns)?;
        if let Some(widths) = &self.widths {
            table.set_widths(widths)?;
        }
        if let Some(width) = self.width {
            table.set_width(width);
        }
        if let Some(alignment) = self.alignment {
            table.set_alignment(alignment);
        }
        if let Some(padding) = self.cell_padding {
            table.set_cell_padding(padding);
        }
        if let Some(spacing) = self.cell_spacing {
            table.set_cell_spacing(spacing);
        }
        table.set_auto_fill(self.auto_fill);

        for desc in &self.cells {
            let location = match (desc.row, desc.column) {
                (Some(row), Some(column)) => Location::new(row, column),
                (None, None) => table.cursor(),
                _ => {
                    return Err(TrellisError::BadElement(
                        "a cell description needs both row and column, or neither".to_string(),
                    ))
                }
            };

            if let Some(nested) = &desc.table {
                if desc.text.is_some() {
                    return Err(TrellisError::BadElement(
                        "a cell description holds text or a nested table, not both".to_string(),
                    ));
                }
                table.insert_table(nested.build()?, location)?;
                continue;
            }

            let mut cell = match &desc.text {
                Some(text) => Cell::from_text(text),
                None => Cell::new(),
            };
            cell.set_colspan(desc.col_span);
            cell.set_rowspan(desc.row_span);
            cell.set_header(desc.header);
            if let Some(leading) = desc.leading {
                cell.set_leading(leading);
            }
            cell.style_mut().horizontal_alignment = desc.align;
            cell.style_mut().vertical_alignment = desc.valign;
            cell.style_mut().background = desc.background;
            table.add_cell_at(cell, location)?;
        }

        table.complete()?;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple_description() {
        let desc = TableDesc {
            columns: 2,
            widths: Some(vec![1.0, 3.0]),
            width: None,
            alignment: None,
            cell_padding: None,
            cell_spacing: None,
            auto_fill: false,
            cells: vec![
                CellDesc {
                    text: Some("a".to_string()),
                    ..CellDesc::default()
                },
                CellDesc {
                    text: Some("b".to_string()),
                    ..CellDesc::default()
                },
            ],
        };
        let table = desc.build().unwrap();
        assert_eq!(table.dimension(), (2, 1));
        assert!((table.widths()[0] - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_cell_desc_spans_default_to_one() {
        let desc: CellDesc = serde_json::from_str(r#"{"text": "x"}"#).unwrap();
        assert_eq!(desc.col_span, 1);
        assert_eq!(desc.row_span, 1);
    }

    #[test]
    fn test_build_rejects_half_location() {
        let desc = TableDesc {
            columns: 1,
            widths: None,
            width: None,
            alignment: None,
            cell_padding: None,
            cell_spacing: None,
            auto_fill: false,
            cells: vec![CellDesc {
                text: Some("x".to_string()),
                row: Some(0),
                ..CellDesc::default()
            }],
        };
        assert!(matches!(desc.build(), Err(TrellisError::BadElement(_))));
    }
}
