//! # Cell
//!
//! A rectangular content container placed into a table matrix. A cell holds
//! either an ordered sequence of content elements or exactly one nested
//! table; the two states are distinct variants of [`CellContent`], so the
//! merge pass never has to infer "table-placeholder" by inspecting a
//! content list.
//!
//! Styling fields are `Option`s: `None` means "unset, inherit from the
//! table's default cell at placement time".

use std::sync::atomic::{AtomicU64, Ordering};

use crate::content::{Element, ElementKind, Paragraph, Phrase, DEFAULT_LEADING};
use crate::error::TrellisError;
use crate::style::{BorderSides, Color, HorizontalAlignment, VerticalAlignment};

use super::Table;

/// Identity of a placed cell, unique for the lifetime of the process.
///
/// The merge pass consumes the matrix and rebuilds it; callers re-locate
/// their cells in the new grid through the merge map, keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(u64);

impl CellId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        CellId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// What a cell holds: plain content, or exactly one nested table.
#[derive(Debug, Clone)]
pub enum CellContent {
    Elements(Vec<Element>),
    Table(Box<Table>),
}

/// Styling attributes of a cell. Every field is optional; unset fields are
/// filled from the table's default cell when the cell is placed.
#[derive(Debug, Clone, Default)]
pub struct CellStyle {
    pub border: Option<BorderSides>,
    pub border_width: Option<f64>,
    pub border_color: Option<Color>,
    pub background: Option<Color>,
    pub horizontal_alignment: Option<HorizontalAlignment>,
    pub vertical_alignment: Option<VerticalAlignment>,
    /// Per-cell padding override, in points. Tables carry the default.
    pub padding: Option<f64>,
}

impl CellStyle {
    /// Fills every unset field from `defaults`.
    pub(crate) fn inherit_from(&mut self, defaults: &CellStyle) {
        if self.border.is_none() {
            self.border = defaults.border;
        }
        if self.border_width.is_none() {
            self.border_width = defaults.border_width;
        }
        if self.border_color.is_none() {
            self.border_color = defaults.border_color;
        }
        if self.background.is_none() {
            self.background = defaults.background;
        }
        if self.horizontal_alignment.is_none() {
            self.horizontal_alignment = defaults.horizontal_alignment;
        }
        if self.vertical_alignment.is_none() {
            self.vertical_alignment = defaults.vertical_alignment;
        }
        if self.padding.is_none() {
            self.padding = defaults.padding;
        }
    }
}

/// A cell of the matrix.
#[derive(Debug, Clone)]
pub struct Cell {
    id: CellId,
    content: CellContent,
    colspan: usize,
    rowspan: usize,
    header: bool,
    /// Line height of the content. Seeded by the first phrase-like element
    /// added when unset.
    leading: Option<f64>,
    /// Cap on rendered lines; `None` means unlimited.
    max_lines: Option<usize>,
    /// Text appended when `max_lines` truncates, e.g. "...".
    truncation_marker: Option<String>,
    style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Self::new()
    }
}

impl Cell {
    /// An empty cell with all styling unset (inherits table defaults).
    pub fn new() -> Self {
        Self {
            id: CellId::fresh(),
            content: CellContent::Elements(Vec::new()),
            colspan: 1,
            rowspan: 1,
            header: false,
            leading: None,
            max_lines: None,
            truncation_marker: None,
            style: CellStyle {
                border_width: Some(0.5),
                ..CellStyle::default()
            },
        }
    }

    /// A cell containing one phrase; the phrase's leading becomes the
    /// cell's.
    pub fn from_phrase(phrase: Phrase) -> Self {
        let mut cell = Cell::new();
        cell.leading = phrase.leading;
        // an empty phrase is skipped, same as add()
        if !phrase.is_empty() {
            if let CellContent::Elements(elements) = &mut cell.content {
                elements.push(Element::Phrase(phrase));
            }
        }
        cell
    }

    /// A cell containing one paragraph of plain text.
    pub fn from_text(content: &str) -> Self {
        let mut cell = Cell::new();
        // infallible: a paragraph is always a legal cell element
        let _ = cell.add(Element::Paragraph(Paragraph::new(content)));
        cell
    }

    /// The 3-column-spanning spacer used when wrapping nested tables.
    fn dummy() -> Self {
        let mut cell = Cell::new();
        cell.content = CellContent::Elements(vec![Element::Paragraph(Paragraph::empty())]);
        cell.colspan = 3;
        cell.style.border = Some(BorderSides::NONE);
        cell
    }

    // ── Content ────────────────────────────────────────────────

    /// Adds a content element.
    ///
    /// Bare list items are rejected; empty chunks, phrases and lists are
    /// silently skipped. The first phrase-like element seeds the cell's
    /// leading when unset. If this cell already wraps a nested table, the
    /// element is appended as a full-width row of the wrapper instead.
    pub fn add(&mut self, element: Element) -> Result<(), TrellisError> {
        if let CellContent::Table(wrapper) = &mut self.content {
            let mut extra = Cell::new();
            extra.style.border = Some(BorderSides::NONE);
            extra.colspan = wrapper.columns();
            extra.add(element)?;
            wrapper.add_cell(extra);
            return Ok(());
        }

        if element.kind() == ElementKind::ListItem {
            return Err(TrellisError::BadElement(
                "list items cannot be added to a cell directly; add the whole list".to_string(),
            ));
        }
        if self.leading.is_none() {
            self.leading = element.leading();
        }
        if element.is_empty() {
            return Ok(());
        }
        if let CellContent::Elements(elements) = &mut self.content {
            elements.push(element);
        }
        Ok(())
    }

    /// Nests a table inside this cell.
    ///
    /// The existing content and the new table are arranged into a 3-column
    /// wrapper table: spacer columns on either side sized from the nested
    /// table's own width and alignment, prior content in a full-width row
    /// above. The wrapper becomes the cell's sole content and marks it as a
    /// table placeholder for the merge pass.
    pub fn add_table(&mut self, table: Table) -> Result<(), TrellisError> {
        if let CellContent::Table(wrapper) = &mut self.content {
            // already wrapping: nest into the wrapper's center column
            wrapper.insert_table_at_cursor(table)?;
            return Ok(());
        }

        let mut wrapper = Table::new(3)?;
        let table_width = table.width();
        let widths = match table.alignment() {
            HorizontalAlignment::Left => [0.0, table_width, 100.0 - table_width],
            HorizontalAlignment::Right => [100.0 - table_width, table_width, 0.0],
            _ => {
                let side = (100.0 - table_width) / 2.0;
                [side, table_width, side]
            }
        };
        wrapper.set_widths(&widths)?;

        let existing = match &mut self.content {
            CellContent::Elements(elements) => std::mem::take(elements),
            CellContent::Table(_) => unreachable!("handled above"),
        };
        if existing.is_empty() {
            wrapper.add_cell(Cell::dummy());
        } else {
            let mut content_cell = Cell::new();
            content_cell.style.border = Some(BorderSides::NONE);
            content_cell.colspan = 3;
            for element in existing {
                content_cell.add(element)?;
            }
            wrapper.add_cell(content_cell);
        }

        let mut spacer = Cell::new();
        spacer.style.border = Some(BorderSides::NONE);
        wrapper.add_cell(spacer.clone());
        wrapper.insert_table_at_cursor(table)?;
        wrapper.add_cell(spacer);
        wrapper.add_cell(Cell::dummy());

        self.content = CellContent::Table(Box::new(wrapper));
        Ok(())
    }

    /// Makes sure there is at least one element in the cell, so it is never
    /// invisible to the renderer. Called at placement time.
    pub(crate) fn fill(&mut self) {
        if let CellContent::Elements(elements) = &mut self.content {
            if elements.is_empty() {
                elements.push(Element::Paragraph(Paragraph::empty()));
            }
        }
    }

    /// Is this cell a placeholder for a nested table?
    pub fn is_table(&self) -> bool {
        matches!(self.content, CellContent::Table(_))
    }

    /// `false` as soon as the cell holds any renderable content.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            CellContent::Table(_) => false,
            CellContent::Elements(elements) => match elements.as_slice() {
                [] => true,
                [single] => single.is_empty(),
                _ => false,
            },
        }
    }

    pub fn content(&self) -> &CellContent {
        &self.content
    }

    pub(crate) fn take_content(&mut self) -> CellContent {
        std::mem::replace(&mut self.content, CellContent::Elements(Vec::new()))
    }

    // ── Identity & spans ───────────────────────────────────────

    /// The identity the merge map is keyed by.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Re-stamps the identity; done once when the cell is placed so cloned
    /// templates (auto-fill, convenience insertion) stay distinguishable.
    pub(crate) fn assign_fresh_id(&mut self) -> CellId {
        self.id = CellId::fresh();
        self.id
    }

    pub fn colspan(&self) -> usize {
        self.colspan
    }

    /// Spans below 1 are clamped to 1.
    pub fn set_colspan(&mut self, value: usize) {
        self.colspan = value.max(1);
    }

    pub fn rowspan(&self) -> usize {
        self.rowspan
    }

    /// Spans below 1 are clamped to 1.
    pub fn set_rowspan(&mut self, value: usize) {
        self.rowspan = value.max(1);
    }

    // ── Attributes ─────────────────────────────────────────────

    pub fn is_header(&self) -> bool {
        self.header
    }

    pub fn set_header(&mut self, value: bool) {
        self.header = value;
    }

    /// The cell's leading, falling back to the engine default.
    pub fn leading(&self) -> f64 {
        self.leading.unwrap_or(DEFAULT_LEADING)
    }

    pub fn set_leading(&mut self, value: f64) {
        self.leading = Some(value);
    }

    pub fn max_lines(&self) -> Option<usize> {
        self.max_lines
    }

    pub fn set_max_lines(&mut self, value: usize) {
        self.max_lines = Some(value);
    }

    pub fn truncation_marker(&self) -> Option<&str> {
        self.truncation_marker.as_deref()
    }

    pub fn set_truncation_marker(&mut self, marker: &str) {
        self.truncation_marker = Some(marker.to_string());
    }

    pub fn style(&self) -> &CellStyle {
        &self.style
    }

    pub fn style_mut(&mut self) -> &mut CellStyle {
        &mut self.style
    }

    pub(crate) fn inherit_style(&mut self, defaults: &CellStyle) {
        self.style.inherit_from(defaults);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Chunk, List, ListItem};

    #[test]
    fn test_rejects_bare_list_item() {
        let mut cell = Cell::new();
        let item = ListItem {
            phrase: Phrase::new("item"),
        };
        assert!(cell.add(Element::ListItem(item)).is_err());
    }

    #[test]
    fn test_skips_empty_content() {
        let mut cell = Cell::new();
        cell.add(Element::Chunk(Chunk::new("   "))).unwrap();
        cell.add(Element::List(List::default())).unwrap();
        assert!(cell.is_empty());
    }

    #[test]
    fn test_leading_seeded_by_first_phrase() {
        let mut cell = Cell::new();
        cell.add(Element::Phrase(Phrase::with_leading("x", 20.0)))
            .unwrap();
        cell.add(Element::Phrase(Phrase::with_leading("y", 99.0)))
            .unwrap();
        assert!((cell.leading() - 20.0).abs() < 0.001);
    }

    #[test]
    fn test_spans_clamp_to_one() {
        let mut cell = Cell::new();
        cell.set_colspan(0);
        cell.set_rowspan(0);
        assert_eq!(cell.colspan(), 1);
        assert_eq!(cell.rowspan(), 1);
    }

    #[test]
    fn test_add_table_wraps_into_placeholder() {
        let mut cell = Cell::from_text("before");
        let mut nested = Table::new(2).unwrap();
        nested.add_cell(Cell::from_text("a"));
        nested.add_cell(Cell::from_text("b"));
        cell.add_table(nested).unwrap();

        assert!(cell.is_table());
        let wrapper = match cell.content() {
            CellContent::Table(t) => t,
            _ => panic!("expected wrapper table"),
        };
        assert_eq!(wrapper.columns(), 3);
        // content row + table row + trailing dummy row
        assert_eq!(wrapper.row_count(), 3);
    }

    #[test]
    fn test_wrapper_widths_follow_alignment() {
        let mut nested = Table::new(1).unwrap();
        nested.set_width(60.0);
        nested.set_alignment(HorizontalAlignment::Left);
        nested.add_cell(Cell::from_text("x"));

        let mut cell = Cell::new();
        cell.add_table(nested).unwrap();
        let wrapper = match cell.content() {
            CellContent::Table(t) => t,
            _ => panic!("expected wrapper table"),
        };
        let widths = wrapper.widths();
        assert!((widths[0] - 0.0).abs() < 0.001);
        assert!((widths[1] - 60.0).abs() < 0.001);
        assert!((widths[2] - 40.0).abs() < 0.001);
    }
}
