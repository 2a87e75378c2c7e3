//! # Content Model
//!
//! The leaf payloads a cell can hold: text runs, phrases, paragraphs, and
//! lists. The matrix engine treats these as opaque values. It only ever asks
//! three things of an element: what kind it is, whether it is empty, and
//! (for phrase-like kinds) its leading, which seeds a cell's default line
//! height. Everything else about an element belongs to the downstream
//! renderer.

use crate::style::HorizontalAlignment;
use serde::{Deserialize, Serialize};

/// Default leading used when neither the cell nor its content set one.
pub const DEFAULT_LEADING: f64 = 16.0;

/// A font reference. Opaque to the matrix engine; resolved by the font
/// service at render time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    /// Font family name (e.g. "Helvetica").
    #[serde(default)]
    pub family: Option<String>,
    /// Font size in points.
    #[serde(default)]
    pub size: Option<f64>,
}

/// The smallest unit of text: a string rendered with one font.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub content: String,
    #[serde(default)]
    pub font: Font,
}

impl Chunk {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            font: Font::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A sequence of chunks sharing one leading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phrase {
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    /// Line height in points. `None` means "use the consumer's default".
    #[serde(default)]
    pub leading: Option<f64>,
}

impl Phrase {
    pub fn new(content: &str) -> Self {
        Self {
            chunks: vec![Chunk::new(content)],
            leading: None,
        }
    }

    pub fn with_leading(content: &str, leading: f64) -> Self {
        Self {
            chunks: vec![Chunk::new(content)],
            leading: Some(leading),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.iter().all(Chunk::is_empty)
    }
}

/// A phrase with block-level behavior: its own alignment and spacing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    #[serde(flatten)]
    pub phrase: Phrase,
    #[serde(default)]
    pub alignment: HorizontalAlignment,
}

impl Paragraph {
    pub fn new(content: &str) -> Self {
        Self {
            phrase: Phrase::new(content),
            alignment: HorizontalAlignment::default(),
        }
    }

    /// An empty paragraph, used to pad otherwise contentless cells.
    pub fn empty() -> Self {
        Self {
            phrase: Phrase {
                chunks: vec![],
                leading: Some(0.0),
            },
            alignment: HorizontalAlignment::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.phrase.is_empty()
    }
}

/// One entry of a list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub phrase: Phrase,
}

/// An ordered or unordered list of items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    #[serde(default)]
    pub items: Vec<ListItem>,
    #[serde(default)]
    pub numbered: bool,
    /// Indentation of the item symbol in points.
    #[serde(default)]
    pub symbol_indent: f64,
}

impl List {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the item leadings, used to seed a cell's leading the same way
    /// a phrase's leading does.
    pub fn total_leading(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.phrase.leading.unwrap_or(DEFAULT_LEADING))
            .sum()
    }
}

/// The kinds of content element a cell distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Chunk,
    Phrase,
    Paragraph,
    List,
    ListItem,
}

/// A content element. Rows and cells are deliberately not representable
/// here; the type system carries that part of the content contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Element {
    Chunk(Chunk),
    Phrase(Phrase),
    Paragraph(Paragraph),
    List(List),
    /// A bare list item. Representable so that rejection is observable:
    /// cells accept whole lists, never raw items.
    ListItem(ListItem),
}

impl Element {
    /// What kind of element this is.
    pub fn kind(&self) -> ElementKind {
        match self {
            Element::Chunk(_) => ElementKind::Chunk,
            Element::Phrase(_) => ElementKind::Phrase,
            Element::Paragraph(_) => ElementKind::Paragraph,
            Element::List(_) => ElementKind::List,
            Element::ListItem(_) => ElementKind::ListItem,
        }
    }

    /// Is there anything to render?
    pub fn is_empty(&self) -> bool {
        match self {
            Element::Chunk(c) => c.is_empty(),
            Element::Phrase(p) => p.is_empty(),
            Element::Paragraph(p) => p.is_empty(),
            Element::List(l) => l.is_empty(),
            Element::ListItem(item) => item.phrase.is_empty(),
        }
    }

    /// The leading this element would propagate to an enclosing cell whose
    /// own leading is unset. `None` for chunk-level content.
    pub fn leading(&self) -> Option<f64> {
        match self {
            Element::Phrase(p) => p.leading,
            Element::Paragraph(p) => p.phrase.leading,
            Element::List(l) => Some(l.total_leading()),
            Element::Chunk(_) | Element::ListItem(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_emptiness() {
        assert!(Chunk::new("").is_empty());
        assert!(Chunk::new("   ").is_empty());
        assert!(!Chunk::new("x").is_empty());
    }

    #[test]
    fn test_phrase_leading_propagation() {
        let p = Phrase::with_leading("hello", 14.0);
        let el = Element::Phrase(p);
        assert_eq!(el.leading(), Some(14.0));
        assert!(Element::Chunk(Chunk::new("hello")).leading().is_none());
    }

    #[test]
    fn test_list_total_leading() {
        let list = List {
            items: vec![
                ListItem {
                    phrase: Phrase::with_leading("a", 12.0),
                },
                ListItem {
                    phrase: Phrase::new("b"), // defaults
                },
            ],
            numbered: false,
            symbol_indent: 0.0,
        };
        assert!((list.total_leading() - (12.0 + DEFAULT_LEADING)).abs() < 0.001);
    }
}
