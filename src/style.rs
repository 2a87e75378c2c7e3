//! # Style Primitives
//!
//! Small value types shared by cells and tables: alignment enums, colors,
//! and the border model. This is intentionally a subset of what a full
//! renderer understands; the matrix engine only stores these and hands them
//! through to the downstream renderer untouched.

use serde::{Deserialize, Serialize};

/// Horizontal alignment of content, and of a table within its available
/// width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
    Justified,
}

/// Vertical alignment of content within a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
    Baseline,
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Which sides of a cell or table carry a border line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorderSides {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl BorderSides {
    /// All four sides.
    pub const BOX: BorderSides = BorderSides {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    /// No border at all.
    pub const NONE: BorderSides = BorderSides {
        top: false,
        right: false,
        bottom: false,
        left: false,
    };
}
