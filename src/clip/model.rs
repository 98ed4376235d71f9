use crate::clip::geometry::Point;
use serde::{Deserialize, Serialize};

/// Closed set of annotation tools. Every consumption site matches
/// exhaustively, so adding a tool is a compile-time-checked exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Line,
    Rect,
}

/// Stroke widths offered by the toolbar, thinnest first.
pub const LINE_WIDTH_CHOICES: [u32; 3] = [2, 4, 6];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#rrggbb` toolbar color. Alpha is always opaque.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::rgba(r, g, b, 255))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// In-progress or committed geometry of one tool gesture. Points are
/// global-space; `end_point` stays absent while the gesture is live.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolData {
    pub start_point: Option<Point>,
    pub end_point: Option<Point>,
    pub line_width: u32,
    pub stroke: Color,
}

impl Default for ToolData {
    fn default() -> Self {
        Self {
            start_point: None,
            end_point: None,
            line_width: LINE_WIDTH_CHOICES[0],
            stroke: Color::rgba(255, 0, 0, 255),
        }
    }
}

/// One named slot per known tool, never partially absent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolDataMap {
    pub line: ToolData,
    pub rect: ToolData,
}

impl ToolDataMap {
    pub fn get(&self, tool: ToolKind) -> &ToolData {
        match tool {
            ToolKind::Line => &self.line,
            ToolKind::Rect => &self.rect,
        }
    }

    pub fn get_mut(&mut self, tool: ToolKind) -> &mut ToolData {
        match tool {
            ToolKind::Line => &mut self.line,
            ToolKind::Rect => &mut self.rect,
        }
    }
}

/// Replicated tool selection, kept consistent across windows by the
/// broadcast protocol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolState {
    pub current_tool: Option<ToolKind>,
    pub tool_data: ToolDataMap,
}

/// Entry of the append-only annotation log. Log order is render order:
/// later entries are layered on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawnAnnotation {
    pub tool: ToolKind,
    pub data: ToolData,
}
