use crate::clip::geometry::{detect_area, Area2D, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipPhase {
    Idle,
    Dragging,
    Selected,
    ToolDrawing,
    Committed,
    Cancelled,
}

impl ClipPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Cancelled)
    }
}

pub fn can_transition(from: ClipPhase, to: ClipPhase) -> bool {
    matches!(
        (from, to),
        (ClipPhase::Idle, ClipPhase::Dragging)
            | (ClipPhase::Dragging, ClipPhase::Selected)
            | (ClipPhase::Dragging, ClipPhase::Idle)
            | (ClipPhase::Selected, ClipPhase::Dragging)
            | (ClipPhase::Selected, ClipPhase::ToolDrawing)
            | (ClipPhase::ToolDrawing, ClipPhase::Selected)
            | (ClipPhase::Selected, ClipPhase::Committed)
            | (ClipPhase::Idle, ClipPhase::Cancelled)
            | (ClipPhase::Dragging, ClipPhase::Cancelled)
            | (ClipPhase::Selected, ClipPhase::Cancelled)
            | (ClipPhase::ToolDrawing, ClipPhase::Cancelled)
    ) || from == to
}

/// Replicated selection record: one instance per window, all kept
/// consistent through the broadcast protocol. Client points are local to
/// the owning window's display; global and normalized points are shared.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub is_clipping: bool,
    pub is_user_selected: bool,
    pub start_client: Option<Point>,
    pub start_global: Option<Point>,
    pub start_normalized: Option<Point>,
    pub end_client: Option<Point>,
    pub end_global: Option<Point>,
    pub end_normalized: Option<Point>,
}

impl Selection {
    /// Selection rectangle in this window's client space, when the drag
    /// cleared the minimum-extent rule.
    pub fn client_area(&self) -> Option<Area2D> {
        detect_area(self.start_client, self.end_client)
    }

    pub fn begin(&mut self, client: Point, global: Point, normalized: Point) {
        *self = Selection {
            is_clipping: true,
            is_user_selected: false,
            start_client: Some(client),
            start_global: Some(global),
            start_normalized: Some(normalized),
            end_client: None,
            end_global: None,
            end_normalized: None,
        };
    }

    pub fn finish(&mut self, client: Point, global: Point, normalized: Point) {
        self.is_clipping = false;
        self.end_client = Some(client);
        self.end_global = Some(global);
        self.end_normalized = Some(normalized);
        self.is_user_selected = self.client_area().is_some();
    }
}
