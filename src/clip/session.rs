use crate::clip::broadcast::{BroadcastBus, ClipEvent, Mailbox};
use crate::clip::display::DisplayRegistry;
use crate::clip::geometry::{detect_area, scale_point, Area2D, Point};
use crate::clip::model::{Color, DrawnAnnotation, ToolKind, ToolState};
use crate::clip::state::{can_transition, ClipPhase, Selection};
use anyhow::{anyhow, Result};

/// Per-window replica of the clip session.
///
/// Each window owns one of these plus its inbound [`Mailbox`]; the only way
/// one window affects another is an event published on the shared bus. The
/// publisher's own replica is driven by self-delivery of the same events.
pub struct WindowSession {
    display_id: u32,
    scale_factor: f32,
    registry: DisplayRegistry,
    bus: BroadcastBus,
    mailbox: Mailbox,
    phase: ClipPhase,
    selection: Selection,
    tools: ToolState,
    annotations: Vec<DrawnAnnotation>,
    cursor_global: Option<Point>,
    toolbar_visible: bool,
    toolbar_bounds: Option<Area2D>,
}

impl WindowSession {
    pub fn new(display_id: u32, registry: DisplayRegistry, bus: &BroadcastBus) -> Result<Self> {
        let scale_factor = registry
            .get(display_id)
            .ok_or_else(|| anyhow!("window display {display_id} is not in the registry"))?
            .scale_factor;
        Ok(Self {
            display_id,
            scale_factor,
            registry,
            bus: bus.clone(),
            mailbox: bus.subscribe(),
            phase: ClipPhase::Idle,
            selection: Selection::default(),
            tools: ToolState::default(),
            annotations: Vec::new(),
            cursor_global: None,
            toolbar_visible: false,
            toolbar_bounds: None,
        })
    }

    pub fn display_id(&self) -> u32 {
        self.display_id
    }

    pub fn phase(&self) -> ClipPhase {
        self.phase
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn annotations(&self) -> &[DrawnAnnotation] {
        &self.annotations
    }

    pub fn toolbar_visible(&self) -> bool {
        self.toolbar_visible
    }

    /// Toolbar rectangle in this window's client space, registered by the
    /// UI layer so pointer events over chrome never reach the selection.
    pub fn set_toolbar_bounds(&mut self, bounds: Option<Area2D>) {
        self.toolbar_bounds = bounds;
    }

    /// Track a pointer-move sample from the local input hook. Samples are
    /// coalesced locally and never broadcast.
    pub fn observe_cursor(&mut self, global: Point) {
        let Some(bounds) = self.registry.bounds() else {
            return;
        };
        if !bounds.contains(global) {
            return;
        }
        self.cursor_global = Some(global);

        if self.phase == ClipPhase::Dragging && self.selection.is_clipping {
            self.selection.end_client = self.registry.global_to_client(global, self.display_id);
            self.selection.end_global = Some(global);
            self.selection.end_normalized = self.registry.global_to_normalized(global);
        }
    }

    /// Local left-button press. Broadcasts `clip-tool-start` when a tool is
    /// armed and the press lands inside the selection, `clip-start`
    /// otherwise; presses outside this display or over chrome are ignored.
    pub fn pointer_down(&mut self) {
        let Some((global, client)) = self.local_cursor() else {
            return;
        };
        if self.is_over_chrome(client) {
            return;
        }

        if self.tool_gesture_armed(client) {
            let mut payload = self.tools;
            if let Some(tool) = payload.current_tool {
                let data = payload.tool_data.get_mut(tool);
                data.start_point = Some(global);
                data.end_point = None;
            }
            self.bus.publish(ClipEvent::ClipToolStart(payload));
            return;
        }

        self.bus.publish(ClipEvent::ClipStart);
    }

    /// Local left-button release; the counterpart of [`Self::pointer_down`].
    pub fn pointer_up(&mut self) {
        let Some((global, client)) = self.local_cursor() else {
            return;
        };
        if self.is_over_chrome(client) {
            return;
        }

        if self.phase == ClipPhase::ToolDrawing {
            let mut payload = self.tools;
            if let Some(tool) = payload.current_tool {
                payload.tool_data.get_mut(tool).end_point = Some(global);
            }
            self.bus.publish(ClipEvent::ClipToolEnd(payload));
            return;
        }

        self.bus.publish(ClipEvent::ClipEnd {
            display_id: self.display_id,
        });
    }

    /// Toolbar action: arm or disarm an annotation tool.
    pub fn select_tool(&mut self, tool: Option<ToolKind>) {
        let payload = ToolState {
            current_tool: tool,
            tool_data: self.tools.tool_data,
        };
        self.bus.publish(ClipEvent::ClipToolSelect(payload));
    }

    /// Toolbar action: restyle a tool; replicated like any other change.
    pub fn set_tool_style(&mut self, tool: ToolKind, line_width: u32, stroke: Color) {
        let mut payload = self.tools;
        let data = payload.tool_data.get_mut(tool);
        data.line_width = line_width;
        data.stroke = stroke;
        self.bus.publish(ClipEvent::ClipToolSelect(payload));
    }

    pub fn request_cancel(&self) {
        self.bus.publish(ClipEvent::ClipCancel);
    }

    /// Drain the inbound mailbox, applying every pending event. Returns the
    /// number of events applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.mailbox.try_next() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Commit the selection: yields the crop rectangle in scaled-normalized
    /// space, or `None` when nothing is selected. The caller composes the
    /// final image and then broadcasts the teardown.
    pub fn commit(&mut self) -> Option<Area2D> {
        if self.phase != ClipPhase::Selected || !self.selection.is_user_selected {
            return None;
        }
        let area = detect_area(
            scale_point(self.selection.start_normalized, self.scale_factor),
            scale_point(self.selection.end_normalized, self.scale_factor),
        )?;
        self.transition(ClipPhase::Committed);
        Some(area)
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    fn apply(&mut self, event: ClipEvent) {
        if self.phase.is_terminal() {
            // A window that already tore down may still see late deliveries.
            tracing::debug!(kind = event.kind(), phase = ?self.phase, "ignoring stale clip event");
            return;
        }

        match event {
            ClipEvent::ClipStart => self.apply_clip_start(),
            ClipEvent::ClipEnd { display_id } => self.apply_clip_end(display_id),
            ClipEvent::ClipEndCurrentDisplay {
                display_id,
                global_right_bottom,
            } => {
                // Addressed to the owning display's window only.
                if display_id != self.display_id {
                    return;
                }
                tracing::debug!(
                    display_id,
                    ?global_right_bottom,
                    "taking toolbar ownership from remote hit-test"
                );
                self.toolbar_visible = true;
            }
            ClipEvent::ClipToolSelect(state) => {
                self.tools = state;
            }
            ClipEvent::ClipToolStart(state) => {
                if !self.selection.is_user_selected {
                    return;
                }
                if self.transition(ClipPhase::ToolDrawing) {
                    self.tools = state;
                }
            }
            ClipEvent::ClipToolEnd(state) => self.apply_tool_end(state),
            ClipEvent::ClipCancel => {
                self.transition(ClipPhase::Cancelled);
                self.toolbar_visible = false;
                self.selection = Selection::default();
                self.annotations.clear();
            }
        }
    }

    fn apply_clip_start(&mut self) {
        let Some(global) = self.cursor_global else {
            tracing::warn!(display_id = self.display_id, "clip-start without a cursor sample");
            return;
        };
        if !self.transition(ClipPhase::Dragging) {
            return;
        }

        let client = self
            .registry
            .global_to_client(global, self.display_id)
            .unwrap_or(global);
        let normalized = self.registry.global_to_normalized(global).unwrap_or(global);
        self.selection.begin(client, global, normalized);
        self.tools.current_tool = None;
        self.toolbar_visible = false;
    }

    fn apply_clip_end(&mut self, origin_display_id: u32) {
        if !self.registry.contains_id(origin_display_id) {
            tracing::warn!(
                origin_display_id,
                "clip-end names an unknown display, ignoring"
            );
            return;
        }
        if self.phase != ClipPhase::Dragging {
            tracing::debug!(phase = ?self.phase, "clip-end outside a drag, ignoring");
            return;
        }
        let Some(global) = self.cursor_global else {
            tracing::warn!(display_id = self.display_id, "clip-end without a cursor sample");
            return;
        };

        let client = self
            .registry
            .global_to_client(global, self.display_id)
            .unwrap_or(global);
        let normalized = self.registry.global_to_normalized(global).unwrap_or(global);
        self.selection.finish(client, global, normalized);

        let next = if self.selection.is_user_selected {
            ClipPhase::Selected
        } else {
            ClipPhase::Idle
        };
        self.transition(next);

        // Only the window whose display saw the pointer-up resolves
        // ownership; every other replica just records the end points.
        if origin_display_id == self.display_id && self.selection.is_user_selected {
            self.resolve_ownership();
        }
    }

    /// Owner = the display containing the selection's global bottom-right
    /// corner. A drag may start on one display and end on another; exactly
    /// one window gets to present the toolbar, and this is the tie-break.
    fn resolve_ownership(&mut self) {
        let Some(area) = self.selection.client_area() else {
            return;
        };
        let right_bottom = area.right_bottom();
        let Some(right_bottom_global) = self
            .registry
            .client_to_global(right_bottom, self.display_id)
        else {
            return;
        };

        match self.registry.hit_test(right_bottom_global) {
            Some(owner) if owner.id == self.display_id => {
                self.toolbar_visible = true;
            }
            Some(owner) => {
                let owner_id = owner.id;
                self.bus.publish(ClipEvent::ClipEndCurrentDisplay {
                    display_id: owner_id,
                    global_right_bottom: right_bottom_global,
                });
            }
            None => {
                // Invariant violation: the corner lies outside every known
                // display. Surface everything needed to diagnose it.
                tracing::error!(
                    selection = ?area,
                    ?right_bottom_global,
                    displays = ?self.registry.displays(),
                    "selection corner hit no display, aborting ownership resolution"
                );
            }
        }
    }

    fn apply_tool_end(&mut self, state: ToolState) {
        if !self.transition(ClipPhase::Selected) {
            return;
        }
        self.tools = state;

        let Some(tool) = state.current_tool else {
            return;
        };
        let data = *state.tool_data.get(tool);
        if data.start_point.is_none() || data.end_point.is_none() {
            tracing::warn!(?tool, "clip-tool-end without both endpoints, not recording");
            return;
        }

        let entry = DrawnAnnotation { tool, data };
        // Redundant deliveries of the same gesture must not duplicate it.
        if self.annotations.last() == Some(&entry) {
            return;
        }
        self.annotations.push(entry);
    }

    fn transition(&mut self, to: ClipPhase) -> bool {
        if !can_transition(self.phase, to) {
            tracing::debug!(from = ?self.phase, ?to, "rejected clip phase transition");
            return false;
        }
        self.phase = to;
        true
    }

    fn local_cursor(&self) -> Option<(Point, Point)> {
        let global = self.cursor_global?;
        let own = self.registry.get(self.display_id)?;
        if !own.contains_global(global) {
            return None;
        }
        let client = self.registry.global_to_client(global, self.display_id)?;
        Some((global, client))
    }

    fn is_over_chrome(&self, client: Point) -> bool {
        self.selection.is_user_selected
            && self
                .toolbar_bounds
                .is_some_and(|bounds| bounds.contains(client))
    }

    fn tool_gesture_armed(&self, client: Point) -> bool {
        self.selection.is_user_selected
            && self.tools.current_tool.is_some()
            && self
                .selection
                .client_area()
                .is_some_and(|area| area.contains(client))
    }
}
