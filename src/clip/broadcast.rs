use crate::clip::geometry::Point;
use crate::clip::model::ToolState;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

/// Wire schema of the cross-window protocol. Only discrete lifecycle
/// events travel here; pointer-move samples never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum ClipEvent {
    ClipStart,
    #[serde(rename_all = "camelCase")]
    ClipEnd { display_id: u32 },
    #[serde(rename_all = "camelCase")]
    ClipEndCurrentDisplay {
        display_id: u32,
        global_right_bottom: Point,
    },
    ClipToolSelect(ToolState),
    ClipToolStart(ToolState),
    ClipToolEnd(ToolState),
    ClipCancel,
}

impl ClipEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClipStart => "clip-start",
            Self::ClipEnd { .. } => "clip-end",
            Self::ClipEndCurrentDisplay { .. } => "clip-end-current-display",
            Self::ClipToolSelect(_) => "clip-tool-select",
            Self::ClipToolStart(_) => "clip-tool-start",
            Self::ClipToolEnd(_) => "clip-tool-end",
            Self::ClipCancel => "clip-cancel",
        }
    }
}

/// Inbound event queue owned by exactly one window. Drained cooperatively
/// on the window's own loop tick.
pub struct Mailbox {
    rx: Receiver<ClipEvent>,
}

impl Mailbox {
    pub fn try_next(&self) -> Option<ClipEvent> {
        self.rx.try_recv().ok()
    }
}

/// Fan-out bus connecting every window of one clip invocation.
///
/// Delivery is fire-and-forget and at-most-once; each mailbox preserves
/// send order. The publisher receives its own events too, which is what
/// drives the sending window's state machine.
#[derive(Clone, Default)]
pub struct BroadcastBus {
    subscribers: Arc<Mutex<Vec<Sender<ClipEvent>>>>,
}

impl BroadcastBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Mailbox {
        let (tx, rx) = channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        Mailbox { rx }
    }

    pub fn publish(&self, event: ClipEvent) {
        tracing::debug!(kind = event.kind(), "broadcast clip event");
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::{BroadcastBus, ClipEvent};
    use crate::clip::geometry::Point;
    use crate::clip::model::{ToolKind, ToolState};

    #[test]
    fn publish_fans_out_to_every_mailbox_including_sender() {
        let bus = BroadcastBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();

        bus.publish(ClipEvent::ClipStart);
        assert_eq!(a.try_next(), Some(ClipEvent::ClipStart));
        assert_eq!(b.try_next(), Some(ClipEvent::ClipStart));
        assert_eq!(a.try_next(), None);
    }

    #[test]
    fn mailbox_preserves_send_order() {
        let bus = BroadcastBus::new();
        let mailbox = bus.subscribe();

        bus.publish(ClipEvent::ClipStart);
        bus.publish(ClipEvent::ClipEnd { display_id: 2 });
        bus.publish(ClipEvent::ClipCancel);

        assert_eq!(mailbox.try_next(), Some(ClipEvent::ClipStart));
        assert_eq!(mailbox.try_next(), Some(ClipEvent::ClipEnd { display_id: 2 }));
        assert_eq!(mailbox.try_next(), Some(ClipEvent::ClipCancel));
    }

    #[test]
    fn dropped_mailboxes_are_pruned_silently() {
        let bus = BroadcastBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(ClipEvent::ClipCancel);
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.try_next(), Some(ClipEvent::ClipCancel));
    }

    #[test]
    fn wire_form_uses_kebab_case_kinds() {
        let event = ClipEvent::ClipEndCurrentDisplay {
            display_id: 2,
            global_right_bottom: Point::new(1950, 500),
        };
        let wire = serde_json::to_string(&event).expect("serialize event");
        assert!(wire.contains("\"clip-end-current-display\""));
        assert!(wire.contains("\"displayId\":2"));

        let back: ClipEvent = serde_json::from_str(&wire).expect("deserialize event");
        assert_eq!(back, event);
        assert_eq!(back.kind(), "clip-end-current-display");
    }

    #[test]
    fn tool_events_carry_full_tool_state() {
        let state = ToolState {
            current_tool: Some(ToolKind::Line),
            ..ToolState::default()
        };
        let wire = serde_json::to_string(&ClipEvent::ClipToolStart(state)).expect("serialize");
        let back: ClipEvent = serde_json::from_str(&wire).expect("deserialize");
        assert_eq!(back, ClipEvent::ClipToolStart(state));
    }
}
