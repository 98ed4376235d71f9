//! Multi-display clip sessions: freeze every screen, drive a replicated
//! selection state machine per window over a broadcast bus, then compose
//! and export the selected region with its annotations.

pub mod broadcast;
pub mod capture;
pub mod composite;
pub mod display;
pub mod geometry;
pub mod model;
pub mod save;
pub mod screenshot;
pub mod service;
pub mod session;
pub mod state;

pub use broadcast::{BroadcastBus, ClipEvent, Mailbox};
pub use capture::{ScreenSource, SystemScreenSource};
pub use composite::compose;
pub use display::{desktop_bounds, Display, DisplayRegistry};
pub use geometry::{detect_area, scale_point, Area2D, DesktopBounds, Point, MIN_SELECTION_EXTENT};
pub use model::{
    Color, DrawnAnnotation, ToolData, ToolDataMap, ToolKind, ToolState, LINE_WIDTH_CHOICES,
};
pub use save::{default_output_path, encode_png, timestamped_stem, FileClipboardSink, OutputSink};
pub use screenshot::{encode_image, Screenshot, ShotFormat};
pub use service::{ClipRuntime, CommitAction};
pub use session::WindowSession;
pub use state::{can_transition, ClipPhase, Selection};
