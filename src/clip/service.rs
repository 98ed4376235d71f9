use crate::clip::broadcast::{BroadcastBus, ClipEvent};
use crate::clip::capture::ScreenSource;
use crate::clip::composite::compose;
use crate::clip::display::DisplayRegistry;
use crate::clip::save::{encode_png, OutputSink};
use crate::clip::screenshot::{Screenshot, ShotFormat};
use crate::clip::session::WindowSession;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

/// What to do with the composed clip on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitAction {
    SaveTo(PathBuf),
    Clipboard,
}

struct ActiveClip {
    screenshots: Vec<Screenshot>,
    bus: BroadcastBus,
    sessions: Vec<WindowSession>,
}

impl ActiveClip {
    fn pump_all(&mut self) -> usize {
        self.sessions.iter_mut().map(WindowSession::pump).sum()
    }

    fn session_mut(&mut self, display_id: u32) -> Option<&mut WindowSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.display_id() == display_id)
    }
}

/// One clip invocation end to end: freeze the displays, run a replicated
/// session per window, compose and export on commit.
///
/// At most one clip is active at a time; a second `start` while one is
/// running is refused.
pub struct ClipRuntime<S, O> {
    source: S,
    sink: O,
    capture_format: ShotFormat,
    active: Option<ActiveClip>,
}

impl<S: ScreenSource, O: OutputSink> ClipRuntime<S, O> {
    pub fn new(source: S, sink: O) -> Self {
        Self {
            source,
            sink,
            capture_format: ShotFormat::Jpeg,
            active: None,
        }
    }

    pub fn with_capture_format(mut self, format: ShotFormat) -> Self {
        self.capture_format = format;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Freeze every display and open one window session per display.
    pub fn start(&mut self) -> Result<()> {
        if self.active.is_some() {
            bail!("a clip session is already active");
        }

        let displays = self.source.displays()?;
        if displays.is_empty() {
            bail!("no displays attached, nothing to clip");
        }
        let screenshots = self.source.capture(self.capture_format)?;
        let registry = DisplayRegistry::new(displays);

        let bus = BroadcastBus::new();
        let mut sessions = Vec::with_capacity(registry.displays().len());
        for display in registry.displays() {
            sessions.push(WindowSession::new(display.id, registry.clone(), &bus)?);
        }

        tracing::info!(
            displays = sessions.len(),
            format = ?self.capture_format,
            "clip session started"
        );
        self.active = Some(ActiveClip {
            screenshots,
            bus,
            sessions,
        });
        Ok(())
    }

    /// Drain every window's mailbox once. Returns the number of events
    /// applied across all windows.
    pub fn pump(&mut self) -> usize {
        self.active.as_mut().map_or(0, ActiveClip::pump_all)
    }

    pub fn session_mut(&mut self, display_id: u32) -> Option<&mut WindowSession> {
        self.active.as_mut()?.session_mut(display_id)
    }

    /// Commit the selection owned by `display_id`'s window: compose the
    /// frozen desktop, run the requested export, then tear everything down.
    pub fn commit_from(&mut self, display_id: u32, action: CommitAction) -> Result<()> {
        let active = self
            .active
            .as_mut()
            .ok_or_else(|| anyhow!("no clip session is active"))?;
        let session = active
            .session_mut(display_id)
            .ok_or_else(|| anyhow!("no window session for display {display_id}"))?;

        let scale_factor = session.scale_factor();
        let annotations = session.annotations().to_vec();
        let area = session
            .commit()
            .ok_or_else(|| anyhow!("display {display_id} has no committed selection"))?;

        let img = compose(&active.screenshots, area, &annotations, scale_factor)?;
        match &action {
            CommitAction::SaveTo(path) => self.sink.save_bytes(path, &encode_png(&img)?)?,
            CommitAction::Clipboard => self.sink.write_clipboard_image(&img)?,
        }

        active.bus.publish(ClipEvent::ClipCancel);
        active.pump_all();
        self.active = None;
        tracing::info!(display_id, ?action, "clip committed");
        Ok(())
    }

    /// Abort the running clip, if any. Safe to call when idle.
    pub fn cancel(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.bus.publish(ClipEvent::ClipCancel);
            active.pump_all();
            tracing::info!("clip session cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ClipRuntime, CommitAction};
    use crate::clip::capture::ScreenSource;
    use crate::clip::display::{test_display, Display};
    use crate::clip::geometry::Point;
    use crate::clip::save::OutputSink;
    use crate::clip::screenshot::{test_screenshot, Screenshot, ShotFormat};
    use anyhow::Result;
    use image::RgbaImage;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    struct FakeScreens {
        displays: Vec<Display>,
        shots: Vec<Screenshot>,
    }

    impl FakeScreens {
        fn side_by_side() -> Self {
            Self {
                displays: vec![
                    test_display(1, 0, 0, 8, 8),
                    test_display(2, 8, 0, 8, 8),
                ],
                shots: vec![test_screenshot(1, 0, 0, 8, 8), test_screenshot(2, 8, 0, 8, 8)],
            }
        }

        fn empty() -> Self {
            Self {
                displays: Vec::new(),
                shots: Vec::new(),
            }
        }
    }

    impl ScreenSource for FakeScreens {
        fn displays(&self) -> Result<Vec<Display>> {
            Ok(self.displays.clone())
        }

        fn capture(&self, _format: ShotFormat) -> Result<Vec<Screenshot>> {
            Ok(self.shots.clone())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink {
        saved: Arc<Mutex<Vec<(PathBuf, Vec<u8>)>>>,
        clipboard: Arc<Mutex<Vec<(u32, u32)>>>,
    }

    impl OutputSink for RecordingSink {
        fn save_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
            self.saved
                .lock()
                .unwrap()
                .push((path.to_path_buf(), bytes.to_vec()));
            Ok(())
        }

        fn write_clipboard_image(&self, img: &RgbaImage) -> Result<()> {
            self.clipboard.lock().unwrap().push(img.dimensions());
            Ok(())
        }
    }

    fn drag_on(runtime: &mut ClipRuntime<FakeScreens, RecordingSink>, display_id: u32, from: Point, to: Point) {
        {
            let session = runtime.session_mut(display_id).expect("session exists");
            session.observe_cursor(from);
            session.pointer_down();
        }
        runtime.pump();
        {
            let session = runtime.session_mut(display_id).expect("session exists");
            session.observe_cursor(to);
            session.pointer_up();
        }
        runtime.pump();
        runtime.pump();
    }

    #[test]
    fn second_start_while_active_is_refused() {
        let mut runtime = ClipRuntime::new(FakeScreens::side_by_side(), RecordingSink::default());
        runtime.start().expect("first start");
        assert!(runtime.is_active());
        assert!(runtime.start().is_err());

        runtime.cancel();
        assert!(!runtime.is_active());
        runtime.start().expect("restart after cancel");
    }

    #[test]
    fn start_without_displays_is_an_error() {
        let mut runtime = ClipRuntime::new(FakeScreens::empty(), RecordingSink::default());
        assert!(runtime.start().is_err());
        assert!(!runtime.is_active());
    }

    #[test]
    fn commit_saves_cropped_png_and_tears_down() {
        let sink = RecordingSink::default();
        let mut runtime = ClipRuntime::new(FakeScreens::side_by_side(), sink.clone());
        runtime.start().expect("start");

        drag_on(&mut runtime, 1, Point::new(1, 1), Point::new(6, 6));
        runtime
            .commit_from(1, CommitAction::SaveTo(PathBuf::from("/tmp/out.png")))
            .expect("commit");

        assert!(!runtime.is_active(), "runtime returns to idle");
        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, PathBuf::from("/tmp/out.png"));
        let img = image::load_from_memory(&saved[0].1).expect("valid png");
        assert_eq!((img.width(), img.height()), (5, 5));
    }

    #[test]
    fn clipboard_commit_hands_image_to_sink() {
        let sink = RecordingSink::default();
        let mut runtime = ClipRuntime::new(FakeScreens::side_by_side(), sink.clone());
        runtime.start().expect("start");

        drag_on(&mut runtime, 2, Point::new(9, 1), Point::new(14, 5));
        runtime
            .commit_from(2, CommitAction::Clipboard)
            .expect("commit");

        assert_eq!(sink.clipboard.lock().unwrap().as_slice(), &[(5, 4)]);
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[test]
    fn commit_without_selection_keeps_session_alive() {
        let sink = RecordingSink::default();
        let mut runtime = ClipRuntime::new(FakeScreens::side_by_side(), sink.clone());
        runtime.start().expect("start");

        assert!(runtime.commit_from(1, CommitAction::Clipboard).is_err());
        assert!(runtime.is_active(), "failed commit does not tear down");
        assert!(sink.clipboard.lock().unwrap().is_empty());
    }

    #[test]
    fn commit_from_unknown_display_is_an_error() {
        let mut runtime = ClipRuntime::new(FakeScreens::side_by_side(), RecordingSink::default());
        runtime.start().expect("start");
        assert!(runtime.commit_from(99, CommitAction::Clipboard).is_err());
    }
}
