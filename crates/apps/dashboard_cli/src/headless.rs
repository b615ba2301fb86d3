//! Collaborators that log instead of drawing.

use dashboard::chart::BarChartOption;
use dashboard::popup::Popup;
use dashboard::selection::HighlightOverlay;
use dashboard::surface::{
    BoxFuture, ChartHandle, ChartSurface, GraphicId, NavigationError, SketchEvent, SketchTool,
    ViewSurface,
};
use dashboard::view::{ViewMode, ViewTransition};
use foundation::bounds::Extent;
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

pub struct HeadlessSurface {
    updating: watch::Sender<bool>,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        let (updating, _) = watch::channel(false);
        Self { updating }
    }
}

impl ViewSurface for HeadlessSurface {
    fn apply_transition(&self, transition: &ViewTransition) {
        info!(
            bound = transition.bound.label(),
            container = %transition.container,
            toggle = transition.toggle_label,
            "view bound"
        );
    }

    fn show_highlights(&self, mode: ViewMode, overlay: &HighlightOverlay) {
        debug!(mode = mode.label(), count = overlay.len(), "highlights drawn");
    }

    fn updating(&self) -> watch::Receiver<bool> {
        self.updating.subscribe()
    }

    fn go_to(&self, mode: ViewMode, target: Extent) -> BoxFuture<'_, Result<(), NavigationError>> {
        debug!(mode = mode.label(), ?target, "go to");
        Box::pin(async { Ok(()) })
    }

    fn open_popup(&self, mode: ViewMode, popup: &Popup) {
        debug!(mode = mode.label(), title = %popup.title, "popup opened");
    }
}

pub struct HeadlessSketch {
    events: broadcast::Sender<SketchEvent>,
}

impl Default for HeadlessSketch {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self { events }
    }
}

impl SketchTool for HeadlessSketch {
    fn subscribe(&self) -> broadcast::Receiver<SketchEvent> {
        self.events.subscribe()
    }

    fn remove_graphic(&self, id: GraphicId) {
        debug!(graphic = id.0, "sketch graphic removed");
    }
}

#[derive(Default)]
pub struct HeadlessChart {
    last: Mutex<Option<BarChartOption>>,
}

impl HeadlessChart {
    pub fn last_option(&self) -> Option<BarChartOption> {
        self.last.lock().clone()
    }
}

impl ChartSurface for HeadlessChart {
    fn init(&self, container: &str) -> ChartHandle {
        debug!(container, "chart initialized");
        ChartHandle(1)
    }

    fn set_option(&self, _chart: ChartHandle, option: &BarChartOption) {
        *self.last.lock() = Some(option.clone());
    }

    fn set_panel_visible(&self, visible: bool) {
        debug!(visible, "chart panel");
    }
}
