//! Scripted collaborators for exercising the dashboard without a renderer.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use foundation::bounds::Extent;
use foundation::geometry::Polygon;
use foundation::ids::FeatureId;
use layers::query::{BoxFuture, FeatureQuery, FeatureStore, InMemoryFeatureStore, QueryError};
use parking_lot::Mutex;
use scene::feature::{Attributes, Feature};
use scene::fields;
use tokio::sync::{broadcast, watch};

use crate::chart::BarChartOption;
use crate::popup::Popup;
use crate::selection::HighlightOverlay;
use crate::surface::{
    ChartHandle, ChartSurface, GraphicId, NavigationError, SketchEvent, SketchGraphic, SketchTool,
    ViewSurface,
};
use crate::view::{ViewMode, ViewTransition};
use crate::{Collaborators, Dashboard, DashboardConfig};

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    Extent::new([x0, y0], [x1, y1]).to_polygon()
}

pub fn graphic(id: u64, geometry: Polygon) -> SketchGraphic {
    SketchGraphic {
        id: GraphicId(id),
        geometry,
    }
}

/// Region with male/female split evenly and 60% urban population.
pub fn population_feature(id: u64, extent: Extent, name: &str, total: f64) -> Feature {
    let urban = total / 5.0 * 3.0;
    let mut attrs = Attributes::new();
    attrs.insert(fields::OBJECT_ID.into(), (id as f64).into());
    attrs.insert(fields::PLACE_NAME.into(), name.into());
    attrs.insert(fields::TOTAL_POPULATION.into(), total.into());
    attrs.insert(fields::MALE.into(), (total / 2.0).into());
    attrs.insert(fields::FEMALE.into(), (total / 2.0).into());
    attrs.insert(fields::URBAN_POPULATION.into(), urban.into());
    attrs.insert(fields::VILLAGE_POPULATION.into(), (total - urban).into());
    Feature::new(FeatureId(id), extent.to_polygon().into(), attrs)
}

/// In-memory store with per-call latency and injectable failures.
pub struct ScriptedStore {
    inner: InMemoryFeatureStore,
    latencies: Mutex<VecDeque<Duration>>,
    failure: Mutex<Option<QueryError>>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            inner: InMemoryFeatureStore::new(features),
            latencies: Mutex::new(VecDeque::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Latency of the next unscripted call, in call order.
    pub fn push_latency(&self, latency: Duration) {
        self.latencies.lock().push_back(latency);
    }

    pub fn fail_with(&self, err: QueryError) {
        *self.failure.lock() = Some(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn all(&self) -> Vec<Arc<Feature>> {
        self.inner.execute(&FeatureQuery::default())
    }
}

impl FeatureStore for ScriptedStore {
    fn query(&self, query: FeatureQuery) -> BoxFuture<'_, Result<Vec<Arc<Feature>>, QueryError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latencies.lock().pop_front().unwrap_or_default();
        let outcome = match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(self.inner.execute(&query)),
        };
        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            outcome
        })
    }
}

pub struct RecordingSurface {
    transitions: Mutex<Vec<ViewTransition>>,
    highlights: Mutex<Vec<(ViewMode, Vec<FeatureId>)>>,
    go_tos: Mutex<Vec<(ViewMode, Extent)>>,
    popups: Mutex<Vec<Popup>>,
    navigation: Mutex<VecDeque<Result<(), NavigationError>>>,
    updating: watch::Sender<bool>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        let (updating, _) = watch::channel(false);
        Self {
            transitions: Mutex::new(Vec::new()),
            highlights: Mutex::new(Vec::new()),
            go_tos: Mutex::new(Vec::new()),
            popups: Mutex::new(Vec::new()),
            navigation: Mutex::new(VecDeque::new()),
            updating,
        }
    }
}

impl RecordingSurface {
    pub fn transitions(&self) -> Vec<ViewTransition> {
        self.transitions.lock().clone()
    }

    pub fn last_highlight(&self) -> (ViewMode, Vec<FeatureId>) {
        self.highlights
            .lock()
            .last()
            .cloned()
            .expect("no highlights drawn")
    }

    pub fn last_highlight_ids(&self) -> Vec<FeatureId> {
        self.last_highlight().1
    }

    pub fn go_tos(&self) -> Vec<(ViewMode, Extent)> {
        self.go_tos.lock().clone()
    }

    pub fn popups(&self) -> Vec<Popup> {
        self.popups.lock().clone()
    }

    /// Outcome of the next `go_to`; unscripted calls succeed.
    pub fn push_navigation(&self, outcome: Result<(), NavigationError>) {
        self.navigation.lock().push_back(outcome);
    }

    pub fn set_updating(&self, updating: bool) {
        self.updating.send_replace(updating);
    }
}

impl ViewSurface for RecordingSurface {
    fn apply_transition(&self, transition: &ViewTransition) {
        self.transitions.lock().push(transition.clone());
    }

    fn show_highlights(&self, mode: ViewMode, overlay: &HighlightOverlay) {
        self.highlights.lock().push((mode, overlay.ids()));
    }

    fn updating(&self) -> watch::Receiver<bool> {
        self.updating.subscribe()
    }

    fn go_to(&self, mode: ViewMode, target: Extent) -> BoxFuture<'_, Result<(), NavigationError>> {
        self.go_tos.lock().push((mode, target));
        let outcome = self.navigation.lock().pop_front().unwrap_or(Ok(()));
        Box::pin(async move { outcome })
    }

    fn open_popup(&self, _mode: ViewMode, popup: &Popup) {
        self.popups.lock().push(popup.clone());
    }
}

#[derive(Default)]
pub struct RecordingChart {
    next_handle: AtomicU64,
    options: Mutex<Vec<BarChartOption>>,
    visibility: Mutex<Vec<bool>>,
}

impl RecordingChart {
    pub fn init_count(&self) -> u64 {
        self.next_handle.load(Ordering::SeqCst)
    }

    pub fn options(&self) -> Vec<BarChartOption> {
        self.options.lock().clone()
    }

    pub fn panel_visible(&self) -> Option<bool> {
        self.visibility.lock().last().copied()
    }
}

impl ChartSurface for RecordingChart {
    fn init(&self, _container: &str) -> ChartHandle {
        ChartHandle(self.next_handle.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn set_option(&self, _chart: ChartHandle, option: &BarChartOption) {
        self.options.lock().push(option.clone());
    }

    fn set_panel_visible(&self, visible: bool) {
        self.visibility.lock().push(visible);
    }
}

pub struct TestSketch {
    events: broadcast::Sender<SketchEvent>,
    removed: Mutex<Vec<GraphicId>>,
}

impl Default for TestSketch {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            events,
            removed: Mutex::new(Vec::new()),
        }
    }
}

impl TestSketch {
    pub fn emit(&self, event: SketchEvent) {
        // No listener attached is fine.
        let _ = self.events.send(event);
    }

    pub fn removed(&self) -> Vec<GraphicId> {
        self.removed.lock().clone()
    }
}

impl SketchTool for TestSketch {
    fn subscribe(&self) -> broadcast::Receiver<SketchEvent> {
        self.events.subscribe()
    }

    fn remove_graphic(&self, id: GraphicId) {
        self.removed.lock().push(id);
    }
}

/// A dashboard over scripted collaborators, with handles to each of them.
pub struct Harness {
    pub dashboard: Dashboard,
    pub store: Arc<ScriptedStore>,
    pub surface: Arc<RecordingSurface>,
    pub chart: Arc<RecordingChart>,
    pub sketch: Arc<TestSketch>,
}

impl Harness {
    pub fn new(features: Vec<Feature>) -> Self {
        let store = Arc::new(ScriptedStore::new(features));
        let surface = Arc::new(RecordingSurface::default());
        let chart = Arc::new(RecordingChart::default());
        let sketch = Arc::new(TestSketch::default());
        let dashboard = Dashboard::new(
            &DashboardConfig::default(),
            store.clone(),
            Collaborators {
                view_surface: surface.clone(),
                sketch: sketch.clone(),
                chart: chart.clone(),
            },
        );
        Self {
            dashboard,
            store,
            surface,
            chart,
            sketch,
        }
    }
}
