//! Sketch-driven selection: query, highlight, aggregate, chart.
//!
//! Every settled shape issues a feature query. Queries may resolve out of
//! order; only the most recently issued one is allowed to touch the
//! highlights or the chart. Completing a sketch cancels the selection and
//! makes every in-flight query stale.

use std::sync::Arc;

use compute::{AggregateTotals, summarize};
use foundation::geometry::Polygon;
use foundation::ids::FeatureId;
use layers::query::{FeatureQuery, FeatureStore};
use layers::symbology::FillSymbol;
use parking_lot::{Mutex, MutexGuard};
use runtime::{Counters, SequenceGate, Subscription, Ticket};
use scene::feature::Feature;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chart::{BarChartOption, ChartPresenter};
use crate::surface::{GraphicId, SketchEvent, SketchState, SketchTool, ViewSurface};
use crate::view::{ActiveViewReader, ViewMode};

pub const QUERIES_ISSUED: &str = "selection.queries_issued";
pub const RESULTS_APPLIED: &str = "selection.results_applied";
pub const RESULTS_DROPPED: &str = "selection.results_dropped";
pub const QUERY_FAILURES: &str = "selection.query_failures";

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionAction {
    Query(Polygon),
    /// Clear the selection and remove the drawn graphic.
    Reset(Option<GraphicId>),
    Ignore,
}

/// Maps a sketch event to what the selection should do about it.
pub fn classify(event: &SketchEvent) -> SelectionAction {
    let graphic = event.graphic();
    match event.state {
        SketchState::Start => match graphic {
            Some(g) => SelectionAction::Query(g.geometry.clone()),
            None => SelectionAction::Ignore,
        },
        SketchState::Active => match (graphic, event.tool_event) {
            (Some(g), Some(kind)) if kind.settles_shape() => {
                SelectionAction::Query(g.geometry.clone())
            }
            _ => SelectionAction::Ignore,
        },
        SketchState::Complete => SelectionAction::Reset(graphic.map(|g| g.id)),
    }
}

/// Selected features drawn with the highlight symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightOverlay {
    symbol: FillSymbol,
    features: Vec<Arc<Feature>>,
}

impl Default for HighlightOverlay {
    fn default() -> Self {
        Self {
            symbol: FillSymbol::highlight(),
            features: Vec::new(),
        }
    }
}

impl HighlightOverlay {
    pub fn symbol(&self) -> &FillSymbol {
        &self.symbol
    }

    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    pub fn ids(&self) -> Vec<FeatureId> {
        self.features.iter().map(|f| f.id).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn replace(&mut self, features: Vec<Arc<Feature>>) {
        self.features = features;
    }

    fn clear(&mut self) {
        self.features.clear();
    }
}

struct SelectionState {
    overlay: HighlightOverlay,
    /// `Some` exactly while the chart panel is shown.
    totals: Option<AggregateTotals>,
    counters: Counters,
}

enum ChartUpdate {
    Keep,
    Show(AggregateTotals),
    Hide,
}

/// Collaborator calls decided under the state lock and made after it is released.
struct Redraw {
    remove: Option<GraphicId>,
    chart: ChartUpdate,
    mode: ViewMode,
    overlay: HighlightOverlay,
}

impl Redraw {
    fn run(self, presenter: &mut ChartPresenter, surface: &dyn ViewSurface, sketch: &dyn SketchTool) {
        if let Some(id) = self.remove {
            sketch.remove_graphic(id);
        }
        match self.chart {
            ChartUpdate::Keep => {}
            ChartUpdate::Show(totals) => {
                presenter.show();
                presenter.render(&totals);
            }
            ChartUpdate::Hide => presenter.hide(),
        }
        surface.show_highlights(self.mode, &self.overlay);
    }
}

/// Lock order is `state` then `presenter`. The presenter lock is taken before
/// the state guard drops, so surface calls go out in the order the state
/// changed; accessors never take it, so a surface may read the selection back.
pub struct SelectionController {
    store: Arc<dyn FeatureStore>,
    views: ActiveViewReader,
    surface: Arc<dyn ViewSurface>,
    sketch: Arc<dyn SketchTool>,
    gate: SequenceGate,
    state: Mutex<SelectionState>,
    presenter: Mutex<ChartPresenter>,
}

impl SelectionController {
    pub fn new(
        store: Arc<dyn FeatureStore>,
        views: ActiveViewReader,
        surface: Arc<dyn ViewSurface>,
        sketch: Arc<dyn SketchTool>,
        chart: ChartPresenter,
    ) -> Self {
        Self {
            store,
            views,
            surface,
            sketch,
            gate: SequenceGate::new(),
            state: Mutex::new(SelectionState {
                overlay: HighlightOverlay::default(),
                totals: None,
                counters: Counters::new(),
            }),
            presenter: Mutex::new(chart),
        }
    }

    /// Listens to the sketch tool until the returned subscription is dropped.
    pub fn attach(self: &Arc<Self>) -> Subscription {
        let mut events = self.sketch.subscribe();
        let this = Arc::clone(self);
        Subscription::spawn("selection", async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        this.handle_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "sketch events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Returns the spawned query task, if the event issued one.
    pub fn handle_event(self: &Arc<Self>, event: &SketchEvent) -> Option<JoinHandle<()>> {
        match classify(event) {
            SelectionAction::Query(geometry) => Some(self.issue_query(geometry)),
            SelectionAction::Reset(graphic) => {
                self.reset(graphic);
                None
            }
            SelectionAction::Ignore => None,
        }
    }

    pub fn issue_query(self: &Arc<Self>, geometry: Polygon) -> JoinHandle<()> {
        let ticket = self.gate.issue();
        self.state.lock().counters.incr(QUERIES_ISSUED);
        debug!(ticket = ticket.get(), "selection query issued");
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_query(ticket, geometry).await })
    }

    async fn run_query(&self, ticket: Ticket, geometry: Polygon) {
        match self.store.query(FeatureQuery::intersecting(geometry)).await {
            Ok(features) => self.apply(ticket, features),
            Err(err) => {
                self.state.lock().counters.incr(QUERY_FAILURES);
                warn!(ticket = ticket.get(), error = %err, "selection query failed");
            }
        }
    }

    fn apply(&self, ticket: Ticket, features: Vec<Arc<Feature>>) {
        let mut state = self.state.lock();
        // Checked under the state lock so a concurrent reset cannot interleave.
        if !self.gate.is_current(ticket) {
            state.counters.incr(RESULTS_DROPPED);
            debug!(ticket = ticket.get(), "stale selection result dropped");
            return;
        }
        state.counters.incr(RESULTS_APPLIED);

        let totals = summarize(features.iter().map(|f| f.as_ref()));
        let chart = if features.is_empty() || totals.is_empty() {
            state.totals = None;
            ChartUpdate::Hide
        } else {
            state.totals = Some(totals);
            ChartUpdate::Show(totals)
        };

        info!(selected = features.len(), "selection updated");
        state.overlay.replace(features);
        let redraw = Redraw {
            remove: None,
            chart,
            mode: self.views.mode(),
            overlay: state.overlay.clone(),
        };
        self.hand_over(state, redraw);
    }

    /// Clears highlights, hides the chart and drops every in-flight result.
    pub fn reset(&self, graphic: Option<GraphicId>) {
        let mut state = self.state.lock();
        self.gate.invalidate();
        state.totals = None;
        state.overlay.clear();
        let redraw = Redraw {
            remove: graphic,
            chart: ChartUpdate::Hide,
            mode: self.views.mode(),
            overlay: state.overlay.clone(),
        };
        self.hand_over(state, redraw);
        debug!("selection reset");
    }

    /// Redraws the current highlights on whichever view is now active.
    pub fn redraw_highlights(&self) {
        let state = self.state.lock();
        let redraw = Redraw {
            remove: None,
            chart: ChartUpdate::Keep,
            mode: self.views.mode(),
            overlay: state.overlay.clone(),
        };
        self.hand_over(state, redraw);
    }

    fn hand_over(&self, state: MutexGuard<'_, SelectionState>, redraw: Redraw) {
        let mut presenter = self.presenter.lock();
        drop(state);
        redraw.run(&mut presenter, self.surface.as_ref(), self.sketch.as_ref());
    }

    pub fn overlay(&self) -> HighlightOverlay {
        self.state.lock().overlay.clone()
    }

    pub fn highlighted_ids(&self) -> Vec<FeatureId> {
        self.state.lock().overlay.ids()
    }

    pub fn totals(&self) -> Option<AggregateTotals> {
        self.state.lock().totals
    }

    pub fn chart_visible(&self) -> bool {
        self.state.lock().totals.is_some()
    }

    /// Option the visible chart displays; `None` while the panel is hidden.
    pub fn chart_option(&self) -> Option<BarChartOption> {
        self.state
            .lock()
            .totals
            .as_ref()
            .map(BarChartOption::population)
    }

    pub fn counters(&self) -> Counters {
        self.state.lock().counters.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        HighlightOverlay, QUERIES_ISSUED, QUERY_FAILURES, RESULTS_APPLIED, RESULTS_DROPPED,
        SelectionAction, SelectionController, classify,
    };
    use crate::chart::{BarChartOption, ChartPresenter};
    use crate::popup::Popup;
    use crate::surface::{
        BoxFuture, ChartHandle, ChartSurface, NavigationError, SketchEvent, ToolEventKind,
        ViewSurface,
    };
    use crate::test_support::{
        Harness, RecordingChart, RecordingSurface, graphic, population_feature, rect,
    };
    use crate::view::{ViewMode, ViewTransition};
    use compute::{AggregateTotals, CATEGORY_LABELS};
    use foundation::bounds::Extent;
    use foundation::ids::FeatureId;
    use layers::query::QueryError;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, OnceLock, Weak};
    use std::time::Duration;
    use tokio::sync::watch;

    /// Surfaces that read the selection back from inside every draw call.
    #[derive(Default)]
    struct ReadBackSurfaces {
        view: RecordingSurface,
        chart: RecordingChart,
        selection: OnceLock<Weak<SelectionController>>,
        // (highlighted count, chart visible) seen by each draw call.
        seen: Mutex<Vec<(usize, bool)>>,
    }

    impl ReadBackSurfaces {
        fn read_back(&self) {
            if let Some(selection) = self.selection.get().and_then(Weak::upgrade) {
                let seen = (selection.overlay().len(), selection.chart_visible());
                self.seen.lock().push(seen);
            }
        }
    }

    impl ViewSurface for ReadBackSurfaces {
        fn apply_transition(&self, transition: &ViewTransition) {
            self.view.apply_transition(transition);
        }

        fn show_highlights(&self, mode: ViewMode, overlay: &HighlightOverlay) {
            self.read_back();
            self.view.show_highlights(mode, overlay);
        }

        fn updating(&self) -> watch::Receiver<bool> {
            self.view.updating()
        }

        fn go_to(&self, mode: ViewMode, target: Extent) -> BoxFuture<'_, Result<(), NavigationError>> {
            self.view.go_to(mode, target)
        }

        fn open_popup(&self, mode: ViewMode, popup: &Popup) {
            self.view.open_popup(mode, popup);
        }
    }

    impl ChartSurface for ReadBackSurfaces {
        fn init(&self, container: &str) -> ChartHandle {
            self.chart.init(container)
        }

        fn set_option(&self, chart: ChartHandle, option: &BarChartOption) {
            self.read_back();
            self.chart.set_option(chart, option);
        }

        fn set_panel_visible(&self, visible: bool) {
            self.read_back();
            self.chart.set_panel_visible(visible);
        }
    }

    fn three_regions() -> Harness {
        Harness::new(vec![
            population_feature(1, Extent::new([0.0, 0.0], [1.0, 1.0]), "甲", 1_000_000.0),
            population_feature(2, Extent::new([1.0, 0.0], [2.0, 1.0]), "乙", 2_000_000.0),
            population_feature(3, Extent::new([2.0, 0.0], [3.0, 1.0]), "丙", 4_000_000.0),
        ])
    }

    fn controller(h: &Harness) -> Arc<SelectionController> {
        h.dashboard.selection().clone()
    }

    #[test]
    fn classify_maps_sketch_states() {
        let g = graphic(9, rect(0.0, 0.0, 1.0, 1.0));
        assert!(matches!(
            classify(&SketchEvent::started(g.clone())),
            SelectionAction::Query(_)
        ));
        assert!(matches!(
            classify(&SketchEvent::edited(g.clone(), ToolEventKind::ScaleStop)),
            SelectionAction::Query(_)
        ));
        assert!(matches!(
            classify(&SketchEvent::edited(g.clone(), ToolEventKind::ReshapeStop)),
            SelectionAction::Query(_)
        ));
        assert_eq!(
            classify(&SketchEvent::edited(g.clone(), ToolEventKind::Scale)),
            SelectionAction::Ignore
        );
        assert_eq!(
            classify(&SketchEvent::edited(g.clone(), ToolEventKind::RotateStop)),
            SelectionAction::Ignore
        );
        assert_eq!(
            classify(&SketchEvent::completed(g.clone())),
            SelectionAction::Reset(Some(g.id))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn selection_sums_every_intersecting_region() {
        let h = three_regions();
        let selection = controller(&h);
        let sketch = graphic(1, rect(-1.0, -1.0, 4.0, 2.0));

        selection
            .handle_event(&SketchEvent::started(sketch))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(
            selection.highlighted_ids(),
            vec![FeatureId(1), FeatureId(2), FeatureId(3)]
        );
        let totals = selection.totals().unwrap();
        assert_eq!(
            totals,
            AggregateTotals {
                male: 3_500_000.0,
                female: 3_500_000.0,
                urban_population: 4_200_000.0,
                village_population: 2_800_000.0,
                city_population: 0.0,
            }
        );
        assert!(selection.chart_visible());
        let option = selection.chart_option().unwrap();
        assert_eq!(option.series[0].data, totals.values().to_vec());
        assert_eq!(option.x_axis.data, CATEGORY_LABELS.map(String::from).to_vec());
        assert_eq!(h.chart.init_count(), 1);
        assert_eq!(h.surface.last_highlight_ids(), vec![FeatureId(1), FeatureId(2), FeatureId(3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn last_issued_query_wins_over_late_stale_result() {
        let h = three_regions();
        let selection = controller(&h);
        h.store.push_latency(Duration::from_millis(10));
        h.store.push_latency(Duration::from_millis(300));
        h.store.push_latency(Duration::from_millis(50));

        let start = selection
            .handle_event(&SketchEvent::started(graphic(1, rect(0.2, 0.2, 0.8, 0.8))))
            .unwrap();
        // First resize covers region 1 only, second covers region 3 only.
        let slow = selection
            .handle_event(&SketchEvent::edited(
                graphic(1, rect(0.1, 0.1, 0.9, 0.9)),
                ToolEventKind::ScaleStop,
            ))
            .unwrap();
        let fast = selection
            .handle_event(&SketchEvent::edited(
                graphic(1, rect(2.1, 0.1, 2.9, 0.9)),
                ToolEventKind::ReshapeStop,
            ))
            .unwrap();

        fast.await.unwrap();
        assert_eq!(selection.highlighted_ids(), vec![FeatureId(3)]);

        start.await.unwrap();
        slow.await.unwrap();
        assert_eq!(selection.highlighted_ids(), vec![FeatureId(3)]);
        let totals = selection.totals().unwrap();
        assert_eq!(totals.male, 2_000_000.0);

        let counters = selection.counters();
        assert_eq!(counters.get(QUERIES_ISSUED), 3);
        assert_eq!(counters.get(RESULTS_APPLIED), 1);
        assert_eq!(counters.get(RESULTS_DROPPED), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn completing_before_the_query_resolves_leaves_nothing_selected() {
        let h = three_regions();
        let selection = controller(&h);
        h.store.push_latency(Duration::from_millis(100));

        let g = graphic(4, rect(-1.0, -1.0, 4.0, 2.0));
        let pending = selection
            .handle_event(&SketchEvent::started(g.clone()))
            .unwrap();
        assert!(selection.handle_event(&SketchEvent::completed(g)).is_none());
        pending.await.unwrap();

        assert!(!selection.chart_visible());
        assert!(selection.overlay().is_empty());
        assert_eq!(selection.totals(), None);
        assert!(h.chart.options().is_empty());
        assert_eq!(h.sketch.removed(), vec![crate::surface::GraphicId(4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn completing_after_results_clears_them() {
        let h = three_regions();
        let selection = controller(&h);
        let g = graphic(2, rect(-1.0, -1.0, 4.0, 2.0));

        selection
            .handle_event(&SketchEvent::started(g.clone()))
            .unwrap()
            .await
            .unwrap();
        assert!(selection.chart_visible());

        selection.handle_event(&SketchEvent::completed(g));
        assert!(!selection.chart_visible());
        assert!(selection.overlay().is_empty());
        assert!(h.surface.last_highlight_ids().is_empty());
        assert_eq!(h.chart.panel_visible(), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_hides_chart() {
        let h = three_regions();
        let selection = controller(&h);

        selection
            .handle_event(&SketchEvent::started(graphic(1, rect(-1.0, -1.0, 4.0, 2.0))))
            .unwrap()
            .await
            .unwrap();
        assert!(selection.chart_visible());

        selection
            .handle_event(&SketchEvent::edited(
                graphic(1, rect(50.0, 50.0, 51.0, 51.0)),
                ToolEventKind::MoveStop,
            ))
            .unwrap()
            .await
            .unwrap();
        assert!(!selection.chart_visible());
        assert!(selection.overlay().is_empty());
        assert_eq!(selection.totals(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_keeps_previous_selection() {
        let h = three_regions();
        let selection = controller(&h);

        selection
            .handle_event(&SketchEvent::started(graphic(1, rect(0.2, 0.2, 0.8, 0.8))))
            .unwrap()
            .await
            .unwrap();
        let before = selection.totals();

        h.store.fail_with(QueryError::Network("connection reset".into()));
        selection
            .handle_event(&SketchEvent::edited(
                graphic(1, rect(-1.0, -1.0, 4.0, 2.0)),
                ToolEventKind::ScaleStop,
            ))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(selection.totals(), before);
        assert_eq!(selection.highlighted_ids(), vec![FeatureId(1)]);
        assert!(selection.chart_visible());
        assert_eq!(selection.counters().get(QUERY_FAILURES), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn surfaces_may_read_the_selection_while_drawing() {
        let h = three_regions();
        let surfaces = Arc::new(ReadBackSurfaces::default());
        let selection = Arc::new(SelectionController::new(
            h.store.clone(),
            h.dashboard.views(),
            surfaces.clone(),
            h.sketch.clone(),
            ChartPresenter::new(surfaces.clone(), "echartDiv"),
        ));
        surfaces
            .selection
            .set(Arc::downgrade(&selection))
            .unwrap_or_else(|_| panic!("selection already set"));

        let g = graphic(1, rect(-1.0, -1.0, 4.0, 2.0));
        selection
            .handle_event(&SketchEvent::started(g.clone()))
            .unwrap()
            .await
            .unwrap();
        selection.handle_event(&SketchEvent::completed(g));

        // Each draw call already sees the state it is drawing.
        assert_eq!(
            *surfaces.seen.lock(),
            vec![(3, true), (3, true), (3, true), (0, false), (0, false)]
        );
        assert_eq!(surfaces.view.last_highlight_ids(), Vec::<FeatureId>::new());
        assert_eq!(surfaces.chart.panel_visible(), Some(false));
    }
}
