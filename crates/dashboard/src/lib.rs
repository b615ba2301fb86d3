//! Population dashboard: selection, aggregation and 2D/3D view state.
//!
//! [`Dashboard`] wires a [`FeatureStore`] and the rendering collaborators
//! together. Nothing here draws; the collaborators behind
//! [`surface::ViewSurface`], [`surface::SketchTool`] and
//! [`surface::ChartSurface`] do.

pub mod chart;
pub mod config;
pub mod popup;
pub mod results;
pub mod selection;
pub mod surface;
pub mod view;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use layers::layer::{ChoroplethLayer, LayerId};
use layers::query::FeatureStore;
use layers::vector::LayerSnapshot;
use parking_lot::RwLock;
use runtime::Subscription;
use scene::feature::Feature;
use tracing::info;

pub use config::{ConfigError, DashboardConfig};
pub use selection::SelectionController;
pub use results::ResultListPresenter;
pub use view::{ActiveViewReader, ViewMode, Viewpoint};

use chart::ChartPresenter;
use popup::PopupTemplate;
use surface::{ChartSurface, SketchTool, ViewSurface};
use view::ViewCoordinator;

const POPULATION_LAYER_ID: LayerId = LayerId(1);

pub struct Collaborators {
    pub view_surface: Arc<dyn ViewSurface>,
    pub sketch: Arc<dyn SketchTool>,
    pub chart: Arc<dyn ChartSurface>,
}

pub struct Dashboard {
    views: Arc<RwLock<ViewCoordinator>>,
    surface: Arc<dyn ViewSurface>,
    selection: Arc<SelectionController>,
    results: Arc<ResultListPresenter>,
}

impl Dashboard {
    pub fn new(
        config: &DashboardConfig,
        store: Arc<dyn FeatureStore>,
        collaborators: Collaborators,
    ) -> Self {
        let coordinator = ViewCoordinator::new(
            config.container.clone(),
            config.initial_viewpoint(),
            ChoroplethLayer::population(POPULATION_LAYER_ID),
        )
        .with_viewport(config.viewport_px, config.padding_right);
        let views = Arc::new(RwLock::new(coordinator));
        let reader = ActiveViewReader::new(Arc::clone(&views));

        let chart = ChartPresenter::new(collaborators.chart, config.chart_container.clone());
        let selection = Arc::new(SelectionController::new(
            Arc::clone(&store),
            reader.clone(),
            Arc::clone(&collaborators.view_surface),
            collaborators.sketch,
            chart,
        ));
        let results = Arc::new(ResultListPresenter::new(
            store,
            reader,
            Arc::clone(&collaborators.view_surface),
            PopupTemplate::population(),
        ));

        Self {
            views,
            surface: collaborators.view_surface,
            selection,
            results,
        }
    }

    /// Binds the initial view and attaches the event listeners.
    ///
    /// Listeners live as long as the returned session. Starting again after
    /// dropping it attaches fresh listeners; the old ones are already gone.
    pub fn start(&self) -> DashboardSession {
        let binding = self.views.read().binding();
        self.surface.apply_transition(&binding);
        info!(mode = binding.bound.label(), container = %binding.container, "dashboard started");
        DashboardSession {
            selection: self.selection.attach(),
            results: self.results.attach(),
        }
    }

    /// Toggles 2D/3D and returns the newly active mode.
    pub fn switch_view(&self) -> ViewMode {
        let transition = self.views.write().switch_view();
        self.surface.apply_transition(&transition);
        self.selection.redraw_highlights();
        transition.bound
    }

    pub fn sync_viewpoint(&self, viewpoint: Viewpoint) {
        self.views.write().sync_viewpoint(viewpoint);
    }

    pub fn views(&self) -> ActiveViewReader {
        ActiveViewReader::new(Arc::clone(&self.views))
    }

    pub fn selection(&self) -> &Arc<SelectionController> {
        &self.selection
    }

    pub fn results(&self) -> &Arc<ResultListPresenter> {
        &self.results
    }

    /// Triangulates `features` with the renderer of the active mode.
    pub fn snapshot(&self, features: &[Arc<Feature>]) -> LayerSnapshot {
        self.views.read().layer().extract(features)
    }
}

/// Live listeners of a started dashboard.
pub struct DashboardSession {
    selection: Subscription,
    results: Subscription,
}

impl DashboardSession {
    pub fn is_active(&self) -> bool {
        self.selection.is_active() && self.results.is_active()
    }
}
