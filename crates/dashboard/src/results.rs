use std::sync::Arc;

use layers::query::FeatureStore;
use parking_lot::Mutex;
use runtime::{SequenceGate, Subscription};
use scene::feature::Feature;
use tracing::{debug, error, warn};

use crate::popup::{Popup, PopupTemplate};
use crate::surface::{NavigationError, ViewSurface};
use crate::view::ActiveViewReader;

/// Zoom target is the feature extent scaled by this factor around its center.
const GO_TO_EXPAND: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub index: usize,
    pub label: String,
    pub feature: Arc<Feature>,
}

/// Side-panel list of the regions visible in the active view.
///
/// The list is rebuilt whenever the layer view settles. Opening an entry
/// navigates to the region and then shows its popup.
pub struct ResultListPresenter {
    store: Arc<dyn FeatureStore>,
    views: ActiveViewReader,
    surface: Arc<dyn ViewSurface>,
    template: PopupTemplate,
    gate: SequenceGate,
    entries: Mutex<Vec<ResultEntry>>,
}

impl ResultListPresenter {
    pub fn new(
        store: Arc<dyn FeatureStore>,
        views: ActiveViewReader,
        surface: Arc<dyn ViewSurface>,
        template: PopupTemplate,
    ) -> Self {
        Self {
            store,
            views,
            surface,
            template,
            gate: SequenceGate::new(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Rebuilds the list each time the surface stops updating.
    pub fn attach(self: &Arc<Self>) -> Subscription {
        let mut updating = self.surface.updating();
        let this = Arc::clone(self);
        Subscription::spawn("result-list", async move {
            let busy = *updating.borrow_and_update();
            if !busy {
                this.refresh().await;
            }
            while updating.changed().await.is_ok() {
                let busy = *updating.borrow_and_update();
                if !busy {
                    this.refresh().await;
                }
            }
        })
    }

    /// Queries the visible extent and replaces the list in one step.
    pub async fn refresh(&self) {
        let ticket = self.gate.issue();
        let extent = self.views.visible_extent();
        match self.store.list_visible(extent).await {
            Ok(features) => {
                let fresh: Vec<ResultEntry> = features
                    .into_iter()
                    .enumerate()
                    .map(|(index, feature)| ResultEntry {
                        index,
                        label: feature.name().to_string(),
                        feature,
                    })
                    .collect();
                let mut entries = self.entries.lock();
                if !self.gate.is_current(ticket) {
                    debug!(ticket = ticket.get(), "stale result list dropped");
                    return;
                }
                debug!(count = fresh.len(), "result list refreshed");
                *entries = fresh;
            }
            Err(err) => warn!(error = %err, "visible feature query failed"),
        }
    }

    pub fn entries(&self) -> Vec<ResultEntry> {
        self.entries.lock().clone()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.label.clone()).collect()
    }

    /// Navigates to entry `index` and opens its popup.
    ///
    /// Returns the popup that was opened. An aborted navigation (the user
    /// started another one) is not an error and opens nothing.
    pub async fn open_entry(&self, index: usize) -> Option<Popup> {
        let feature = self
            .entries
            .lock()
            .get(index)
            .map(|e| Arc::clone(&e.feature))?;
        let (Some(extent), Some(location)) = (feature.extent(), feature.centroid()) else {
            warn!(feature = %feature.id, "entry has no geometry to navigate to");
            return None;
        };

        let mode = self.views.mode();
        match self.surface.go_to(mode, extent.expand(GO_TO_EXPAND)).await {
            Ok(()) => {
                let popup = self.template.render(&feature, location);
                self.surface.open_popup(self.views.mode(), &popup);
                Some(popup)
            }
            Err(NavigationError::Aborted) => {
                debug!(feature = %feature.id, "navigation superseded");
                None
            }
            Err(err) => {
                error!(feature = %feature.id, error = %err, "navigation failed");
                None
            }
        }
    }
}
