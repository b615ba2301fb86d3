//! 2D/3D view state.
//!
//! The map view and the scene view share one screen container and one
//! thematic layer. Exactly one view is bound to the container at a time;
//! switching hands the viewpoint over and swaps the layer renderer.

use std::sync::Arc;

use foundation::bounds::Extent;
use foundation::math::Vec2;
use layers::layer::{ChoroplethLayer, Layer, LayerId};
use layers::symbology::{Renderer, RendererKind, population_class_breaks, urban_ratio_extrusion};
use parking_lot::RwLock;
use tracing::info;

/// Web-mercator style tile width used to turn a zoom level into a scale.
const TILE_SIZE_PX: f64 = 256.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewMode {
    /// Planar map view.
    Map,
    /// Globe scene view with extruded polygons.
    Scene,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Map => "2D",
            ViewMode::Scene => "3D",
        }
    }

    pub fn other(self) -> ViewMode {
        match self {
            ViewMode::Map => ViewMode::Scene,
            ViewMode::Scene => ViewMode::Map,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewpoint {
    /// Longitude/latitude in degrees.
    pub center: Vec2,
    pub zoom: f64,
    pub tilt: f64,
    pub heading: f64,
}

impl Viewpoint {
    pub fn new(center: Vec2, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            tilt: 0.0,
            heading: 0.0,
        }
    }

    pub fn degrees_per_px(&self) -> f64 {
        360.0 / (TILE_SIZE_PX * 2f64.powf(self.zoom))
    }

    /// Geographic extent covered by a viewport of `size_px`.
    ///
    /// The right `padding_px` columns are covered by the side panel, so the
    /// center sits in the middle of the remaining area.
    pub fn extent(&self, size_px: [f64; 2], padding_px: f64) -> Extent {
        let dpp = self.degrees_per_px();
        let open_half = (size_px[0] - padding_px).max(0.0) * 0.5;
        let half_h = size_px[1] * 0.5 * dpp;
        Extent::new(
            [self.center.x - open_half * dpp, self.center.y - half_h],
            [self.center.x + (open_half + padding_px) * dpp, self.center.y + half_h],
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub mode: ViewMode,
    pub viewpoint: Viewpoint,
    /// Screen container while bound; `None` while detached.
    pub container: Option<String>,
}

/// What the rendering surface must do to reflect a (re)binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransition {
    pub detached: Option<ViewMode>,
    pub bound: ViewMode,
    pub container: String,
    pub viewpoint: Viewpoint,
    pub layer: LayerId,
    pub renderer: Renderer,
    /// Label for the toggle control: the mode a click would switch to.
    pub toggle_label: &'static str,
}

/// Owns both views and the shared layer.
///
/// Invariants after every public call:
/// - exactly one view holds the container;
/// - the layer renderer matches the active mode (class breaks in 2D,
///   extrusion in 3D).
#[derive(Debug)]
pub struct ViewCoordinator {
    map: View,
    scene: View,
    active: ViewMode,
    container: String,
    layer: ChoroplethLayer,
    planar: Renderer,
    extruded: Renderer,
    size_px: [f64; 2],
    padding_px: f64,
}

impl ViewCoordinator {
    /// Starts in 2D, bound to `container`, with the planar renderer applied.
    pub fn new(container: impl Into<String>, initial: Viewpoint, mut layer: ChoroplethLayer) -> Self {
        let container = container.into();
        let planar = Renderer::ClassBreaks(population_class_breaks());
        layer.set_renderer(planar.clone());
        Self {
            map: View {
                mode: ViewMode::Map,
                viewpoint: initial,
                container: Some(container.clone()),
            },
            scene: View {
                mode: ViewMode::Scene,
                viewpoint: initial,
                container: None,
            },
            active: ViewMode::Map,
            container,
            layer,
            planar,
            extruded: Renderer::Extrusion(urban_ratio_extrusion()),
            size_px: [1280.0, 720.0],
            padding_px: 0.0,
        }
    }

    pub fn with_viewport(mut self, size_px: [f64; 2], padding_px: f64) -> Self {
        self.size_px = size_px;
        self.padding_px = padding_px;
        self
    }

    pub fn active_mode(&self) -> ViewMode {
        self.active
    }

    pub fn active_view(&self) -> &View {
        self.view(self.active)
    }

    pub fn view(&self, mode: ViewMode) -> &View {
        match mode {
            ViewMode::Map => &self.map,
            ViewMode::Scene => &self.scene,
        }
    }

    fn view_mut(&mut self, mode: ViewMode) -> &mut View {
        match mode {
            ViewMode::Map => &mut self.map,
            ViewMode::Scene => &mut self.scene,
        }
    }

    pub fn layer(&self) -> &ChoroplethLayer {
        &self.layer
    }

    pub fn toggle_label(&self) -> &'static str {
        self.active.other().label()
    }

    /// Number of views currently holding the container.
    pub fn bound_count(&self) -> usize {
        [&self.map, &self.scene]
            .iter()
            .filter(|v| v.container.is_some())
            .count()
    }

    pub fn visible_extent(&self) -> Extent {
        self.active_view()
            .viewpoint
            .extent(self.size_px, self.padding_px)
    }

    /// Records a user pan/zoom on the active view.
    pub fn sync_viewpoint(&mut self, viewpoint: Viewpoint) {
        let active = self.active;
        self.view_mut(active).viewpoint = viewpoint;
    }

    /// Current binding expressed as a transition with nothing detached.
    pub fn binding(&self) -> ViewTransition {
        self.transition(None)
    }

    /// Toggles between 2D and 3D.
    ///
    /// The outgoing view releases the container and hands its viewpoint to
    /// the incoming one; the layer renderer follows the new mode.
    pub fn switch_view(&mut self) -> ViewTransition {
        let from = self.active;
        let to = from.other();

        let viewpoint = self.view(from).viewpoint;
        self.view_mut(from).container = None;
        let container = self.container.clone();
        let incoming = self.view_mut(to);
        incoming.viewpoint = viewpoint;
        incoming.container = Some(container);
        self.active = to;

        let renderer = match to {
            ViewMode::Map => self.planar.clone(),
            ViewMode::Scene => self.extruded.clone(),
        };
        self.layer.set_renderer(renderer);

        info!(
            from = from.label(),
            to = to.label(),
            zoom = viewpoint.zoom,
            "switched view"
        );
        self.transition(Some(from))
    }

    fn transition(&self, detached: Option<ViewMode>) -> ViewTransition {
        let view = self.active_view();
        ViewTransition {
            detached,
            bound: self.active,
            container: self.container.clone(),
            viewpoint: view.viewpoint,
            layer: self.layer.id(),
            renderer: self.layer.renderer().clone(),
            toggle_label: self.toggle_label(),
        }
    }
}

/// Read-only handle to the active view, shared by the presenters.
///
/// Only the dashboard mutates the coordinator; everything else observes it
/// through this type.
#[derive(Debug, Clone)]
pub struct ActiveViewReader {
    inner: Arc<RwLock<ViewCoordinator>>,
}

impl ActiveViewReader {
    pub(crate) fn new(inner: Arc<RwLock<ViewCoordinator>>) -> Self {
        Self { inner }
    }

    pub fn mode(&self) -> ViewMode {
        self.inner.read().active_mode()
    }

    pub fn viewpoint(&self) -> Viewpoint {
        self.inner.read().active_view().viewpoint
    }

    pub fn visible_extent(&self) -> Extent {
        self.inner.read().visible_extent()
    }

    pub fn renderer_kind(&self) -> RendererKind {
        self.inner.read().layer().renderer().kind()
    }

    pub fn toggle_label(&self) -> &'static str {
        self.inner.read().toggle_label()
    }
}
