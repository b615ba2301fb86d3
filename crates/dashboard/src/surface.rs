//! Contracts for the rendering and drawing collaborators.
//!
//! The dashboard never draws anything itself. It tells a [`ViewSurface`]
//! what to show, listens to a [`SketchTool`] for user-drawn shapes, and
//! hands chart options to a [`ChartSurface`].

use foundation::bounds::Extent;
use foundation::geometry::Polygon;
use tokio::sync::{broadcast, watch};

pub use layers::query::BoxFuture;

use crate::chart::BarChartOption;
use crate::popup::Popup;
use crate::selection::HighlightOverlay;
use crate::view::{ViewMode, ViewTransition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Superseded by a newer navigation; not a failure.
    Aborted,
    Failed(String),
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::Aborted => write!(f, "navigation aborted"),
            NavigationError::Failed(msg) => write!(f, "navigation failed: {msg}"),
        }
    }
}

impl std::error::Error for NavigationError {}

/// Renders the active view.
pub trait ViewSurface: Send + Sync {
    fn apply_transition(&self, transition: &ViewTransition);

    /// Replaces the selection graphics drawn over `mode`.
    fn show_highlights(&self, mode: ViewMode, overlay: &HighlightOverlay);

    /// `true` while the layer view is (re)loading features.
    fn updating(&self) -> watch::Receiver<bool>;

    fn go_to(&self, mode: ViewMode, target: Extent) -> BoxFuture<'_, Result<(), NavigationError>>;

    fn open_popup(&self, mode: ViewMode, popup: &Popup);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct GraphicId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct SketchGraphic {
    pub id: GraphicId,
    pub geometry: Polygon,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SketchState {
    Start,
    Active,
    Complete,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ToolEventKind {
    MoveStart,
    Move,
    MoveStop,
    ScaleStart,
    Scale,
    ScaleStop,
    ReshapeStart,
    Reshape,
    ReshapeStop,
    RotateStart,
    Rotate,
    RotateStop,
    VertexAdd,
    VertexRemove,
}

impl ToolEventKind {
    /// Edits that settle a shape and trigger a new query.
    pub fn settles_shape(self) -> bool {
        matches!(
            self,
            ToolEventKind::MoveStop | ToolEventKind::ScaleStop | ToolEventKind::ReshapeStop
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SketchEvent {
    pub state: SketchState,
    pub graphics: Vec<SketchGraphic>,
    pub tool_event: Option<ToolEventKind>,
}

impl SketchEvent {
    pub fn started(graphic: SketchGraphic) -> Self {
        Self {
            state: SketchState::Start,
            graphics: vec![graphic],
            tool_event: None,
        }
    }

    pub fn edited(graphic: SketchGraphic, kind: ToolEventKind) -> Self {
        Self {
            state: SketchState::Active,
            graphics: vec![graphic],
            tool_event: Some(kind),
        }
    }

    pub fn completed(graphic: SketchGraphic) -> Self {
        Self {
            state: SketchState::Complete,
            graphics: vec![graphic],
            tool_event: None,
        }
    }

    pub fn graphic(&self) -> Option<&SketchGraphic> {
        self.graphics.first()
    }
}

/// Interactive rectangle/polygon drawing tool.
pub trait SketchTool: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<SketchEvent>;

    fn remove_graphic(&self, id: GraphicId);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChartHandle(pub u64);

/// Charting backend plus the side panel hosting it.
pub trait ChartSurface: Send + Sync {
    fn init(&self, container: &str) -> ChartHandle;

    /// Applies `option`; the value-axis label is turned into a formatter
    /// function here (see [`crate::chart::ValueAxisLabel`]).
    fn set_option(&self, chart: ChartHandle, option: &BarChartOption);

    fn set_panel_visible(&self, visible: bool);
}
