use std::sync::Arc;

use compute::{AggregateTotals, CATEGORY_LABELS};
use serde::Serialize;
use tracing::debug;

use crate::surface::{ChartHandle, ChartSurface};

pub const CHART_TITLE: &str = "人口分布情况图";
pub const SERIES_NAME: &str = "人口数";
const MILLION: f64 = 1_000_000.0;

/// Bar chart description in the shape ECharts accepts as `setOption` input.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartOption {
    pub title: ChartTitle,
    pub tooltip: Tooltip,
    pub grid: Grid,
    pub x_axis: CategoryAxis,
    pub y_axis: ValueAxis,
    pub series: Vec<BarSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTitle {
    pub text: String,
    pub left: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub trigger: &'static str,
    pub axis_pointer: AxisPointer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisPointer {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub top: &'static str,
    pub left: &'static str,
    pub right: &'static str,
    pub bottom: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAxis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Vec<String>,
    pub axis_label: CategoryAxisLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAxisLabel {
    /// 0 shows every category label.
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueAxis {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub axis_label: ValueAxisLabel,
}

/// Tick labels are `value / divisor` followed by `suffix`.
///
/// ECharts has no such fields and its string templates cannot divide, so this
/// part of the option is interpreted by the [`ChartSurface`]: it installs a
/// label formatter function equivalent to [`ValueAxisLabel::format`] before
/// passing the rest of the option to `setOption`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueAxisLabel {
    pub divisor: f64,
    pub suffix: String,
}

impl ValueAxisLabel {
    pub fn format(&self, value: f64) -> String {
        format!("{}{}", value / self.divisor, self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: Vec<f64>,
}

impl BarChartOption {
    pub fn population(totals: &AggregateTotals) -> Self {
        Self {
            title: ChartTitle {
                text: CHART_TITLE.to_string(),
                left: "center",
            },
            tooltip: Tooltip {
                trigger: "axis",
                axis_pointer: AxisPointer { kind: "shadow" },
            },
            grid: Grid {
                top: "15%",
                left: "15%",
                right: "5%",
                bottom: "10%",
            },
            x_axis: CategoryAxis {
                kind: "category",
                data: CATEGORY_LABELS.iter().map(|s| s.to_string()).collect(),
                axis_label: CategoryAxisLabel { interval: 0 },
            },
            y_axis: ValueAxis {
                kind: "value",
                axis_label: ValueAxisLabel {
                    divisor: MILLION,
                    suffix: "百万".to_string(),
                },
            },
            series: vec![BarSeries {
                name: SERIES_NAME.to_string(),
                kind: "bar",
                data: totals.values().to_vec(),
            }],
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Owns the single chart instance and drives the side panel hosting it.
///
/// The chart is created lazily on the first render and reused afterwards.
pub struct ChartPresenter {
    surface: Arc<dyn ChartSurface>,
    container: String,
    chart: Option<ChartHandle>,
}

impl ChartPresenter {
    pub fn new(surface: Arc<dyn ChartSurface>, container: impl Into<String>) -> Self {
        Self {
            surface,
            container: container.into(),
            chart: None,
        }
    }

    pub fn render(&mut self, totals: &AggregateTotals) {
        let chart = match self.chart {
            Some(chart) => chart,
            None => {
                let chart = self.surface.init(&self.container);
                debug!(container = %self.container, "chart mounted");
                self.chart = Some(chart);
                chart
            }
        };
        self.surface
            .set_option(chart, &BarChartOption::population(totals));
    }

    pub fn show(&self) {
        self.surface.set_panel_visible(true);
    }

    pub fn hide(&self) {
        self.surface.set_panel_visible(false);
    }

    pub fn is_mounted(&self) -> bool {
        self.chart.is_some()
    }
}
