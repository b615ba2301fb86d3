use std::env;

use foundation::math::Vec2;

use crate::view::Viewpoint;

pub const DEFAULT_DATASET_URL: &str =
    "https://1716247670.github.io/webGISData/%E4%BA%BA%E5%8F%A3%E5%9F%BA%E6%9C%AC%E6%83%85%E5%86%B5.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}={:?}: {}", self.key, self.value, self.reason)
    }
}

impl std::error::Error for ConfigError {}

/// Startup configuration for the dashboard.
///
/// Every value has a default; environment variables override them.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub dataset_url: String,
    /// Screen container shared by the 2D and 3D views.
    pub container: String,
    pub chart_container: String,
    pub center: Vec2,
    pub zoom: f64,
    /// Width in pixels reserved on the right for the side panel.
    pub padding_right: f64,
    pub viewport_px: [f64; 2],
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            container: "viewDiv".to_string(),
            chart_container: "echartDiv".to_string(),
            center: Vec2::new(100.0, 32.0),
            zoom: 4.0,
            padding_right: 300.0,
            viewport_px: [1280.0, 720.0],
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the process environment
    /// in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let number = |key: &'static str, default: f64| -> Result<f64, ConfigError> {
            let Some(raw) = lookup(key) else {
                return Ok(default);
            };
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(ConfigError {
                    key,
                    value: raw,
                    reason: "expected a finite number",
                }),
            }
        };

        let config = Self {
            dataset_url: lookup("DASHBOARD_DATASET_URL").unwrap_or(defaults.dataset_url),
            container: lookup("DASHBOARD_CONTAINER").unwrap_or(defaults.container),
            chart_container: lookup("DASHBOARD_CHART_CONTAINER")
                .unwrap_or(defaults.chart_container),
            center: Vec2::new(
                number("DASHBOARD_CENTER_LON", defaults.center.x)?,
                number("DASHBOARD_CENTER_LAT", defaults.center.y)?,
            ),
            zoom: number("DASHBOARD_ZOOM", defaults.zoom)?,
            padding_right: number("DASHBOARD_PADDING_RIGHT", defaults.padding_right)?,
            viewport_px: [
                number("DASHBOARD_VIEWPORT_WIDTH", defaults.viewport_px[0])?,
                number("DASHBOARD_VIEWPORT_HEIGHT", defaults.viewport_px[1])?,
            ],
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.zoom < 0.0 {
            return Err(ConfigError {
                key: "DASHBOARD_ZOOM",
                value: self.zoom.to_string(),
                reason: "zoom must not be negative",
            });
        }
        if self.viewport_px[0] <= 0.0 || self.viewport_px[1] <= 0.0 {
            return Err(ConfigError {
                key: "DASHBOARD_VIEWPORT_WIDTH",
                value: format!("{}x{}", self.viewport_px[0], self.viewport_px[1]),
                reason: "viewport must be positive",
            });
        }
        if self.padding_right < 0.0 || self.padding_right >= self.viewport_px[0] {
            return Err(ConfigError {
                key: "DASHBOARD_PADDING_RIGHT",
                value: self.padding_right.to_string(),
                reason: "padding must fit inside the viewport",
            });
        }
        Ok(())
    }

    pub fn initial_viewpoint(&self) -> Viewpoint {
        Viewpoint::new(self.center, self.zoom)
    }
}
