use scene::feature::Feature;
use scene::fields;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_rgba_f32(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a,
        ]
    }

    /// Linear blend in sRGB space, `t` clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: (self.a as f64 + (other.a as f64 - self.a as f64) * t) as f32,
        }
    }
}

/// Sequential palette shared by both renderers, light to dark.
pub const PALETTE: [Color; 5] = [
    Color::rgb(0xff, 0xef, 0xdc),
    Color::rgb(0xed, 0xac, 0x90),
    Color::rgb(0xda, 0x68, 0x43),
    Color::rgb(0xa0, 0x35, 0x23),
    Color::rgb(0x66, 0x02, 0x02),
];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Outline {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillSymbol {
    pub color: Color,
    pub outline: Outline,
}

impl FillSymbol {
    /// Thin translucent outline used by every choropleth class.
    pub const fn choropleth(color: Color) -> Self {
        Self {
            color,
            outline: Outline {
                color: Color::rgba(0, 0, 0, 0.3),
                width: 0.2,
            },
        }
    }

    /// Translucent blue used for selection highlights.
    pub const fn highlight() -> Self {
        Self {
            color: Color::rgba(20, 130, 200, 0.5),
            outline: Outline {
                color: Color::WHITE,
                width: 0.5,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassBreak {
    pub min_value: f64,
    pub max_value: f64,
    pub symbol: FillSymbol,
    pub label: String,
}

/// Buckets a numeric field into discrete filled classes.
///
/// Breaks are half-open `[min, max)` except the last, which includes `max`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassBreaksRenderer {
    pub field: String,
    pub default_symbol: FillSymbol,
    pub default_label: String,
    pub breaks: Vec<ClassBreak>,
}

impl ClassBreaksRenderer {
    pub fn class_for_value(&self, value: Option<f64>) -> Option<&ClassBreak> {
        let v = value.filter(|v| v.is_finite())?;
        let last = self.breaks.len().checked_sub(1)?;
        self.breaks.iter().enumerate().find_map(|(i, b)| {
            let upper_ok = if i == last {
                v <= b.max_value
            } else {
                v < b.max_value
            };
            (v >= b.min_value && upper_ok).then_some(b)
        })
    }

    /// Symbol and legend label for `feature`, falling back to the defaults.
    pub fn symbolize(&self, feature: &Feature) -> (&FillSymbol, &str) {
        match self.class_for_value(feature.number(&self.field)) {
            Some(b) => (&b.symbol, &b.label),
            None => (&self.default_symbol, &self.default_label),
        }
    }
}

pub fn population_class_breaks() -> ClassBreaksRenderer {
    let bounds: [(f64, f64, &str); 5] = [
        (0.0, 1_500_000.0, "<150万"),
        (1_500_000.0, 4_000_000.0, "150万-400万"),
        (4_000_000.0, 7_000_000.0, "400万-700万"),
        (7_000_000.0, 15_000_000.0, "700万-1500万"),
        (15_000_000.0, 30_000_000.0, "1500万-3000万"),
    ];
    ClassBreaksRenderer {
        field: fields::TOTAL_POPULATION.to_string(),
        default_symbol: FillSymbol::choropleth(Color::WHITE),
        default_label: "No Data".to_string(),
        breaks: bounds
            .iter()
            .zip(PALETTE)
            .map(|((min, max, label), color)| ClassBreak {
                min_value: *min,
                max_value: *max,
                symbol: FillSymbol::choropleth(color),
                label: (*label).to_string(),
            })
            .collect(),
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stop<T> {
    pub value: f64,
    pub output: T,
}

/// `field / normalization_field`, mapped through linear stops.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualVariable<T> {
    pub field: String,
    pub normalization_field: String,
    pub stops: Vec<Stop<T>>,
}

impl<T> VisualVariable<T> {
    pub fn ratio(&self, feature: &Feature) -> Option<f64> {
        let value = feature.number(&self.field)?;
        let norm = feature.number(&self.normalization_field)?;
        if norm == 0.0 {
            return None;
        }
        Some(value / norm).filter(|r| r.is_finite())
    }

    /// Locates `x` between stops: `(lower, upper, t)`, clamped at both ends.
    fn bracket(&self, x: f64) -> Option<(&Stop<T>, &Stop<T>, f64)> {
        let first = self.stops.first()?;
        let last = self.stops.last()?;
        if x <= first.value {
            return Some((first, first, 0.0));
        }
        if x >= last.value {
            return Some((last, last, 0.0));
        }
        self.stops.windows(2).find_map(|w| {
            let (a, b) = (&w[0], &w[1]);
            (x >= a.value && x <= b.value).then(|| {
                let span = b.value - a.value;
                let t = if span > 0.0 { (x - a.value) / span } else { 0.0 };
                (a, b, t)
            })
        })
    }
}

impl VisualVariable<f64> {
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        let (a, b, t) = self.bracket(x)?;
        Some(a.output + (b.output - a.output) * t)
    }
}

impl VisualVariable<Color> {
    pub fn evaluate(&self, x: f64) -> Option<Color> {
        let (a, b, t) = self.bracket(x)?;
        Some(a.output.lerp(b.output, t))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExtrusionSymbol {
    /// Extrusion height in meters.
    pub height: f64,
    pub color: Color,
}

/// 3D renderer: polygons extruded by size stops and colored by color stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrusionRenderer {
    pub label: String,
    pub size: VisualVariable<f64>,
    pub color: VisualVariable<Color>,
}

impl ExtrusionRenderer {
    /// `None` when the normalized ratio cannot be computed for `feature`.
    pub fn symbolize(&self, feature: &Feature) -> Option<ExtrusionSymbol> {
        let height = self.size.evaluate(self.size.ratio(feature)?)?;
        let color = self.color.evaluate(self.color.ratio(feature)?)?;
        Some(ExtrusionSymbol { height, color })
    }
}

pub fn urban_ratio_extrusion() -> ExtrusionRenderer {
    ExtrusionRenderer {
        label: "城镇人口数所占百分比".to_string(),
        size: VisualVariable {
            field: fields::URBAN_POPULATION.to_string(),
            normalization_field: fields::TOTAL_POPULATION.to_string(),
            stops: vec![
                Stop {
                    value: 0.3,
                    output: 10_000.0,
                },
                Stop {
                    value: 0.8,
                    output: 500_000.0,
                },
            ],
        },
        color: VisualVariable {
            field: fields::URBAN_POPULATION.to_string(),
            normalization_field: fields::TOTAL_POPULATION.to_string(),
            stops: vec![
                Stop {
                    value: 0.3,
                    output: PALETTE[0],
                },
                Stop {
                    value: 0.8,
                    output: PALETTE[4],
                },
            ],
        },
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RendererKind {
    ClassBreaks,
    Extrusion,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Renderer {
    ClassBreaks(ClassBreaksRenderer),
    Extrusion(ExtrusionRenderer),
}

impl Renderer {
    pub fn kind(&self) -> RendererKind {
        match self {
            Renderer::ClassBreaks(_) => RendererKind::ClassBreaks,
            Renderer::Extrusion(_) => RendererKind::Extrusion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, PALETTE, population_class_breaks, urban_ratio_extrusion};
    use foundation::bounds::Extent;
    use foundation::ids::FeatureId;
    use scene::feature::{Attributes, Feature};
    use scene::fields;

    fn feature(total: Option<f64>, urban: Option<f64>) -> Feature {
        let mut attrs = Attributes::new();
        if let Some(t) = total {
            attrs.insert(fields::TOTAL_POPULATION.into(), t.into());
        }
        if let Some(u) = urban {
            attrs.insert(fields::URBAN_POPULATION.into(), u.into());
        }
        Feature::new(
            FeatureId(1),
            Extent::new([0.0, 0.0], [1.0, 1.0]).to_polygon().into(),
            attrs,
        )
    }

    #[test]
    fn hex_round_trip_of_palette() {
        assert_eq!(Color::from_hex("#edac90"), Some(PALETTE[1]));
        assert_eq!(PALETTE[4].to_hex(), "#660202");
        assert_eq!(Color::from_hex("edac90"), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
    }

    #[test]
    fn class_breaks_bucket_by_total_population() {
        let r = population_class_breaks();
        assert_eq!(r.symbolize(&feature(Some(1_000_000.0), None)).1, "<150万");
        assert_eq!(r.symbolize(&feature(Some(1_500_000.0), None)).1, "150万-400万");
        assert_eq!(r.symbolize(&feature(Some(30_000_000.0), None)).1, "1500万-3000万");
        assert_eq!(r.symbolize(&feature(Some(31_000_000.0), None)).1, "No Data");
        assert_eq!(r.symbolize(&feature(None, None)).1, "No Data");
        assert_eq!(r.symbolize(&feature(None, None)).0.color, Color::WHITE);
    }

    #[test]
    fn extrusion_interpolates_and_clamps() {
        let r = urban_ratio_extrusion();

        let low = r.symbolize(&feature(Some(100.0), Some(10.0))).unwrap();
        assert_eq!(low.height, 10_000.0);
        assert_eq!(low.color, PALETTE[0]);

        let mid = r.symbolize(&feature(Some(100.0), Some(55.0))).unwrap();
        assert!((mid.height - 255_000.0).abs() < 1e-6);

        let high = r.symbolize(&feature(Some(100.0), Some(95.0))).unwrap();
        assert_eq!(high.height, 500_000.0);
        assert_eq!(high.color, PALETTE[4]);

        assert!(r.symbolize(&feature(Some(0.0), Some(5.0))).is_none());
        assert!(r.symbolize(&feature(None, Some(5.0))).is_none());
    }
}
