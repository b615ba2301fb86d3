use foundation::ids::FeatureId;
use foundation::math::Vec2;
use scene::feature::{AttributeValue, Feature};
use scene::fields;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub field: &'static str,
    pub label: &'static str,
    pub places: usize,
    pub digit_separator: bool,
}

impl FieldInfo {
    const fn count(field: &'static str, label: &'static str) -> Self {
        Self {
            field,
            label,
            places: 0,
            digit_separator: true,
        }
    }
}

/// Title plus ordered field rows shown when a region is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupTemplate {
    pub title_field: &'static str,
    pub fields: Vec<FieldInfo>,
}

impl PopupTemplate {
    pub fn population() -> Self {
        Self {
            title_field: fields::PLACE_NAME,
            fields: vec![
                FieldInfo::count(fields::MALE, "男性人口"),
                FieldInfo::count(fields::FEMALE, "女性人口"),
                FieldInfo::count(fields::URBAN_POPULATION, "城镇人口"),
                FieldInfo::count(fields::VILLAGE_POPULATION, "乡村人口"),
                FieldInfo::count(fields::TOTAL_POPULATION, "总人口数"),
                FieldInfo::count(fields::HOUSEHOLD_SIZE, "户规模"),
                FieldInfo::count(fields::ONE_GENERATION, "一代户"),
                FieldInfo::count(fields::TWO_GENERATIONS, "二代户"),
                FieldInfo::count(fields::THREE_GENERATIONS, "三代户"),
                FieldInfo::count(fields::FOUR_PLUS_GENERATIONS, "四代以上户"),
            ],
        }
    }

    pub fn render(&self, feature: &Feature, location: Vec2) -> Popup {
        let title = feature
            .text(self.title_field)
            .unwrap_or_default()
            .to_string();
        let rows = self
            .fields
            .iter()
            .map(|info| PopupRow {
                label: info.label.to_string(),
                value: match feature.attribute(info.field) {
                    Some(AttributeValue::Number(v)) => {
                        format_number(*v, info.places, info.digit_separator)
                    }
                    Some(AttributeValue::Text(s)) => s.clone(),
                    Some(AttributeValue::Null) | None => String::new(),
                },
            })
            .collect();
        Popup {
            feature: feature.id,
            title,
            rows,
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub feature: FeatureId,
    pub title: String,
    pub rows: Vec<PopupRow>,
    pub location: Vec2,
}

impl Popup {
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

/// Rounds to `places` decimals, grouping the integer part in threes.
pub fn format_number(value: f64, places: usize, digit_separator: bool) -> String {
    if !value.is_finite() {
        return String::new();
    }
    let text = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    let negative = value < 0.0 && text.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    if negative {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if digit_separator && i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
