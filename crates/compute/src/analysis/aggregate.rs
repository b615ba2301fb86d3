use scene::feature::Feature;
use scene::fields;
use serde::Serialize;

/// Chart category labels, in the same order as [`AggregateTotals::values`].
pub const CATEGORY_LABELS: [&str; 5] = ["男性人口", "女性人口", "城镇人口", "乡村人口", "城区人口"];

/// Source fields summed into each category, aligned with [`CATEGORY_LABELS`].
pub const AGGREGATE_FIELDS: [&str; 5] = [
    fields::MALE,
    fields::FEMALE,
    fields::URBAN_POPULATION,
    fields::VILLAGE_POPULATION,
    fields::CITY_POPULATION,
];

/// Per-field population sums over a selection.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTotals {
    pub male: f64,
    pub female: f64,
    pub urban_population: f64,
    pub village_population: f64,
    /// Always zero against the published dataset, which omits `城区人口`.
    pub city_population: f64,
}

impl AggregateTotals {
    pub fn values(&self) -> [f64; 5] {
        [
            self.male,
            self.female,
            self.urban_population,
            self.village_population,
            self.city_population,
        ]
    }

    /// True when every sum is zero; callers hide the chart in that case.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|v| *v == 0.0)
    }

    fn add_feature(&mut self, feature: &Feature) {
        let value = |field: &str| {
            feature
                .number(field)
                .filter(|v| v.is_finite())
                .unwrap_or(0.0)
        };
        self.male += value(fields::MALE);
        self.female += value(fields::FEMALE);
        self.urban_population += value(fields::URBAN_POPULATION);
        self.village_population += value(fields::VILLAGE_POPULATION);
        self.city_population += value(fields::CITY_POPULATION);
    }
}

/// Sums the fixed field set across `features`.
///
/// Missing, non-numeric and non-finite values count as zero. An empty input
/// yields all-zero totals.
pub fn summarize<'a, I>(features: I) -> AggregateTotals
where
    I: IntoIterator<Item = &'a Feature>,
{
    let mut totals = AggregateTotals::default();
    for feature in features {
        totals.add_feature(feature);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::{AGGREGATE_FIELDS, AggregateTotals, summarize};
    use foundation::bounds::Extent;
    use foundation::ids::FeatureId;
    use pretty_assertions::assert_eq;
    use scene::feature::{AttributeValue, Attributes, Feature};
    use scene::fields;

    fn feature(id: u64, values: &[(&str, AttributeValue)]) -> Feature {
        let attrs: Attributes = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Feature::new(
            FeatureId(id),
            Extent::new([0.0, 0.0], [1.0, 1.0]).to_polygon().into(),
            attrs,
        )
    }

    #[test]
    fn empty_input_is_all_zero() {
        let totals = summarize(std::iter::empty::<&Feature>());
        assert_eq!(totals, AggregateTotals::default());
        assert!(totals.is_empty());
    }

    #[test]
    fn matches_manual_field_sums_with_missing_as_zero() {
        let features = vec![
            feature(
                1,
                &[
                    (fields::MALE, 510.0.into()),
                    (fields::FEMALE, 490.0.into()),
                    (fields::URBAN_POPULATION, 600.0.into()),
                    (fields::VILLAGE_POPULATION, 400.0.into()),
                ],
            ),
            feature(
                2,
                &[
                    (fields::MALE, 1_020.0.into()),
                    (fields::FEMALE, AttributeValue::Null),
                    (fields::URBAN_POPULATION, "n/a".into()),
                ],
            ),
            feature(3, &[(fields::VILLAGE_POPULATION, f64::NAN.into())]),
        ];

        let totals = summarize(&features);

        let mut manual = [0.0; 5];
        for f in &features {
            for (slot, field) in manual.iter_mut().zip(AGGREGATE_FIELDS) {
                *slot += f.number(field).filter(|v| v.is_finite()).unwrap_or(0.0);
            }
        }
        assert_eq!(totals.values(), manual);
        assert_eq!(totals.values(), [1_530.0, 490.0, 600.0, 400.0, 0.0]);
        assert!(!totals.is_empty());
    }

    #[test]
    fn city_population_sums_when_present() {
        let features = [
            feature(1, &[(fields::CITY_POPULATION, 5.0.into())]),
            feature(2, &[(fields::CITY_POPULATION, 7.0.into())]),
        ];
        assert_eq!(summarize(&features).city_population, 12.0);
    }
}
