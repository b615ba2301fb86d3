//! Attribute keys of the population dataset.
//!
//! The dataset uses Chinese field names; these constants are the only place
//! the raw keys appear.

/// Place name, used for popup titles and result list labels.
pub const PLACE_NAME: &str = "地名";
pub const MALE: &str = "男";
pub const FEMALE: &str = "女";
pub const URBAN_POPULATION: &str = "城镇人口";
pub const VILLAGE_POPULATION: &str = "乡村人口";
/// City-district population. The published dataset does not carry this
/// field, so sums over it are zero in practice.
pub const CITY_POPULATION: &str = "城区人口";
pub const TOTAL_POPULATION: &str = "人口数";
pub const HOUSEHOLD_SIZE: &str = "户规模";
pub const ONE_GENERATION: &str = "一代户";
pub const TWO_GENERATIONS: &str = "二代户";
pub const THREE_GENERATIONS: &str = "三代户";
pub const FOUR_PLUS_GENERATIONS: &str = "四代以上户";
/// Stable identifier used for ordering.
pub const OBJECT_ID: &str = "OBJECTID";
