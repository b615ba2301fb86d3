use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use foundation::bounds::Extent;
use foundation::geometry::{Polygon, extent_of};
use foundation::ids::FeatureId;
use geo::Intersects;
use tracing::warn;

use crate::feature::Feature;
use crate::spatial::{Bvh, Item as BvhItem};

/// In-memory spatial index over a loaded feature collection.
///
/// Ordering contract:
/// - every query returns features in ascending `FeatureId` order.
///
/// Ids are unique: when two input features share an id the first one is
/// kept and the later one is dropped with a warning.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    by_id: BTreeMap<FeatureId, Arc<Feature>>,
    bvh: Bvh,
}

impl FeatureIndex {
    pub fn build(features: impl IntoIterator<Item = Feature>) -> Self {
        let mut by_id: BTreeMap<FeatureId, Arc<Feature>> = BTreeMap::new();
        let mut items: Vec<BvhItem> = Vec::new();

        for feature in features {
            let slot = match by_id.entry(feature.id) {
                Entry::Vacant(slot) => slot,
                Entry::Occupied(kept) => {
                    warn!(
                        id = feature.id.0,
                        kept = kept.get().name(),
                        dropped = feature.name(),
                        "duplicate feature id"
                    );
                    continue;
                }
            };
            if let Some(bounds) = feature.extent() {
                items.push(BvhItem {
                    id: feature.id,
                    bounds,
                });
            }
            slot.insert(Arc::new(feature));
        }

        Self {
            by_id,
            bvh: Bvh::build(items),
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: FeatureId) -> Option<&Arc<Feature>> {
        self.by_id.get(&id)
    }

    pub fn all(&self) -> Vec<Arc<Feature>> {
        self.by_id.values().cloned().collect()
    }

    /// Features whose extent overlaps `extent` (envelope test only).
    pub fn envelope_intersecting(&self, extent: &Extent) -> Vec<Arc<Feature>> {
        self.bvh
            .query_extent(extent)
            .into_iter()
            .filter_map(|id| self.by_id.get(&id).cloned())
            .collect()
    }

    /// Features whose geometry intersects `polygon`, boundaries included.
    pub fn intersecting(&self, polygon: &Polygon) -> Vec<Arc<Feature>> {
        let Some(extent) = extent_of(polygon) else {
            return Vec::new();
        };
        self.envelope_intersecting(&extent)
            .into_iter()
            .filter(|f| f.geometry.intersects(polygon))
            .collect()
    }
}
