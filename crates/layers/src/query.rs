//! Feature store contract and the in-memory implementation.
//!
//! The dashboard only talks to [`FeatureStore`]; where the features live
//! (a loaded GeoJSON document, a remote service) is the implementor's concern.

use std::cmp::Ordering;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use foundation::bounds::Extent;
use foundation::geometry::{MultiPolygon, Polygon, extent_of};
use foundation::math::precision::stable_total_cmp_f64;
use scene::feature::{AttributeValue, Attributes, Feature};
use scene::fields;
use scene::query::FeatureIndex;
use tracing::trace;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Transport failure reaching the backend.
    Network(String),
    /// The backend answered but could not evaluate the query.
    Backend(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::Network(msg) => write!(f, "feature query network error: {msg}"),
            QueryError::Backend(msg) => write!(f, "feature query failed: {msg}"),
        }
    }
}

impl std::error::Error for QueryError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SpatialRelationship {
    /// Exact geometry intersection, boundaries included.
    #[default]
    Intersects,
    /// Extent overlap only.
    EnvelopeIntersects,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutFields {
    #[default]
    All,
    Named(Vec<String>),
}

impl OutFields {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        OutFields::Named(names.into_iter().map(Into::into).collect())
    }

    fn keeps(&self, field: &str) -> bool {
        match self {
            OutFields::All => true,
            OutFields::Named(names) => names.iter().any(|n| n == field),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    /// `None` matches every feature.
    pub geometry: Option<Polygon>,
    pub spatial_relationship: SpatialRelationship,
    pub out_fields: OutFields,
    pub return_geometry: bool,
    /// Ascending order by this field; `None` keeps id order.
    pub order_by: Option<String>,
}

impl Default for FeatureQuery {
    fn default() -> Self {
        Self {
            geometry: None,
            spatial_relationship: SpatialRelationship::Intersects,
            out_fields: OutFields::All,
            return_geometry: true,
            order_by: None,
        }
    }
}

impl FeatureQuery {
    /// All fields plus geometry of features intersecting `geometry`.
    pub fn intersecting(geometry: Polygon) -> Self {
        Self {
            geometry: Some(geometry),
            ..Default::default()
        }
    }

    /// Features visible in `extent`, ordered by the stable identifier.
    pub fn visible_in(extent: Extent) -> Self {
        Self {
            geometry: Some(extent.to_polygon()),
            order_by: Some(fields::OBJECT_ID.to_string()),
            ..Default::default()
        }
    }

    pub fn with_out_fields(mut self, out_fields: OutFields) -> Self {
        self.out_fields = out_fields;
        self
    }

    pub fn with_return_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }
}

/// Geometry-aware feature source.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait FeatureStore: Send + Sync {
    fn query(&self, query: FeatureQuery) -> BoxFuture<'_, Result<Vec<Arc<Feature>>, QueryError>>;

    /// Features intersecting `extent`, ordered by identifier.
    fn list_visible(&self, extent: Extent) -> BoxFuture<'_, Result<Vec<Arc<Feature>>, QueryError>> {
        self.query(FeatureQuery::visible_in(extent))
    }
}

/// Feature store over a collection held in memory; queries resolve immediately.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeatureStore {
    index: FeatureIndex,
}

impl InMemoryFeatureStore {
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            index: FeatureIndex::build(features),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Synchronous evaluation used by the async trait methods.
    pub fn execute(&self, query: &FeatureQuery) -> Vec<Arc<Feature>> {
        let mut hits = match (&query.geometry, query.spatial_relationship) {
            (None, _) => self.index.all(),
            (Some(poly), SpatialRelationship::Intersects) => self.index.intersecting(poly),
            (Some(poly), SpatialRelationship::EnvelopeIntersects) => match extent_of(poly) {
                Some(extent) => self.index.envelope_intersecting(&extent),
                None => Vec::new(),
            },
        };

        if let Some(field) = &query.order_by {
            hits.sort_by(|a, b| compare_by_field(a, b, field).then_with(|| a.id.cmp(&b.id)));
        }

        trace!(hits = hits.len(), "in-memory feature query");
        hits.into_iter().map(|f| project(f, query)).collect()
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn query(&self, query: FeatureQuery) -> BoxFuture<'_, Result<Vec<Arc<Feature>>, QueryError>> {
        let hits = self.execute(&query);
        Box::pin(async move { Ok(hits) })
    }
}

fn compare_by_field(a: &Feature, b: &Feature, field: &str) -> Ordering {
    if field == fields::OBJECT_ID {
        return a.id.cmp(&b.id);
    }
    match (a.attribute(field), b.attribute(field)) {
        (Some(AttributeValue::Number(x)), Some(AttributeValue::Number(y))) => {
            stable_total_cmp_f64(*x, *y)
        }
        (Some(AttributeValue::Text(x)), Some(AttributeValue::Text(y))) => x.cmp(y),
        // Missing values sort last.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(feature: Arc<Feature>, query: &FeatureQuery) -> Arc<Feature> {
    if query.return_geometry && query.out_fields == OutFields::All {
        return feature;
    }
    let attributes: Attributes = feature
        .attributes
        .iter()
        .filter(|(k, _)| query.out_fields.keeps(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let geometry = if query.return_geometry {
        feature.geometry.clone()
    } else {
        MultiPolygon::new(Vec::new())
    };
    Arc::new(Feature::new(feature.id, geometry, attributes))
}
