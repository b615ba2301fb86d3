//! GeoJSON `FeatureCollection` decoding.
//!
//! Only polygonal geometry is kept. Features with other geometry kinds (or no
//! geometry) are skipped and counted so callers can report them.

use std::fs;
use std::path::{Path, PathBuf};

use foundation::geometry::{LineString, MultiPolygon, Polygon, is_areal};
use foundation::ids::FeatureId;
use scene::feature::{AttributeValue, Attributes, Feature};
use scene::fields;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum FormatError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    NotAFeatureCollection(String),
}

impl std::fmt::Display for FormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            FormatError::Json(e) => write!(f, "invalid GeoJSON: {e}"),
            FormatError::NotAFeatureCollection(kind) => {
                write!(f, "expected a FeatureCollection, found {kind:?}")
            }
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Io { source, .. } => Some(source),
            FormatError::Json(e) => Some(e),
            FormatError::NotAFeatureCollection(_) => None,
        }
    }
}

/// Decoded collection plus the number of features that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct CollectionDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<FeatureDoc>,
}

#[derive(Debug, Deserialize)]
struct FeatureDoc {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<GeometryDoc>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

// Positions are read as plain vectors so optional altitude values are tolerated.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryDoc {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

pub fn load_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection, FormatError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| FormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_feature_collection(&text)
}

pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, FormatError> {
    let doc: CollectionDoc = serde_json::from_str(text).map_err(FormatError::Json)?;
    if doc.kind != "FeatureCollection" {
        return Err(FormatError::NotAFeatureCollection(doc.kind));
    }

    let mut out = FeatureCollection::default();
    let mut pending: Vec<(Option<FeatureId>, MultiPolygon, Attributes)> = Vec::new();
    for (index, feature) in doc.features.into_iter().enumerate() {
        let attributes = feature
            .properties
            .map(convert_properties)
            .unwrap_or_default();
        let id = explicit_id(feature.id.as_ref(), &attributes);

        let Some(geometry) = feature.geometry.and_then(convert_geometry) else {
            debug!(index, ?id, "skipping feature without polygonal geometry");
            out.skipped += 1;
            continue;
        };
        pending.push((id, geometry, attributes));
    }

    // Features without a usable id are numbered after the largest real one,
    // in load order, so the two never collide.
    let mut next = pending
        .iter()
        .filter_map(|(id, _, _)| id.map(|id| id.0))
        .max()
        .map_or(1, |max| max.saturating_add(1));
    for (id, geometry, attributes) in pending {
        let id = id.unwrap_or_else(|| {
            let assigned = FeatureId(next);
            next += 1;
            assigned
        });
        out.features.push(Feature::new(id, geometry, attributes));
    }

    if out.skipped > 0 {
        warn!(skipped = out.skipped, "dropped non-polygon features");
    }
    Ok(out)
}

/// `OBJECTID` property, then the GeoJSON `id`; only non-negative integers count.
fn explicit_id(doc_id: Option<&Value>, attributes: &Attributes) -> Option<FeatureId> {
    let from_props = attributes
        .get(fields::OBJECT_ID)
        .and_then(AttributeValue::as_f64);
    let from_doc = doc_id.and_then(Value::as_f64);
    match from_props.or(from_doc) {
        Some(v) if v >= 0.0 && v.fract() == 0.0 => Some(FeatureId(v as u64)),
        _ => None,
    }
}

fn convert_properties(props: Map<String, Value>) -> Attributes {
    props
        .into_iter()
        .map(|(k, v)| {
            let value = match v {
                Value::Null => AttributeValue::Null,
                Value::Number(n) => n
                    .as_f64()
                    .map(AttributeValue::Number)
                    .unwrap_or(AttributeValue::Null),
                Value::String(s) => AttributeValue::Text(s),
                Value::Bool(b) => AttributeValue::Text(b.to_string()),
                other => AttributeValue::Text(other.to_string()),
            };
            (k, value)
        })
        .collect()
}

fn convert_geometry(geometry: GeometryDoc) -> Option<MultiPolygon> {
    let polygons: Vec<Polygon> = match geometry {
        GeometryDoc::Polygon { coordinates } => convert_polygon(coordinates).into_iter().collect(),
        GeometryDoc::MultiPolygon { coordinates } => {
            coordinates.into_iter().filter_map(convert_polygon).collect()
        }
        GeometryDoc::Unsupported => return None,
    };
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}

/// First ring is the exterior, the rest are holes. Degenerate exteriors yield `None`.
fn convert_polygon(rings: Vec<Vec<Vec<f64>>>) -> Option<Polygon> {
    let mut rings = rings.into_iter().map(convert_ring);
    let exterior = rings.next()?;
    let polygon = Polygon::new(exterior, rings.collect());
    is_areal(&polygon).then_some(polygon)
}

fn convert_ring(positions: Vec<Vec<f64>>) -> LineString {
    positions
        .into_iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => None,
        })
        .collect::<Vec<(f64, f64)>>()
        .into()
}
