use std::sync::Arc;

use earcutr::earcut;
use foundation::geometry::{Polygon, open_ring};
use foundation::ids::FeatureId;
use foundation::math::{Vec2, Vec3};
use scene::feature::Feature;

use crate::layer::ChoroplethLayer;
use crate::symbology::{Color, Renderer};

#[derive(Debug, Clone, PartialEq)]
pub struct FillMesh {
    pub feature: FeatureId,
    pub color: Color,
    // Flat triangle list (3 vertices per triangle).
    pub triangles: Vec<Vec2>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedMesh {
    pub feature: FeatureId,
    pub color: Color,
    pub height: f64,
    // Roof triangles followed by wall quads split into triangles.
    pub triangles: Vec<Vec3>,
}

/// Renderer-ready geometry for one layer under its current renderer.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub fills: Vec<FillMesh>,
    pub extrusions: Vec<ExtrudedMesh>,
}

impl LayerSnapshot {
    pub fn triangle_count(&self) -> usize {
        let fills: usize = self.fills.iter().map(|m| m.triangles.len() / 3).sum();
        let walls: usize = self.extrusions.iter().map(|m| m.triangles.len() / 3).sum();
        fills + walls
    }
}

impl ChoroplethLayer {
    /// Symbolizes and triangulates `features` with the layer's active renderer.
    ///
    /// Class breaks yield flat fills; the extrusion renderer yields prisms.
    /// Features the extrusion renderer cannot symbolize are left out.
    pub fn extract(&self, features: &[Arc<Feature>]) -> LayerSnapshot {
        let mut out = LayerSnapshot::default();
        for feature in features {
            match self.renderer() {
                Renderer::ClassBreaks(r) => {
                    let (symbol, _label) = r.symbolize(feature);
                    let triangles = feature
                        .geometry
                        .iter()
                        .flat_map(triangulate_polygon)
                        .collect();
                    out.fills.push(FillMesh {
                        feature: feature.id,
                        color: symbol.color,
                        triangles,
                    });
                }
                Renderer::Extrusion(r) => {
                    let Some(symbol) = r.symbolize(feature) else {
                        continue;
                    };
                    let mut triangles = Vec::new();
                    for poly in feature.geometry.iter() {
                        extrude_polygon(poly, symbol.height, &mut triangles);
                    }
                    out.extrusions.push(ExtrudedMesh {
                        feature: feature.id,
                        color: symbol.color,
                        height: symbol.height,
                        triangles,
                    });
                }
            }
        }
        out
    }
}

fn extrude_polygon(poly: &Polygon, height: f64, out: &mut Vec<Vec3>) {
    out.extend(
        triangulate_polygon(poly)
            .into_iter()
            .map(|p| Vec3::from_planar(p, height)),
    );

    for ring in std::iter::once(poly.exterior()).chain(poly.interiors()) {
        let pts = open_ring(ring);
        if pts.len() < 3 {
            continue;
        }
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            let (a0, b0) = (Vec3::from_planar(a, 0.0), Vec3::from_planar(b, 0.0));
            let (a1, b1) = (Vec3::from_planar(a, height), Vec3::from_planar(b, height));
            out.extend([a0, b0, b1, a0, b1, a1]);
        }
    }
}

fn triangulate_polygon(poly: &Polygon) -> Vec<Vec2> {
    let mut vertices: Vec<Vec2> = Vec::new();
    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();

    let rings = std::iter::once(poly.exterior()).chain(poly.interiors());
    for (ring_i, ring) in rings.enumerate() {
        let pts = open_ring(ring);
        if pts.len() < 3 {
            if ring_i == 0 {
                return Vec::new();
            }
            continue;
        }
        if ring_i > 0 {
            hole_indices.push(vertices.len());
        }
        for p in pts {
            coords.push(p.x);
            coords.push(p.y);
            vertices.push(p);
        }
    }

    let indices = match earcut(&coords, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Vec::new(),
    };
    indices
        .into_iter()
        .filter_map(|idx| vertices.get(idx).copied())
        .collect()
}
