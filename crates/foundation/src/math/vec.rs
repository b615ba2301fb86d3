/// Planar coordinate (longitude/latitude degrees for dataset geometry).
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

}

/// Planar position plus height in meters; used for extruded meshes.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_planar(p: Vec2, z: f64) -> Self {
        Self::new(p.x, p.y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::{Vec2, Vec3};

    #[test]
    fn vec3_lifts_planar_point() {
        let p = Vec3::from_planar(Vec2::new(3.0, 4.0), 10.0);
        assert_eq!(p, Vec3::new(3.0, 4.0, 10.0));
    }
}
