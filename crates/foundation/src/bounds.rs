use crate::math::Vec2;

/// Axis-aligned planar extent, in the same coordinates as feature geometry.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extent {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Extent {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Extent { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }

    /// Closed-interval overlap test: touching edges count as intersecting.
    pub fn intersects(&self, other: &Extent) -> bool {
        !(other.min[0] > self.max[0]
            || other.max[0] < self.min[0]
            || other.min[1] > self.max[1]
            || other.max[1] < self.min[1])
    }

    pub fn union(&self, other: &Extent) -> Extent {
        Extent::new(
            [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        )
    }

    /// Scales the extent about its center; `expand(2.0)` doubles width and height.
    pub fn expand(&self, factor: f64) -> Extent {
        let c = self.center();
        let hw = self.width() * 0.5 * factor;
        let hh = self.height() * 0.5 * factor;
        Extent::new([c.x - hw, c.y - hh], [c.x + hw, c.y + hh])
    }
}

#[cfg(test)]
mod tests {
    use super::Extent;

    #[test]
    fn expand_keeps_center() {
        let e = Extent::new([0.0, 0.0], [2.0, 4.0]);
        let x = e.expand(2.0);
        assert_eq!(x, Extent::new([-1.0, -2.0], [3.0, 6.0]));
        assert_eq!(x.center(), e.center());
    }

    #[test]
    fn touching_extents_intersect() {
        let a = Extent::new([0.0, 0.0], [1.0, 1.0]);
        let b = Extent::new([1.0, 0.5], [2.0, 2.0]);
        let c = Extent::new([1.5, 0.0], [2.0, 1.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
