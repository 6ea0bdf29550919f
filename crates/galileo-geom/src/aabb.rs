use galileo_core::types::Vec3;

/// World-space bounds. Touching boxes count as overlapping.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Aabb { pub min: Vec3, pub max: Vec3 }

impl Aabb {
    #[inline] pub fn new(min: Vec3, max: Vec3) -> Self { Self { min, max } }

    #[inline] pub fn from_center_half_extents(c: Vec3, he: Vec3) -> Self {
        Self { min: c - he, max: c + he }
    }

    #[inline] pub fn is_inverted(&self) -> bool { self.min.cmpgt(self.max).any() }

    #[inline] pub fn overlaps(&self, other: &Aabb) -> bool {
        !self.is_inverted() && !other.is_inverted()
            && self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Pulls every face in by `r`. Boxes thinner than `2r` come out inverted
    /// and then overlap nothing.
    #[inline] pub fn shrink_by(&self, r: f32) -> Aabb {
        let e = Vec3::splat(r);
        Aabb { min: self.min + e, max: self.max - e }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galileo_core::vec3;

    #[test] fn shared_face_overlaps_until_shrunk() {
        let a = Aabb::from_center_half_extents(vec3(0.0, 0.0, 0.5), Vec3::splat(0.5));
        let b = Aabb::from_center_half_extents(vec3(0.0, 0.0, 1.5), Vec3::splat(0.5));
        assert!(a.overlaps(&b));
        assert!(!a.shrink_by(1e-3).overlaps(&b.shrink_by(1e-3)));
    }

    #[test] fn inverted_box_overlaps_nothing() {
        let tiny = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.01)).shrink_by(0.1);
        let big = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(5.0));
        assert!(!tiny.overlaps(&big));
    }
}
