use glam::Vec3;

/// A ray prepared for traversal; the reciprocal direction is precomputed once
/// since every AABB slab test needs it.
#[derive(Copy, Clone, Default)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    inv_direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: 1.0 / direction,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn inv_direction(&self) -> Vec3 {
        self.inv_direction
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Performs ray <-> AABB hit-testing and returns the entry distance, or
    /// `f32::MAX` on a miss.
    ///
    /// A ray grazing the box exactly at `t_near == t_far` is a miss; builders
    /// are expected to pad zero-thickness boxes.
    pub fn hits_box_at(&self, bb_min: Vec3, bb_max: Vec3) -> f32 {
        let hit_min = (bb_min - self.origin) * self.inv_direction;
        let hit_max = (bb_max - self.origin) * self.inv_direction;

        let tmin = hit_min.min(hit_max).max_element();
        let tmax = hit_min.max(hit_max).min_element();

        if tmax > tmin && tmax >= 0.0 {
            tmin
        } else {
            f32::MAX
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn box_hit() {
        let ray = Ray::new(vec3(0.0, 0.0, -5.0), vec3(0.0, 0.0, 1.0));

        let t =
            ray.hits_box_at(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0));

        assert_eq!(4.0, t);
    }

    #[test]
    fn box_miss() {
        let ray = Ray::new(vec3(0.0, 5.0, -5.0), vec3(0.0, 0.0, 1.0));

        let t =
            ray.hits_box_at(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0));

        assert_eq!(f32::MAX, t);
    }

    #[test]
    fn grazing_the_box_is_a_miss() {
        // Runs exactly along the box's +y face, so t_near == t_far.
        let ray = Ray::new(vec3(-5.0, 1.0, 0.0), vec3(1.0, 0.0, 0.0));

        let t =
            ray.hits_box_at(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0));

        assert_eq!(f32::MAX, t);
    }

    #[test]
    fn box_behind_origin() {
        let ray = Ray::new(vec3(0.0, 0.0, 5.0), vec3(0.0, 0.0, 1.0));

        let t =
            ray.hits_box_at(vec3(-1.0, -1.0, -1.0), vec3(1.0, 1.0, 1.0));

        assert_eq!(f32::MAX, t);
    }
}
