use glam::{vec2, Vec2};

/// View over the emissive-triangle table.
///
/// Layout (one `u32` buffer):
///
/// ```text
/// [0]                     - light count n
/// [1 ..= n]               - triangle id per light, sorted by area
/// [n + 1 ..= 2n + 1]      - cumulative area table (n + 1 entries, f32 bits)
/// ```
///
/// Picking a light proportionally to its area is a binary search over the
/// cumulative table.
#[derive(Clone, Copy)]
pub struct LightsView<'a> {
    buffer: &'a [u32],
}

impl<'a> LightsView<'a> {
    pub fn new(buffer: &'a [u32]) -> Self {
        Self { buffer }
    }

    pub fn len(&self) -> u32 {
        unsafe { *self.buffer.get_unchecked(0) }
    }

    pub fn total_area(&self) -> f32 {
        self.cumulative(self.len())
    }

    fn triangle_id(&self, slot: u32) -> u32 {
        unsafe { *self.buffer.get_unchecked((1 + slot) as usize) }
    }

    fn cumulative(&self, slot: u32) -> f32 {
        f32::from_bits(unsafe {
            *self
                .buffer
                .get_unchecked((1 + self.len() + slot) as usize)
        })
    }

    /// Picks a light proportionally to its area; `xi` is uniform in
    /// `[0.0, 1.0)`. Returns the light's triangle id.
    pub fn pick(&self, xi: f32) -> u32 {
        let target = xi * self.total_area();

        // Binary search for the largest slot with cumulative(slot) <= target
        let mut lo = 0;
        let mut hi = self.len();

        while lo + 1 < hi {
            let mid = (lo + hi) / 2;

            if self.cumulative(mid) <= target {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        self.triangle_id(lo)
    }

    /// Samples a uniform point on a triangle; returns barycentric `(u, v)`.
    pub fn sample_barycentric(xi: Vec2) -> Vec2 {
        #[cfg(target_arch = "spirv")]
        use spirv_std::num_traits::Float;

        let su = xi.x.sqrt();

        vec2(1.0 - su, xi.y * su)
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec::Vec;

    use glam::vec2;

    use super::*;

    fn table(areas: &[f32]) -> Vec<u32> {
        let mut buffer = Vec::new();

        buffer.push(areas.len() as u32);

        for id in 0..areas.len() {
            buffer.push(id as u32 + 100);
        }

        let mut total = 0.0;

        for area in areas {
            buffer.push(total.to_bits());
            total += area;
        }

        buffer.push(total.to_bits());
        buffer
    }

    #[test]
    fn pick_matches_linear_scan() {
        let areas = [0.5, 1.25, 0.25, 3.0, 0.75];
        let buffer = table(&areas);
        let lights = LightsView::new(&buffer);

        let total: f32 = areas.iter().sum();

        assert_eq!(total, lights.total_area());

        for i in 0..1000 {
            let xi = i as f32 / 1000.0;
            let target = xi * total;

            // Reference: linear scan
            let mut expected = 0;
            let mut cumulative = 0.0;

            for (slot, area) in areas.iter().enumerate() {
                if cumulative + area > target {
                    expected = slot as u32 + 100;
                    break;
                }

                cumulative += area;
                expected = slot as u32 + 100;
            }

            assert_eq!(expected, lights.pick(xi), "xi = {xi}");
        }
    }

    #[test]
    fn barycentric_stays_inside() {
        for i in 0..100 {
            for j in 0..100 {
                let xi = vec2(i as f32 / 100.0, j as f32 / 100.0);
                let uv = LightsView::sample_barycentric(xi);

                assert!(uv.x >= 0.0);
                assert!(uv.y >= 0.0);
                assert!(uv.x + uv.y <= 1.0 + 1.0e-6);
            }
        }
    }
}
