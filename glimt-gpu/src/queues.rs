use glam::{vec3, Vec3};

use crate::{Hit, PixelId, RayCone};

/// An extension ray pending intersection; lives in the trace queue for
/// exactly one bounce.
#[derive(Copy, Clone)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct TraceRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub pixel: PixelId,
    pub throughput: Vec3,
    pub last_pdf: f32,
    pub cone: RayCone,
}

/// A classified hit pending shading; what the sort stage hands to a material
/// kernel. The hit point is reconstructed from the triangle's anchor+edges
/// form, so no origin needs to be carried.
#[derive(Copy, Clone)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct MaterialRay {
    pub direction: Vec3,
    pub hit: Hit,
    pub pixel: PixelId,
    pub throughput: Vec3,
    pub cone: RayCone,
}

/// A shadow ray staged by next-event estimation, carrying the unclamped
/// radiance to deposit if the any-hit test comes back clean.
#[derive(Copy, Clone)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct ShadowRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub max_distance: f32,
    pub pixel_idx: u32,
    pub radiance: Vec3,
}

/// SoA view over the trace queue: one `u32` lane region per field, each of
/// length `capacity`, so the tracer's coalesced loads touch only the fields
/// it needs.
pub struct TraceQueueView<'a> {
    buffer: &'a mut [u32],
    capacity: u32,
}

impl<'a> TraceQueueView<'a> {
    pub const LANES: usize = 17;

    const ORIGIN_X: u32 = 0;
    const ORIGIN_Y: u32 = 1;
    const ORIGIN_Z: u32 = 2;
    const DIR_X: u32 = 3;
    const DIR_Y: u32 = 4;
    const DIR_Z: u32 = 5;
    const HIT_T: u32 = 6;
    const HIT_U: u32 = 7;
    const HIT_V: u32 = 8;
    const HIT_ID: u32 = 9;
    const PIXEL: u32 = 10;
    const THROUGHPUT_X: u32 = 11;
    const THROUGHPUT_Y: u32 = 12;
    const THROUGHPUT_Z: u32 = 13;
    const LAST_PDF: u32 = 14;
    const CONE_ANGLE: u32 = 15;
    const CONE_WIDTH: u32 = 16;

    pub fn new(buffer: &'a mut [u32], capacity: u32) -> Self {
        Self { buffer, capacity }
    }

    fn get_f32(&self, lane: u32, idx: u32) -> f32 {
        f32::from_bits(unsafe {
            *self.buffer.get_unchecked((lane * self.capacity + idx) as usize)
        })
    }

    fn set_f32(&mut self, lane: u32, idx: u32, value: f32) {
        unsafe {
            *self
                .buffer
                .get_unchecked_mut((lane * self.capacity + idx) as usize) =
                value.to_bits();
        }
    }

    fn get_u32(&self, lane: u32, idx: u32) -> u32 {
        unsafe {
            *self.buffer.get_unchecked((lane * self.capacity + idx) as usize)
        }
    }

    fn set_u32(&mut self, lane: u32, idx: u32, value: u32) {
        unsafe {
            *self
                .buffer
                .get_unchecked_mut((lane * self.capacity + idx) as usize) =
                value;
        }
    }

    pub fn write(&mut self, idx: u32, ray: TraceRay) {
        self.set_f32(Self::ORIGIN_X, idx, ray.origin.x);
        self.set_f32(Self::ORIGIN_Y, idx, ray.origin.y);
        self.set_f32(Self::ORIGIN_Z, idx, ray.origin.z);
        self.set_f32(Self::DIR_X, idx, ray.direction.x);
        self.set_f32(Self::DIR_Y, idx, ray.direction.y);
        self.set_f32(Self::DIR_Z, idx, ray.direction.z);
        self.set_u32(Self::PIXEL, idx, ray.pixel.to_bits());
        self.set_f32(Self::THROUGHPUT_X, idx, ray.throughput.x);
        self.set_f32(Self::THROUGHPUT_Y, idx, ray.throughput.y);
        self.set_f32(Self::THROUGHPUT_Z, idx, ray.throughput.z);
        self.set_f32(Self::LAST_PDF, idx, ray.last_pdf);
        self.set_f32(Self::CONE_ANGLE, idx, ray.cone.angle);
        self.set_f32(Self::CONE_WIDTH, idx, ray.cone.width);
    }

    /// Reads a ray back; throughput is known to be unit for bounces 0 and 1
    /// (bounce-0 color weights go into the albedo buffer instead), so it is
    /// only fetched from memory from bounce 2 on.
    pub fn read(&self, idx: u32, bounce: u32) -> TraceRay {
        let throughput = if bounce >= 2 {
            vec3(
                self.get_f32(Self::THROUGHPUT_X, idx),
                self.get_f32(Self::THROUGHPUT_Y, idx),
                self.get_f32(Self::THROUGHPUT_Z, idx),
            )
        } else {
            Vec3::ONE
        };

        TraceRay {
            origin: vec3(
                self.get_f32(Self::ORIGIN_X, idx),
                self.get_f32(Self::ORIGIN_Y, idx),
                self.get_f32(Self::ORIGIN_Z, idx),
            ),
            direction: vec3(
                self.get_f32(Self::DIR_X, idx),
                self.get_f32(Self::DIR_Y, idx),
                self.get_f32(Self::DIR_Z, idx),
            ),
            pixel: PixelId::from_bits(self.get_u32(Self::PIXEL, idx)),
            throughput,
            last_pdf: self.get_f32(Self::LAST_PDF, idx),
            cone: RayCone {
                angle: self.get_f32(Self::CONE_ANGLE, idx),
                width: self.get_f32(Self::CONE_WIDTH, idx),
            },
        }
    }

    pub fn write_hit(&mut self, idx: u32, hit: Hit) {
        self.set_f32(Self::HIT_T, idx, hit.distance);
        self.set_f32(Self::HIT_U, idx, hit.u);
        self.set_f32(Self::HIT_V, idx, hit.v);
        self.set_u32(Self::HIT_ID, idx, hit.triangle_id);
    }

    pub fn read_hit(&self, idx: u32) -> Hit {
        Hit {
            distance: self.get_f32(Self::HIT_T, idx),
            u: self.get_f32(Self::HIT_U, idx),
            v: self.get_f32(Self::HIT_V, idx),
            triangle_id: self.get_u32(Self::HIT_ID, idx),
        }
    }

    pub fn read_for_trace(&self, idx: u32) -> (Vec3, Vec3) {
        (
            vec3(
                self.get_f32(Self::ORIGIN_X, idx),
                self.get_f32(Self::ORIGIN_Y, idx),
                self.get_f32(Self::ORIGIN_Z, idx),
            ),
            vec3(
                self.get_f32(Self::DIR_X, idx),
                self.get_f32(Self::DIR_Y, idx),
                self.get_f32(Self::DIR_Z, idx),
            ),
        )
    }
}

/// SoA view over a material queue.
///
/// The dielectric and glossy queues share one of these: dielectric records
/// grow from index 0 upward and glossy records from `capacity - 1` downward
/// (see [`Self::back_idx()`]); the sort stage guarantees the two ends never
/// collide because their combined count is bounded by the batch size.
pub struct MaterialQueueView<'a> {
    buffer: &'a mut [u32],
    capacity: u32,
}

impl<'a> MaterialQueueView<'a> {
    pub const LANES: usize = 13;

    const DIR_X: u32 = 0;
    const DIR_Y: u32 = 1;
    const DIR_Z: u32 = 2;
    const HIT_T: u32 = 3;
    const HIT_U: u32 = 4;
    const HIT_V: u32 = 5;
    const HIT_ID: u32 = 6;
    const PIXEL: u32 = 7;
    const THROUGHPUT_X: u32 = 8;
    const THROUGHPUT_Y: u32 = 9;
    const THROUGHPUT_Z: u32 = 10;
    const CONE_ANGLE: u32 = 11;
    const CONE_WIDTH: u32 = 12;

    pub fn new(buffer: &'a mut [u32], capacity: u32) -> Self {
        Self { buffer, capacity }
    }

    /// Index the `n`-th record written from the back of the queue lands at.
    pub fn back_idx(&self, slot: u32) -> u32 {
        self.capacity - 1 - slot
    }

    fn get_f32(&self, lane: u32, idx: u32) -> f32 {
        f32::from_bits(unsafe {
            *self.buffer.get_unchecked((lane * self.capacity + idx) as usize)
        })
    }

    fn set_f32(&mut self, lane: u32, idx: u32, value: f32) {
        unsafe {
            *self
                .buffer
                .get_unchecked_mut((lane * self.capacity + idx) as usize) =
                value.to_bits();
        }
    }

    fn get_u32(&self, lane: u32, idx: u32) -> u32 {
        unsafe {
            *self.buffer.get_unchecked((lane * self.capacity + idx) as usize)
        }
    }

    fn set_u32(&mut self, lane: u32, idx: u32, value: u32) {
        unsafe {
            *self
                .buffer
                .get_unchecked_mut((lane * self.capacity + idx) as usize) =
                value;
        }
    }

    pub fn write(&mut self, idx: u32, ray: MaterialRay) {
        self.set_f32(Self::DIR_X, idx, ray.direction.x);
        self.set_f32(Self::DIR_Y, idx, ray.direction.y);
        self.set_f32(Self::DIR_Z, idx, ray.direction.z);
        self.set_f32(Self::HIT_T, idx, ray.hit.distance);
        self.set_f32(Self::HIT_U, idx, ray.hit.u);
        self.set_f32(Self::HIT_V, idx, ray.hit.v);
        self.set_u32(Self::HIT_ID, idx, ray.hit.triangle_id);
        self.set_u32(Self::PIXEL, idx, ray.pixel.to_bits());
        self.set_f32(Self::THROUGHPUT_X, idx, ray.throughput.x);
        self.set_f32(Self::THROUGHPUT_Y, idx, ray.throughput.y);
        self.set_f32(Self::THROUGHPUT_Z, idx, ray.throughput.z);
        self.set_f32(Self::CONE_ANGLE, idx, ray.cone.angle);
        self.set_f32(Self::CONE_WIDTH, idx, ray.cone.width);
    }

    /// Material records always carry their stored throughput; unlike
    /// extension rays it may already be scaled by Russian roulette.
    pub fn read(&self, idx: u32) -> MaterialRay {
        let throughput = vec3(
            self.get_f32(Self::THROUGHPUT_X, idx),
            self.get_f32(Self::THROUGHPUT_Y, idx),
            self.get_f32(Self::THROUGHPUT_Z, idx),
        );

        MaterialRay {
            direction: vec3(
                self.get_f32(Self::DIR_X, idx),
                self.get_f32(Self::DIR_Y, idx),
                self.get_f32(Self::DIR_Z, idx),
            ),
            hit: Hit {
                distance: self.get_f32(Self::HIT_T, idx),
                u: self.get_f32(Self::HIT_U, idx),
                v: self.get_f32(Self::HIT_V, idx),
                triangle_id: self.get_u32(Self::HIT_ID, idx),
            },
            pixel: PixelId::from_bits(self.get_u32(Self::PIXEL, idx)),
            throughput,
            cone: RayCone {
                angle: self.get_f32(Self::CONE_ANGLE, idx),
                width: self.get_f32(Self::CONE_WIDTH, idx),
            },
        }
    }
}

/// SoA view over the shadow queue.
pub struct ShadowQueueView<'a> {
    buffer: &'a mut [u32],
    capacity: u32,
}

impl<'a> ShadowQueueView<'a> {
    pub const LANES: usize = 11;

    const ORIGIN_X: u32 = 0;
    const ORIGIN_Y: u32 = 1;
    const ORIGIN_Z: u32 = 2;
    const DIR_X: u32 = 3;
    const DIR_Y: u32 = 4;
    const DIR_Z: u32 = 5;
    const MAX_DISTANCE: u32 = 6;
    const PIXEL: u32 = 7;
    const RADIANCE_X: u32 = 8;
    const RADIANCE_Y: u32 = 9;
    const RADIANCE_Z: u32 = 10;

    pub fn new(buffer: &'a mut [u32], capacity: u32) -> Self {
        Self { buffer, capacity }
    }

    fn get_f32(&self, lane: u32, idx: u32) -> f32 {
        f32::from_bits(unsafe {
            *self.buffer.get_unchecked((lane * self.capacity + idx) as usize)
        })
    }

    fn set_f32(&mut self, lane: u32, idx: u32, value: f32) {
        unsafe {
            *self
                .buffer
                .get_unchecked_mut((lane * self.capacity + idx) as usize) =
                value.to_bits();
        }
    }

    pub fn write(&mut self, idx: u32, ray: ShadowRay) {
        self.set_f32(Self::ORIGIN_X, idx, ray.origin.x);
        self.set_f32(Self::ORIGIN_Y, idx, ray.origin.y);
        self.set_f32(Self::ORIGIN_Z, idx, ray.origin.z);
        self.set_f32(Self::DIR_X, idx, ray.direction.x);
        self.set_f32(Self::DIR_Y, idx, ray.direction.y);
        self.set_f32(Self::DIR_Z, idx, ray.direction.z);
        self.set_f32(Self::MAX_DISTANCE, idx, ray.max_distance);
        self.set_f32(Self::PIXEL, idx, f32::from_bits(ray.pixel_idx));
        self.set_f32(Self::RADIANCE_X, idx, ray.radiance.x);
        self.set_f32(Self::RADIANCE_Y, idx, ray.radiance.y);
        self.set_f32(Self::RADIANCE_Z, idx, ray.radiance.z);
    }

    pub fn read(&self, idx: u32) -> ShadowRay {
        ShadowRay {
            origin: vec3(
                self.get_f32(Self::ORIGIN_X, idx),
                self.get_f32(Self::ORIGIN_Y, idx),
                self.get_f32(Self::ORIGIN_Z, idx),
            ),
            direction: vec3(
                self.get_f32(Self::DIR_X, idx),
                self.get_f32(Self::DIR_Y, idx),
                self.get_f32(Self::DIR_Z, idx),
            ),
            max_distance: self.get_f32(Self::MAX_DISTANCE, idx),
            pixel_idx: self.get_f32(Self::PIXEL, idx).to_bits(),
            radiance: vec3(
                self.get_f32(Self::RADIANCE_X, idx),
                self.get_f32(Self::RADIANCE_Y, idx),
                self.get_f32(Self::RADIANCE_Z, idx),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec;

    use glam::vec3;

    use super::*;

    #[test]
    fn trace_round_trip() {
        let mut buffer = vec![0; TraceQueueView::LANES * 8];
        let mut queue = TraceQueueView::new(&mut buffer, 8);

        queue.write(
            3,
            TraceRay {
                origin: vec3(1.0, 2.0, 3.0),
                direction: vec3(0.0, 0.0, 1.0),
                pixel: PixelId::new(77, true),
                throughput: vec3(0.5, 0.25, 0.125),
                last_pdf: 0.31,
                cone: RayCone {
                    angle: 0.001,
                    width: 0.2,
                },
            },
        );

        queue.write_hit(
            3,
            Hit {
                distance: 4.5,
                u: 0.25,
                v: 0.5,
                triangle_id: 9,
            },
        );

        let ray = queue.read(3, 2);

        assert_eq!(vec3(1.0, 2.0, 3.0), ray.origin);
        assert_eq!(77, ray.pixel.idx());
        assert!(ray.pixel.is_mis_eligible());
        assert_eq!(vec3(0.5, 0.25, 0.125), ray.throughput);
        assert_eq!(0.31, ray.last_pdf);

        let hit = queue.read_hit(3);

        assert_eq!(4.5, hit.distance);
        assert_eq!(9, hit.triangle_id);
        assert!(hit.is_some());
    }

    #[test]
    fn throughput_is_unit_below_bounce_two() {
        let mut buffer = vec![0; TraceQueueView::LANES * 4];
        let mut queue = TraceQueueView::new(&mut buffer, 4);

        queue.write(
            0,
            TraceRay {
                origin: Vec3::ZERO,
                direction: vec3(0.0, 0.0, 1.0),
                pixel: PixelId::new(0, false),
                throughput: vec3(0.5, 0.5, 0.5),
                last_pdf: 0.0,
                cone: RayCone::default(),
            },
        );

        assert_eq!(Vec3::ONE, queue.read(0, 0).throughput);
        assert_eq!(Vec3::ONE, queue.read(0, 1).throughput);
        assert_eq!(Vec3::splat(0.5), queue.read(0, 2).throughput);
    }

    #[test]
    fn shared_queue_ends_do_not_collide() {
        let capacity = 16;

        let mut buffer = vec![0; MaterialQueueView::LANES * capacity];
        let mut queue = MaterialQueueView::new(&mut buffer, capacity as u32);

        let ray = |pixel| MaterialRay {
            direction: vec3(0.0, 0.0, 1.0),
            hit: Hit {
                distance: 1.0,
                u: 0.0,
                v: 0.0,
                triangle_id: 0,
            },
            pixel: PixelId::new(pixel, false),
            throughput: Vec3::ONE,
            cone: RayCone::default(),
        };

        // 10 dielectric rays from the front, 6 glossy rays from the back
        for slot in 0..10 {
            queue.write(slot, ray(slot));
        }

        for slot in 0..6 {
            let idx = queue.back_idx(slot);

            queue.write(idx, ray(1000 + slot));
        }

        for slot in 0..10 {
            assert_eq!(slot, queue.read(slot).pixel.idx());
        }

        for slot in 0..6 {
            let idx = queue.back_idx(slot);

            assert_eq!(1000 + slot, queue.read(idx).pixel.idx());
        }
    }

    #[test]
    fn shadow_round_trip() {
        let mut buffer = vec![0; ShadowQueueView::LANES * 4];
        let mut queue = ShadowQueueView::new(&mut buffer, 4);

        queue.write(
            1,
            ShadowRay {
                origin: vec3(1.0, 1.0, 1.0),
                direction: vec3(0.0, 1.0, 0.0),
                max_distance: 9.5,
                pixel_idx: 42,
                radiance: vec3(3.0, 2.0, 1.0),
            },
        );

        let ray = queue.read(1);

        assert_eq!(9.5, ray.max_distance);
        assert_eq!(42, ray.pixel_idx);
        assert_eq!(vec3(3.0, 2.0, 1.0), ray.radiance);
    }
}
