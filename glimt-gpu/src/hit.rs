use crate::INVALID_ID;

/// Result of intersecting a ray with the scene: distance, barycentrics and
/// the hit triangle, or `INVALID_ID` for a ray that escaped to the sky.
#[derive(Copy, Clone)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug, PartialEq))]
pub struct Hit {
    pub distance: f32,
    pub u: f32,
    pub v: f32,
    pub triangle_id: u32,
}

impl Hit {
    pub fn none() -> Self {
        Self {
            distance: f32::MAX,
            u: 0.0,
            v: 0.0,
            triangle_id: INVALID_ID,
        }
    }

    pub fn is_some(&self) -> bool {
        self.triangle_id != INVALID_ID
    }

    pub fn is_none(&self) -> bool {
        !self.is_some()
    }
}

impl Default for Hit {
    fn default() -> Self {
        Self::none()
    }
}
