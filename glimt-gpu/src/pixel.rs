use glam::{uvec2, UVec2};

/// Index of the output pixel a ray belongs to, with the MIS-eligibility flag
/// packed into bit 31.
///
/// The flag records whether the previous bounce sampled a direction whose
/// light contribution could be double-counted by next-event estimation; the
/// sort stage consults it when a ray lands on an emitter.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct PixelId(u32);

const MIS_BIT: u32 = 1 << 31;

impl PixelId {
    pub fn new(idx: u32, mis_eligible: bool) -> Self {
        let flag = if mis_eligible { MIS_BIT } else { 0 };

        Self((idx & !MIS_BIT) | flag)
    }

    pub fn from_pos(pos: UVec2, pitch: u32, mis_eligible: bool) -> Self {
        Self::new(pos.x + pos.y * pitch, mis_eligible)
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn to_bits(self) -> u32 {
        self.0
    }

    pub fn idx(self) -> u32 {
        self.0 & !MIS_BIT
    }

    pub fn pos(self, pitch: u32) -> UVec2 {
        uvec2(self.idx() % pitch, self.idx() / pitch)
    }

    pub fn is_mis_eligible(self) -> bool {
        self.0 & MIS_BIT != 0
    }

    pub fn with_mis_eligible(self, mis_eligible: bool) -> Self {
        Self::new(self.idx(), mis_eligible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing() {
        let id = PixelId::new(12345, true);

        assert_eq!(12345, id.idx());
        assert!(id.is_mis_eligible());

        let id = id.with_mis_eligible(false);

        assert_eq!(12345, id.idx());
        assert!(!id.is_mis_eligible());
    }

    #[test]
    fn pos() {
        let id = PixelId::from_pos(uvec2(3, 2), 640, false);

        assert_eq!(3 + 2 * 640, id.idx());
        assert_eq!(uvec2(3, 2), id.pos(640));
    }
}
