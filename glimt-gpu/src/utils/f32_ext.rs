#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

pub trait F32Ext {
    /// Clamps to range `[0.0, 1.0]`.
    fn saturate(self) -> Self;

    /// Replaces NaN and negative values with zero; frame-buffer writes go
    /// through this so a single bad sample can't poison the history.
    fn sanitize(self) -> Self;

    fn inverse_sqrt(self) -> Self;
}

impl F32Ext for f32 {
    fn saturate(self) -> Self {
        self.clamp(0.0, 1.0)
    }

    fn sanitize(self) -> Self {
        if self.is_nan() || self < 0.0 {
            0.0
        } else {
            self
        }
    }

    fn inverse_sqrt(self) -> Self {
        1.0 / self.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize() {
        assert_eq!(0.0, f32::NAN.sanitize());
        assert_eq!(0.0, (-1.0f32).sanitize());
        assert_eq!(2.5, 2.5f32.sanitize());
    }
}
