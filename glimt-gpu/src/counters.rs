#[cfg(target_arch = "spirv")]
use spirv_std::arch::atomic_i_add;
#[cfg(target_arch = "spirv")]
use spirv_std::memory::{Scope, Semantics};

use crate::MAX_BOUNCES;

/// Index helpers over the flat per-bounce counter buffer.
///
/// The counter buffer is the only mutable state shared between shading
/// threads: producer kernels allocate queue slots by atomically bumping the
/// destination counter, and the persistent tracers pull work by bumping the
/// retired-ray counters. The host zeroes everything except `trace[0]` at the
/// start of each batch.
pub struct Counters;

impl Counters {
    pub const COUNT: usize = 7 * MAX_BOUNCES;

    pub const fn trace(bounce: u32) -> u32 {
        bounce
    }

    pub const fn diffuse(bounce: u32) -> u32 {
        MAX_BOUNCES as u32 + bounce
    }

    pub const fn dielectric(bounce: u32) -> u32 {
        2 * MAX_BOUNCES as u32 + bounce
    }

    pub const fn glossy(bounce: u32) -> u32 {
        3 * MAX_BOUNCES as u32 + bounce
    }

    pub const fn shadow(bounce: u32) -> u32 {
        4 * MAX_BOUNCES as u32 + bounce
    }

    pub const fn rays_retired(bounce: u32) -> u32 {
        5 * MAX_BOUNCES as u32 + bounce
    }

    pub const fn rays_retired_shadow(bounce: u32) -> u32 {
        6 * MAX_BOUNCES as u32 + bounce
    }
}

/// Atomically increments given counter and returns its previous value; this
/// is how a producer claims a unique output slot and how a persistent tracer
/// claims the next pending ray.
pub fn bump(counters: &mut [u32], counter: u32) -> u32 {
    #[cfg(target_arch = "spirv")]
    unsafe {
        atomic_i_add::<
            u32,
            { Scope::Device as u32 },
            { Semantics::NONE.bits() },
        >(&mut counters[counter as usize], 1)
    }

    #[cfg(not(target_arch = "spirv"))]
    {
        let previous = counters[counter as usize];

        counters[counter as usize] = previous + 1;
        previous
    }
}

pub fn read_counter(counters: &[u32], counter: u32) -> u32 {
    unsafe { *counters.get_unchecked(counter as usize) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_does_not_alias() {
        let ids = [
            Counters::trace(0),
            Counters::trace(MAX_BOUNCES as u32 - 1),
            Counters::diffuse(0),
            Counters::dielectric(0),
            Counters::glossy(0),
            Counters::shadow(0),
            Counters::rays_retired(0),
            Counters::rays_retired_shadow(MAX_BOUNCES as u32 - 1),
        ];

        for (i, a) in ids.iter().enumerate() {
            assert!((*a as usize) < Counters::COUNT);

            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn bump_returns_previous() {
        let mut counters = [0; Counters::COUNT];

        assert_eq!(0, bump(&mut counters, Counters::diffuse(1)));
        assert_eq!(1, bump(&mut counters, Counters::diffuse(1)));
        assert_eq!(2, read_counter(&counters, Counters::diffuse(1)));
        assert_eq!(0, read_counter(&counters, Counters::diffuse(0)));
    }
}
