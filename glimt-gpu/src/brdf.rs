use core::f32::consts::PI;

use glam::{vec3, Vec2, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

/// Cutoff under which a glossy lobe is treated as delta-like: its samples
/// are not MIS-eligible and NEE alone accounts for its direct light.
pub const GLOSSY_MIS_ROUGHNESS_CUTOFF: f32 = 0.1;

/// Lambertian pdf for a direction at `cos_theta` to the normal.
pub fn diffuse_pdf(cos_theta: f32) -> f32 {
    cos_theta.max(0.0) / PI
}

/// Schlick's approximation with a scalar reflectance at normal incidence.
pub fn schlick(f0: f32, cos_theta: f32) -> f32 {
    let c = (1.0 - cos_theta).clamp(0.0, 1.0);

    f0 + (1.0 - f0) * c * c * c * c * c
}

/// Fresnel reflectance of a dielectric boundary, Schlick form; `cos_theta`
/// is against the facing normal on the incident side.
pub fn fresnel_dielectric(eta_1: f32, eta_2: f32, cos_theta: f32) -> f32 {
    let f0 = ((eta_1 - eta_2) / (eta_1 + eta_2)).powi(2);

    schlick(f0, cos_theta)
}

/// GGX normal distribution.
pub fn ggx_d(alpha: f32, n_dot_m: f32) -> f32 {
    let a2 = alpha * alpha;
    let d = n_dot_m * n_dot_m * (a2 - 1.0) + 1.0;

    a2 / (PI * d * d)
}

/// Smith's shadowing-masking for GGX, separable form (Walter 2007).
pub fn ggx_g(alpha: f32, n_dot_i: f32, n_dot_o: f32) -> f32 {
    fn g1(alpha: f32, n_dot_v: f32) -> f32 {
        let a2 = alpha * alpha;
        let n2 = n_dot_v * n_dot_v;

        2.0 * n_dot_v / (n_dot_v + (a2 + (1.0 - a2) * n2).sqrt())
    }

    g1(alpha, n_dot_i.abs()) * g1(alpha, n_dot_o.abs())
}

/// Samples a microfacet normal from the GGX distribution in spherical
/// coordinates (Walter 2007); returned in the local frame where the normal
/// is `+z`.
pub fn ggx_sample_microfacet(alpha: f32, xi: Vec2) -> Vec3 {
    let tan2_theta = alpha * alpha * xi.x / (1.0 - xi.x).max(1.0e-8);
    let cos_theta = 1.0 / (1.0 + tan2_theta).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = 2.0 * PI * xi.y;

    vec3(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Pdf of a direction obtained by reflecting across a GGX-sampled microfacet.
pub fn ggx_pdf(alpha: f32, n_dot_m: f32, i_dot_m: f32) -> f32 {
    if i_dot_m <= 0.0 {
        return 0.0;
    }

    ggx_d(alpha, n_dot_m) * n_dot_m / (4.0 * i_dot_m)
}

/// Weight carried into the throughput when continuing along a GGX sample:
/// `|i.m| * G / (|i.n| * |m.n|)` (Fresnel applied by the caller, since the
/// dielectric and glossy paths tint it differently).
pub fn ggx_sample_weight(
    alpha: f32,
    i_dot_m: f32,
    n_dot_i: f32,
    n_dot_o: f32,
    n_dot_m: f32,
) -> f32 {
    let denominator = (n_dot_i * n_dot_m).abs().max(1.0e-6);

    (i_dot_m.abs() * ggx_g(alpha, n_dot_i, n_dot_o) / denominator).max(0.0)
}

/// Widens the roughness near grazing incidence to keep sample weights
/// bounded (Walter 2007).
pub fn ggx_widen_alpha(alpha: f32, i_dot_n: f32) -> f32 {
    (1.2 - 0.2 * i_dot_n.abs().sqrt()) * alpha
}

/// Balance-heuristic MIS weight for the estimator whose pdf is `pdf_a`.
pub fn mis_balance(pdf_a: f32, pdf_b: f32) -> f32 {
    let sum = pdf_a + pdf_b;

    if sum <= 0.0 {
        0.0
    } else {
        pdf_a / sum
    }
}

/// An orthonormal basis around `n`; `n` maps to the local `+z`.
pub fn orthonormal_basis(n: Vec3) -> (Vec3, Vec3) {
    let t = if n.x.abs() > 0.9 {
        vec3(0.0, 1.0, 0.0)
    } else {
        vec3(1.0, 0.0, 0.0)
    };

    let b = n.cross(t).normalize();
    let t = b.cross(n);

    (t, b)
}

pub fn to_world(t: Vec3, b: Vec3, n: Vec3, v: Vec3) -> Vec3 {
    v.x * t + v.y * b + v.z * n
}

/// Solid-angle pdf of next-event estimation having sampled a point at
/// `distance` on a light seen under `cos_light`, with lights picked
/// area-proportionally over `total_area`.
pub fn light_pdf(distance: f32, cos_light: f32, total_area: f32) -> f32 {
    if cos_light <= 0.0 || total_area <= 0.0 {
        0.0
    } else {
        distance * distance / (cos_light * total_area)
    }
}

/// Survival probability for Russian roulette; zero throughput must kill the
/// path outright.
pub fn russian_roulette_probability(throughput: Vec3, tint: Vec3) -> f32 {
    (throughput * tint).max_element().clamp(0.0, 1.0)
}

/// Refracts `incident` (pointing at the surface) through the facing normal;
/// `k` must be the precomputed `1 - eta^2 (1 - cos^2)`, non-negative.
pub fn refract(incident: Vec3, normal: Vec3, eta: f32, k: f32) -> Vec3 {
    eta * incident - (eta * incident.dot(normal) + k.max(0.0).sqrt()) * normal
}

/// `1 - eta^2 (1 - cos^2 theta)`; negative means total internal reflection,
/// and zero is treated as TIR too, keeping the refracted direction finite.
pub fn refraction_k(eta: f32, cos_theta: f32) -> f32 {
    1.0 - eta * eta * (1.0 - cos_theta * cos_theta)
}

/// Lambert-Beer attenuation over `distance` inside an absorbing medium.
pub fn beer_lambert(absorption: Vec3, distance: f32) -> Vec3 {
    vec3(
        (-absorption.x * distance).exp(),
        (-absorption.y * distance).exp(),
        (-absorption.z * distance).exp(),
    )
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::vec2;

    use super::*;
    use crate::Vec3Ext;

    #[test]
    fn schlick_bounds() {
        assert_relative_eq!(schlick(0.04, 1.0), 0.04);
        assert_relative_eq!(schlick(0.04, 0.0), 1.0);

        for i in 0..=10 {
            let f = schlick(0.04, i as f32 / 10.0);

            assert!(f >= 0.04 && f <= 1.0);
        }
    }

    #[test]
    fn ggx_microfacet_is_unit_and_upper_hemisphere() {
        for i in 0..32 {
            for j in 0..32 {
                let xi = vec2(i as f32 / 32.0, j as f32 / 32.0);
                let m = ggx_sample_microfacet(0.3, xi);

                assert!((m.length() - 1.0).abs() < 1.0e-4);
                assert!(m.z >= 0.0);
            }
        }
    }

    #[test]
    fn rough_surfaces_sample_wider_lobes() {
        let xi = vec2(0.5, 0.25);

        let smooth = ggx_sample_microfacet(0.05, xi);
        let rough = ggx_sample_microfacet(0.8, xi);

        assert!(rough.z < smooth.z);
    }

    #[test]
    fn russian_roulette_kills_dead_paths() {
        assert_eq!(
            0.0,
            russian_roulette_probability(Vec3::ZERO, Vec3::ONE)
        );

        assert_eq!(
            1.0,
            russian_roulette_probability(Vec3::ONE * 4.0, Vec3::ONE)
        );
    }

    #[test]
    fn tir_boundary_produces_no_nan() {
        // Grazing transmission: k == 0 exactly
        let eta = 1.5;
        let cos_theta = (1.0 - 1.0 / (eta * eta)).sqrt();
        let k = refraction_k(eta, cos_theta);

        assert!(k.abs() < 1.0e-6);

        let refracted = refract(
            vec3(0.0, 0.0, -1.0),
            vec3(0.0, 0.0, 1.0),
            eta,
            k.max(0.0),
        );

        assert!(!refracted.x.is_nan());
        assert!(!refracted.y.is_nan());
        assert!(!refracted.z.is_nan());
    }

    #[test]
    fn beer_attenuates_monotonically() {
        let absorption = vec3(0.5, 0.25, 0.0);

        let near = beer_lambert(absorption, 1.0);
        let far = beer_lambert(absorption, 4.0);

        assert!(far.x < near.x);
        assert!(far.y < near.y);
        assert_relative_eq!(near.z, 1.0);
    }

    #[test]
    fn mis_weights_sum_to_one() {
        let a = mis_balance(0.7, 0.3);
        let b = mis_balance(0.3, 0.7);

        assert_relative_eq!(a + b, 1.0);
        assert_eq!(0.0, mis_balance(0.0, 0.0));
    }

    #[test]
    fn basis_is_orthonormal() {
        for n in [
            vec3(0.0, 1.0, 0.0),
            vec3(1.0, 0.0, 0.0),
            vec3(0.5, -0.5, 0.7).normalize(),
        ] {
            let (t, b) = orthonormal_basis(n);

            assert_relative_eq!(t.dot(b), 0.0, epsilon = 1.0e-6);
            assert_relative_eq!(t.dot(n), 0.0, epsilon = 1.0e-6);
            assert_relative_eq!(b.dot(n), 0.0, epsilon = 1.0e-6);
            assert_relative_eq!(t.length(), 1.0, epsilon = 1.0e-5);
        }
    }

    #[test]
    fn luminance_weights() {
        assert_relative_eq!(Vec3::ONE.luminance(), 1.0, epsilon = 1.0e-4);
    }
}
