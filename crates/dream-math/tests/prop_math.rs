// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Property-Based Tests (proptest) for dream-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for dream-math using proptest.
//!
//! Covers: linspace spacing, linear interpolation bounds,
//! cumulative trapezoid monotonicity, Bessel function identities.

use dream_math::interp::{interp, linspace};
use dream_math::quadrature::{cumulative_trapezoid, trapezoid};
use dream_math::special::{bessel_i0, bessel_k0};
use proptest::prelude::*;

// ── Linspace / Interp Properties ─────────────────────────────────────

proptest! {
    /// linspace is uniform and hits both endpoints.
    #[test]
    fn linspace_uniform(start in -10.0f64..10.0, width in 0.1f64..20.0, n in 2usize..200) {
        let end = start + width;
        let v = linspace(start, end, n);
        prop_assert_eq!(v.len(), n);
        prop_assert!((v[0] - start).abs() < 1e-12);
        prop_assert!((v[n - 1] - end).abs() < 1e-9);
        let dx = width / (n - 1) as f64;
        for i in 1..n {
            prop_assert!((v[i] - v[i - 1] - dx).abs() < 1e-9,
                "Non-uniform spacing at {}", i);
        }
    }

    /// Interpolated values stay inside the range of the table.
    #[test]
    fn interp_within_bounds(x in -5.0f64..15.0, n in 2usize..50) {
        let xp = linspace(0.0, 10.0, n);
        let fp: Vec<f64> = xp.iter().map(|v| (v * 0.7).sin()).collect();
        let lo = fp.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = fp.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let y = interp(x, &xp, &fp);
        prop_assert!(y >= lo - 1e-12 && y <= hi + 1e-12,
            "interp({}) = {} outside [{}, {}]", x, y, lo, hi);
    }

    /// Interpolating a line reproduces it exactly inside the table.
    #[test]
    fn interp_reproduces_lines(a in -3.0f64..3.0, b in -3.0f64..3.0, x in 0.0f64..1.0) {
        let xp = linspace(0.0, 1.0, 17);
        let fp: Vec<f64> = xp.iter().map(|v| a * v + b).collect();
        prop_assert!((interp(x, &xp, &fp) - (a * x + b)).abs() < 1e-12);
    }
}

// ── Quadrature Properties ────────────────────────────────────────────

proptest! {
    /// Running integral of a non-negative integrand never decreases.
    #[test]
    fn cumulative_trapezoid_monotone(n in 2usize..300, scale in 0.1f64..10.0) {
        let x = linspace(0.0, scale, n);
        let y: Vec<f64> = x.iter().map(|v| v.exp() * (1.0 + v.cos())).collect();
        let c = cumulative_trapezoid(&y, &x).unwrap();
        prop_assert_eq!(c.len(), n - 1);
        for i in 1..c.len() {
            prop_assert!(c[i] >= c[i - 1]);
        }
    }

    /// The last running value equals the total integral.
    #[test]
    fn cumulative_matches_total(n in 2usize..100) {
        let x = linspace(-1.0, 2.0, n);
        let y: Vec<f64> = x.iter().map(|v| v * v + 1.0).collect();
        let c = cumulative_trapezoid(&y, &x).unwrap();
        let total = trapezoid(&y, &x).unwrap();
        prop_assert!((c[c.len() - 1] - total).abs() < 1e-12);
    }
}

// ── Bessel Function Properties ───────────────────────────────────────

proptest! {
    /// I0 >= 1 and K0 > 0 for positive arguments.
    #[test]
    fn bessel_positivity(x in 1e-6f64..50.0) {
        prop_assert!(bessel_i0(x) >= 1.0);
        prop_assert!(bessel_k0(x) > 0.0);
    }

    /// K0 is strictly decreasing.
    #[test]
    fn bessel_k0_decreasing(x in 1e-4f64..30.0, dx in 1e-2f64..1.0) {
        prop_assert!(bessel_k0(x + dx) < bessel_k0(x),
            "K0 not decreasing between {} and {}", x, x + dx);
    }

    /// Wronskian-type bound: I0(x) K0(x) approaches 1/(2x) for large x.
    #[test]
    fn bessel_product_asymptotic(x in 20.0f64..200.0) {
        let product = bessel_i0(x) * bessel_k0(x);
        let asymptotic = 1.0 / (2.0 * x);
        prop_assert!(((product - asymptotic) / asymptotic).abs() < 0.01);
    }
}

/// ∫0^∞ x K0(x) dx = 1, the normalization behind the Parks shard-size
/// distribution.
#[test]
fn k0_first_moment_is_unity() {
    let x = linspace(1e-10, 30.0, 20_000);
    let y: Vec<f64> = x.iter().map(|&v| v * bessel_k0(v)).collect();
    let moment = trapezoid(&y, &x).unwrap();
    assert!((moment - 1.0).abs() < 1e-4, "∫x K0 = {moment}");
}
