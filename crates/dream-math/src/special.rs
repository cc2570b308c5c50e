// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Special Functions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Modified Bessel functions of order zero, I0(x) and K0(x).
//!
//! Uses Abramowitz & Stegun polynomial approximations (Handbook of
//! Mathematical Functions, 9.8.1, 9.8.2, 9.8.5 and 9.8.6). K0 matches
//! `scipy.special.kn(0, x)`.

/// Modified Bessel function of the first kind, order zero.
///
/// Accuracy: |error| < 1.6e-7 for |x| <= 3.75, relative error below
/// 5e-7 above.
pub fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax <= 3.75 {
        // A&S 9.8.1
        let t2 = (ax / 3.75).powi(2);
        1.0 + t2
            * (3.515_622_9
                + t2 * (3.089_942_4
                    + t2 * (1.206_749_2
                        + t2 * (0.265_973_2 + t2 * (0.036_076_8 + t2 * 0.004_581_3)))))
    } else {
        // A&S 9.8.2
        let u = 3.75 / ax;
        let poly = 0.398_942_28
            + u * (0.013_285_92
                + u * (0.002_253_19
                    + u * (-0.001_575_65
                        + u * (0.009_162_81
                            + u * (-0.020_577_06
                                + u * (0.026_355_37 + u * (-0.016_476_33 + u * 0.003_923_77)))))));
        poly * ax.exp() / ax.sqrt()
    }
}

/// Modified Bessel function of the second kind, order zero.
///
/// Diverges logarithmically at the origin; returns `+inf` for x <= 0.
///
/// Accuracy: |error| < 2e-7 relative for x > 0.
pub fn bessel_k0(x: f64) -> f64 {
    if x <= 0.0 {
        return f64::INFINITY;
    }
    if x <= 2.0 {
        // A&S 9.8.5
        let h2 = (0.5 * x).powi(2);
        let poly = -0.577_215_66
            + h2 * (0.422_784_20
                + h2 * (0.230_697_56
                    + h2 * (0.034_885_90
                        + h2 * (0.002_626_98 + h2 * (0.000_107_50 + h2 * 0.000_007_40)))));
        -(0.5 * x).ln() * bessel_i0(x) + poly
    } else {
        // A&S 9.8.6
        let u = 2.0 / x;
        let poly = 1.253_314_14
            + u * (-0.078_323_58
                + u * (0.021_895_68
                    + u * (-0.010_624_46
                        + u * (0.005_878_72 + u * (-0.002_515_40 + u * 0.000_532_08)))));
        poly * (-x).exp() / x.sqrt()
    }
}
