// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Quadrature
// © 1998–2026 Miroslav Šotek. All rights reserved.
// ─────────────────────────────────────────────────────────────────────
//! Trapezoidal quadrature on non-uniform abscissae.

use dream_types::error::{DreamError, DreamResult};

fn check_lengths(y: &[f64], x: &[f64]) -> DreamResult<()> {
    if y.len() != x.len() {
        return Err(DreamError::Settings(format!(
            "trapezoid: y and x must have equal length ({} != {})",
            y.len(),
            x.len()
        )));
    }
    Ok(())
}

/// Running trapezoid integral of `y(x)`.
///
/// Returns `n - 1` values; element `i` is the integral from `x[0]` to
/// `x[i + 1]`. Matches `scipy.integrate.cumulative_trapezoid` without an
/// initial value.
pub fn cumulative_trapezoid(y: &[f64], x: &[f64]) -> DreamResult<Vec<f64>> {
    check_lengths(y, x)?;
    if y.len() < 2 {
        return Ok(Vec::new());
    }

    let mut out = Vec::with_capacity(y.len() - 1);
    let mut acc = 0.0;
    for i in 1..y.len() {
        acc += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
        out.push(acc);
    }
    Ok(out)
}

/// Trapezoid integral of `y(x)` over the full range.
pub fn trapezoid(y: &[f64], x: &[f64]) -> DreamResult<f64> {
    Ok(cumulative_trapezoid(y, x)?.last().copied().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::linspace;

    #[test]
    fn test_cumulative_linear_exact() {
        // Trapezoid rule is exact for linear integrands
        let x = linspace(0.0, 2.0, 11);
        let y: Vec<f64> = x.iter().map(|&v| 3.0 * v + 1.0).collect();
        let c = cumulative_trapezoid(&y, &x).unwrap();
        assert_eq!(c.len(), 10);
        // ∫0^2 (3x + 1) dx = 8
        assert!((c[9] - 8.0).abs() < 1e-12);
        // ∫0^1 (3x + 1) dx = 2.5
        assert!((c[4] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_trapezoid_quadratic_converges() {
        let x = linspace(0.0, 1.0, 2001);
        let y: Vec<f64> = x.iter().map(|&v| v * v).collect();
        let val = trapezoid(&y, &x).unwrap();
        assert!((val - 1.0 / 3.0).abs() < 1e-6, "∫x² = {val}");
    }

    #[test]
    fn test_short_input() {
        assert!(cumulative_trapezoid(&[1.0], &[0.0]).unwrap().is_empty());
        assert_eq!(trapezoid(&[], &[]).unwrap(), 0.0);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(cumulative_trapezoid(&[1.0, 2.0], &[0.0]).is_err());
    }
}
