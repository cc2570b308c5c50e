// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Plot Data
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Render-ready plot descriptions.
//!
//! The accessors produce these instead of drawing, so any plotting
//! backend (or a plain text table) can consume them.

use ndarray::Array2;
use std::fmt;

pub const RADIUS_LABEL: &str = "Radius $r/a$";
pub const TIME_LABEL: &str = "Time $t$";
pub const DEFAULT_COLORMAP: &str = "GeriMap";

/// A single curve.
#[derive(Debug, Clone, PartialEq)]
pub struct LinePlot {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub xlabel: String,
    pub ylabel: String,
}

impl LinePlot {
    /// Whitespace separated two-column table with a commented header.
    pub fn to_table(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LinePlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}\t{}", self.xlabel, self.ylabel)?;
        for (x, y) in self.x.iter().zip(&self.y) {
            writeln!(f, "{x:.6e}\t{y:.6e}")?;
        }
        Ok(())
    }
}

/// Filled contour of a quantity over (r, t).
#[derive(Debug, Clone, PartialEq)]
pub struct ContourPlot {
    /// Radial coordinates (columns of `z`).
    pub x: Vec<f64>,
    /// Time coordinates (rows of `z`).
    pub y: Vec<f64>,
    pub z: Array2<f64>,
    pub xlabel: String,
    pub ylabel: String,
    pub colorbar_label: String,
    pub colormap: &'static str,
}

impl ContourPlot {
    /// `n` evenly spaced contour levels spanning the finite data range.
    pub fn levels(&self, n: usize) -> Vec<f64> {
        let (lo, hi) = self
            .z
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if n == 0 || !lo.is_finite() {
            return Vec::new();
        }
        if n == 1 || hi == lo {
            return vec![lo];
        }
        let step = (hi - lo) / (n - 1) as f64;
        (0..n).map(|i| lo + step * i as f64).collect()
    }
}
