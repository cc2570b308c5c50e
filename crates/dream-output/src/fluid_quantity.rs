// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Fluid Quantity
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Quantities that depend on time and radius only.

use crate::grid::OutputGrid;
use crate::plot::{ContourPlot, LinePlot, DEFAULT_COLORMAP, RADIUS_LABEL, TIME_LABEL};
use dream_types::error::{DreamError, DreamResult};
use ndarray::{arr0, Array2, ArrayD, Axis};
use std::fmt;
use std::sync::Arc;

/// Time index plotted by default (last time step).
pub const DEFAULT_PROFILE_TIME: isize = -1;
/// Radial index plotted by default (innermost cell).
pub const DEFAULT_PROFILE_RADIUS: isize = 0;

/// An nt x nr quantity on the simulation grid.
#[derive(Debug, Clone, PartialEq)]
pub struct FluidQuantity {
    name: String,
    data: Array2<f64>,
    pub(crate) grid: Arc<OutputGrid>,
}

impl FluidQuantity {
    pub fn new(name: &str, data: Array2<f64>, grid: Arc<OutputGrid>) -> DreamResult<Self> {
        let (nt, nr) = data.dim();
        if nt != grid.nt() || nr != grid.nr() {
            return Err(DreamError::Output(format!(
                "{name}: data of size {nt} x {nr} does not match the grid ({} x {}).",
                grid.nt(),
                grid.nr()
            )));
        }
        Ok(FluidQuantity {
            name: name.to_string(),
            data,
            grid,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn grid(&self) -> &OutputGrid {
        &self.grid
    }

    pub fn nt(&self) -> usize {
        self.data.nrows()
    }

    pub fn nr(&self) -> usize {
        self.data.ncols()
    }

    /// Data at radial index `r` and/or time index `t`.
    ///
    /// Without indices the full nt x nr data is returned, with only `r` the
    /// time evolution at that radius, with only `t` the radial profile at
    /// that time, and with both a single value. Negative indices count
    /// from the end.
    pub fn get(&self, r: Option<isize>, t: Option<isize>) -> DreamResult<ArrayD<f64>> {
        match (r, t) {
            (None, None) => Ok(self.data.clone().into_dyn()),
            (Some(r), None) => {
                let ir = resolve_index(r, self.nr(), "r")?;
                Ok(self.data.index_axis(Axis(1), ir).to_owned().into_dyn())
            }
            (None, Some(t)) => {
                let it = resolve_index(t, self.nt(), "t")?;
                Ok(self.data.index_axis(Axis(0), it).to_owned().into_dyn())
            }
            (Some(r), Some(t)) => {
                let ir = resolve_index(r, self.nr(), "r")?;
                let it = resolve_index(t, self.nt(), "t")?;
                Ok(arr0(self.data[[it, ir]]).into_dyn())
            }
        }
    }

    pub fn dumps(&self, r: Option<isize>, t: Option<isize>) -> DreamResult<String> {
        Ok(format!("{}", self.get(r, t)?))
    }

    /// Summary line followed by the full data.
    pub fn repr(&self) -> String {
        format!("{self}\n{}", self.data)
    }

    /// Axis label for this quantity.
    pub fn tex_name(&self) -> String {
        tex_name(&self.name)
    }

    pub fn contour_plot(&self) -> ContourPlot {
        ContourPlot {
            x: self.grid.r.to_vec(),
            y: self.grid.t.to_vec(),
            z: self.data.clone(),
            xlabel: RADIUS_LABEL.to_string(),
            ylabel: TIME_LABEL.to_string(),
            colorbar_label: self.tex_name(),
            colormap: DEFAULT_COLORMAP,
        }
    }

    /// Radial profile at time index `t`.
    pub fn radial_profile_plot(&self, t: isize) -> DreamResult<LinePlot> {
        let it = resolve_index(t, self.nt(), "t")?;
        Ok(LinePlot {
            x: self.grid.r.to_vec(),
            y: self.data.row(it).to_vec(),
            xlabel: RADIUS_LABEL.to_string(),
            ylabel: self.tex_name(),
        })
    }

    /// Time evolution at radial index `r`.
    pub fn time_profile_plot(&self, r: isize) -> DreamResult<LinePlot> {
        let ir = resolve_index(r, self.nr(), "r")?;
        Ok(LinePlot {
            x: self.grid.t.to_vec(),
            y: self.data.column(ir).to_vec(),
            xlabel: TIME_LABEL.to_string(),
            ylabel: self.tex_name(),
        })
    }
}

impl fmt::Display for FluidQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}) Fluid quantity of size NT x NR = {} x {}",
            self.name,
            self.nt(),
            self.nr()
        )
    }
}

/// Map a possibly negative index onto `0..len`.
pub(crate) fn resolve_index(index: isize, len: usize, axis: &str) -> DreamResult<usize> {
    let resolved = if index < 0 {
        len as isize + index
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= len {
        return Err(DreamError::Output(format!(
            "Index {index} out of range for axis '{axis}' of length {len}."
        )));
    }
    Ok(resolved as usize)
}

fn tex_name(name: &str) -> String {
    let tex = match name {
        "E_field" => r"$E_\parallel$",
        "n_re" => r"$n_{\rm re}$",
        "n_cold" => r"$n_{\rm cold}$",
        "n_hot" => r"$n_{\rm hot}$",
        "n_tot" => r"$n_{\rm tot}$",
        "T_cold" => r"$T_{\rm cold}$",
        "j_ohm" => r"$j_\Omega$",
        "j_tot" => r"$j_{\rm tot}$",
        "j_hot" => r"$j_{\rm hot}$",
        "j_re" => r"$j_{\rm re}$",
        "Eceff" => r"$E_{c,\rm eff}$",
        "Ecfree" => r"$E_{c,\rm free}$",
        "Ectot" => r"$E_{c,\rm tot}$",
        "EDreic" => r"$E_D$",
        _ => return name.to_string(),
    };
    tex.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn quantity() -> FluidQuantity {
        let grid = Arc::new(
            OutputGrid::new(array![0.0, 1.0, 2.0], array![0.1, 0.5]).unwrap(),
        );
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        FluidQuantity::new("n_re", data, grid).unwrap()
    }

    #[test]
    fn test_display() {
        assert_eq!(
            quantity().to_string(),
            "(n_re) Fluid quantity of size NT x NR = 3 x 2"
        );
        assert!(quantity().repr().starts_with("(n_re)"));
    }

    #[test]
    fn test_get_variants() {
        let q = quantity();
        assert_eq!(q.get(None, None).unwrap().shape(), &[3, 2]);
        assert_eq!(q.get(Some(1), None).unwrap().into_raw_vec(), vec![2.0, 4.0, 6.0]);
        assert_eq!(q.get(None, Some(-1)).unwrap().into_raw_vec(), vec![5.0, 6.0]);
        let v = q.get(Some(0), Some(1)).unwrap();
        assert_eq!(v.ndim(), 0);
        assert_eq!(v.into_raw_vec(), vec![3.0]);
    }

    #[test]
    fn test_out_of_range() {
        let q = quantity();
        assert!(q.get(Some(2), None).is_err());
        assert!(q.get(None, Some(-4)).is_err());
        assert!(q.radial_profile_plot(3).is_err());
    }

    #[test]
    fn test_shape_mismatch() {
        let grid = Arc::new(OutputGrid::new(array![0.0], array![0.1, 0.5]).unwrap());
        assert!(FluidQuantity::new("x", Array2::zeros((2, 2)), grid).is_err());
    }

    #[test]
    fn test_profile_plots() {
        let q = quantity();
        let p = q.radial_profile_plot(DEFAULT_PROFILE_TIME).unwrap();
        assert_eq!(p.x, vec![0.1, 0.5]);
        assert_eq!(p.y, vec![5.0, 6.0]);
        assert_eq!(p.xlabel, RADIUS_LABEL);
        assert_eq!(p.ylabel, r"$n_{\rm re}$");

        let p = q.time_profile_plot(DEFAULT_PROFILE_RADIUS).unwrap();
        assert_eq!(p.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(p.y, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_contour_plot() {
        let c = quantity().contour_plot();
        assert_eq!(c.z.dim(), (3, 2));
        assert_eq!(c.y.len(), 3);
        assert_eq!(c.colormap, DEFAULT_COLORMAP);
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(-1, 4, "t").unwrap(), 3);
        assert_eq!(resolve_index(0, 4, "t").unwrap(), 0);
        assert!(resolve_index(4, 4, "t").is_err());
        assert!(resolve_index(0, 0, "t").is_err());
    }
}
