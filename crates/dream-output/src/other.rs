// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Other Quantities
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Derived quantities saved alongside the unknowns (`other/fluid/*`).
//!
//! These are evaluated during time stepping only, so they live on the
//! time grid without its first point.

use crate::fluid_quantity::FluidQuantity;
use crate::grid::OutputGrid;
use dream_types::error::DreamResult;
use ndarray::Array2;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct OtherQuantities {
    grid: Arc<OutputGrid>,
    fluid: BTreeMap<String, FluidQuantity>,
}

impl OtherQuantities {
    /// Empty collection for a simulation on `grid`.
    pub fn new(grid: &OutputGrid) -> Self {
        OtherQuantities {
            grid: Arc::new(grid.without_initial_time()),
            fluid: BTreeMap::new(),
        }
    }

    /// Add a (nt-1) x nr fluid quantity.
    pub fn insert_fluid(&mut self, name: &str, data: Array2<f64>) -> DreamResult<()> {
        let q = FluidQuantity::new(name, data, Arc::clone(&self.grid))?;
        self.fluid.insert(name.to_string(), q);
        Ok(())
    }

    pub fn fluid(&self, name: &str) -> Option<&FluidQuantity> {
        self.fluid.get(name)
    }

    pub fn has_fluid(&self) -> bool {
        !self.fluid.is_empty()
    }

    pub fn fluid_names(&self) -> impl Iterator<Item = &str> {
        self.fluid.keys().map(String::as_str)
    }

    pub fn grid(&self) -> &OutputGrid {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_insert_checks_reduced_time_grid() {
        let grid = OutputGrid::new(array![0.0, 1.0, 2.0], array![0.5]).unwrap();
        let mut other = OtherQuantities::new(&grid);
        assert!(!other.has_fluid());
        assert!(other.insert_fluid("Ectot", array![[1.0], [2.0]]).is_ok());
        assert!(other.insert_fluid("Eceff", array![[1.0], [2.0], [3.0]]).is_err());
        assert!(other.has_fluid());
        assert_eq!(other.fluid_names().collect::<Vec<_>>(), vec!["Ectot"]);
        assert_eq!(other.fluid("Ectot").unwrap().grid().t, array![1.0, 2.0]);
    }
}
