// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Output File
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Simulation output loaded from, or written to, an `.npz` archive.

use crate::electric_field::{ElectricField, E_FIELD};
use crate::fluid_quantity::FluidQuantity;
use crate::grid::OutputGrid;
use crate::other::OtherQuantities;
use dream_types::error::{DreamError, DreamResult};
use ndarray::{Array1, Array2, Ix1, Ix2, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const GRID_T: &str = "grid/t";
const GRID_R: &str = "grid/r";
const EQSYS_PREFIX: &str = "eqsys/";
const OTHER_FLUID_PREFIX: &str = "other/fluid/";

#[derive(Debug, Clone, PartialEq)]
pub struct DreamOutput {
    grid: Arc<OutputGrid>,
    eqsys: BTreeMap<String, FluidQuantity>,
    other: Option<OtherQuantities>,
}

impl DreamOutput {
    pub fn new(grid: OutputGrid) -> Self {
        DreamOutput {
            grid: Arc::new(grid),
            eqsys: BTreeMap::new(),
            other: None,
        }
    }

    pub fn grid(&self) -> &OutputGrid {
        &self.grid
    }

    /// Add an unknown of the equation system (nt x nr).
    pub fn add_eqsys(&mut self, name: &str, data: Array2<f64>) -> DreamResult<()> {
        let q = FluidQuantity::new(name, data, Arc::clone(&self.grid))?;
        self.eqsys.insert(name.to_string(), q);
        Ok(())
    }

    /// Add a derived fluid quantity ((nt-1) x nr).
    pub fn add_other_fluid(&mut self, name: &str, data: Array2<f64>) -> DreamResult<()> {
        let grid = &self.grid;
        self.other
            .get_or_insert_with(|| OtherQuantities::new(grid))
            .insert_fluid(name, data)
    }

    pub fn eqsys(&self, name: &str) -> DreamResult<&FluidQuantity> {
        self.eqsys.get(name).ok_or_else(|| {
            DreamError::Output(format!("No unknown quantity named '{name}' in output."))
        })
    }

    pub fn eqsys_names(&self) -> impl Iterator<Item = &str> {
        self.eqsys.keys().map(String::as_str)
    }

    pub fn other(&self) -> Option<&OtherQuantities> {
        self.other.as_ref()
    }

    pub fn e_field(&self) -> DreamResult<ElectricField<'_>> {
        Ok(ElectricField::new(self.eqsys(E_FIELD)?, self.other.as_ref()))
    }

    /// Look up `name` among the unknowns first, then the other fluid
    /// quantities.
    pub fn quantity(&self, name: &str) -> DreamResult<&FluidQuantity> {
        if let Some(q) = self.eqsys.get(name) {
            return Ok(q);
        }
        self.other
            .as_ref()
            .and_then(|o| o.fluid(name))
            .ok_or_else(|| DreamError::Output(format!("No quantity named '{name}' in output.")))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> DreamResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file).map_err(|e| {
            DreamError::Npz(format!("Failed to open output file '{}': {e}", path.display()))
        })?;

        let names: Vec<String> = npz
            .names()
            .map_err(|e| DreamError::Npz(format!("Failed to list arrays: {e}")))?
            .into_iter()
            .map(|n| n.strip_suffix(".npy").map(str::to_string).unwrap_or(n))
            .collect();

        let t = read_array1(&mut npz, GRID_T)?;
        let r = read_array1(&mut npz, GRID_R)?;
        let mut output = DreamOutput::new(OutputGrid::new(t, r)?);

        for name in &names {
            if let Some(q) = name.strip_prefix(EQSYS_PREFIX) {
                let data = read_array2(&mut npz, name)?;
                output.add_eqsys(q, data)?;
            } else if let Some(q) = name.strip_prefix(OTHER_FLUID_PREFIX) {
                let data = read_array2(&mut npz, name)?;
                output.add_other_fluid(q, data)?;
            } else if name != GRID_T && name != GRID_R {
                debug!(array = %name, "skipping unrecognised array");
            }
        }

        info!(
            path = %path.display(),
            nt = output.grid.nt(),
            nr = output.grid.nr(),
            unknowns = output.eqsys.len(),
            "output loaded"
        );
        Ok(output)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> DreamResult<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut npz = NpzWriter::new(file);
        let npz_err = |e: ndarray_npy::WriteNpzError| DreamError::Npz(format!("Failed to write output: {e}"));

        npz.add_array(GRID_T, &self.grid.t).map_err(npz_err)?;
        npz.add_array(GRID_R, &self.grid.r).map_err(npz_err)?;
        for (name, q) in &self.eqsys {
            npz.add_array(format!("{EQSYS_PREFIX}{name}"), q.data())
                .map_err(npz_err)?;
        }
        if let Some(other) = &self.other {
            for name in other.fluid_names() {
                if let Some(q) = other.fluid(name) {
                    npz.add_array(format!("{OTHER_FLUID_PREFIX}{name}"), q.data())
                        .map_err(npz_err)?;
                }
            }
        }
        npz.finish().map_err(npz_err)?;
        info!(path = %path.display(), "output saved");
        Ok(())
    }
}

fn read_array1(npz: &mut NpzReader<File>, key: &str) -> DreamResult<Array1<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix1>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix1>(key))
        .map_err(|e| DreamError::Npz(format!("Failed to read key '{key}' from NPZ: {e}")))
}

fn read_array2(npz: &mut NpzReader<File>, key: &str) -> DreamResult<Array2<f64>> {
    npz.by_name::<OwnedRepr<f64>, Ix2>(&format!("{key}.npy"))
        .or_else(|_| npz.by_name::<OwnedRepr<f64>, Ix2>(key))
        .map_err(|e| DreamError::Npz(format!("Failed to read key '{key}' from NPZ: {e}")))
}
