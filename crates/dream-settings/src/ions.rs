// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Ion Species
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ion species settings (`eqsys/n_i`).
//!
//! A species is either prescribed in time, kept in coronal equilibrium or
//! evolved dynamically with the ionization rate equation. Prescribed
//! species carry a (Z+1) x nt x nr density; the other two carry an initial
//! (Z+1) x nr density. Densities are indexed by charge state first.

use crate::dict::field;
use dream_math::interp::interp;
use dream_types::error::{DreamError, DreamResult};
use dream_types::options::{IonType, IonizationMode};
use ndarray::{array, s, Array1, Array2, Array3, ArrayViewD};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

const MODULE: &str = "ion_species";
const MODULE_IONS: &str = "n_i";

/// Marker written in place of the SPI molar fractions of a species that is
/// not fed by a pellet.
pub const SPI_MOLAR_FRACTION_UNUSED: f64 = -1.0;

/// User-supplied ion density, interpreted according to the ion type.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityInput {
    /// Constant in space and time.
    Scalar(f64),
    /// Radial profile.
    OneD(Array1<f64>),
    /// Charge states x radius, or time x radius for single charge state types.
    TwoD(Array2<f64>),
    /// Charge states x time x radius.
    ThreeD(Array3<f64>),
}

impl DensityInput {
    fn shape(&self) -> Vec<usize> {
        match self {
            DensityInput::Scalar(_) => vec![],
            DensityInput::OneD(n) => n.shape().to_vec(),
            DensityInput::TwoD(n) => n.shape().to_vec(),
            DensityInput::ThreeD(n) => n.shape().to_vec(),
        }
    }
}

impl From<f64> for DensityInput {
    fn from(n: f64) -> Self {
        DensityInput::Scalar(n)
    }
}

impl From<Vec<f64>> for DensityInput {
    fn from(n: Vec<f64>) -> Self {
        if n.len() == 1 {
            DensityInput::Scalar(n[0])
        } else {
            DensityInput::OneD(Array1::from_vec(n))
        }
    }
}

impl From<Array1<f64>> for DensityInput {
    fn from(n: Array1<f64>) -> Self {
        if n.len() == 1 {
            DensityInput::Scalar(n[0])
        } else {
            DensityInput::OneD(n)
        }
    }
}

impl From<Array2<f64>> for DensityInput {
    fn from(n: Array2<f64>) -> Self {
        DensityInput::TwoD(n)
    }
}

impl From<Array3<f64>> for DensityInput {
    fn from(n: Array3<f64>) -> Self {
        DensityInput::ThreeD(n)
    }
}

/// Coordinates accompanying a density input.
///
/// `r`/`t` are the grids the density is given on. `interpr`/`interpt` are
/// the grids used when a scalar density has to be expanded into a profile.
#[derive(Debug, Clone, Default)]
pub struct IonGrids {
    pub r: Option<Array1<f64>>,
    pub t: Option<Array1<f64>>,
    pub interpr: Option<Array1<f64>>,
    pub interpt: Option<Array1<f64>>,
}

impl IonGrids {
    pub fn radial(r: Array1<f64>) -> Self {
        IonGrids {
            r: Some(r),
            ..Default::default()
        }
    }

    pub fn radial_time(r: Array1<f64>, t: Array1<f64>) -> Self {
        IonGrids {
            r: Some(r),
            t: Some(t),
            ..Default::default()
        }
    }
}

/// Density data after initialization.
#[derive(Debug, Clone, PartialEq)]
pub enum IonDensity {
    /// Initial condition for dynamic/equilibrium species, (Z+1) x nr.
    Initial { r: Array1<f64>, n: Array2<f64> },
    /// Full evolution for prescribed species, (Z+1) x nt x nr.
    Prescribed {
        t: Array1<f64>,
        r: Array1<f64>,
        n: Array3<f64>,
    },
}

fn err(message: impl Into<String>) -> DreamError {
    DreamError::equation(MODULE, message)
}

fn default_r() -> Array1<f64> {
    array![0.0, 1.0]
}

fn default_t() -> Array1<f64> {
    array![0.0]
}

fn check_ascending(module: &'static str, name: &str, x: &Array1<f64>) -> DreamResult<()> {
    if x.iter().any(|v| !v.is_finite()) || x.windows(2).into_iter().any(|w| !(w[1] > w[0])) {
        return Err(DreamError::equation(
            module,
            format!("The grid '{name}' is not strictly increasing."),
        ));
    }
    Ok(())
}

fn check_charge_state(z: usize, z0: usize) -> DreamResult<()> {
    if z0 > z {
        return Err(err(format!(
            "Invalid charge state specified: {z0}. Ion has charge Z = {z}."
        )));
    }
    Ok(())
}

fn prescribed_density(
    z: usize,
    n: DensityInput,
    r: Option<&Array1<f64>>,
    t: Option<&Array1<f64>>,
) -> DreamResult<IonDensity> {
    let nstates = z + 1;
    if let DensityInput::Scalar(v) = n {
        return Ok(IonDensity::Prescribed {
            t: default_t(),
            r: default_r(),
            n: Array3::from_elem((nstates, 1, 2), v),
        });
    }

    let r = r.ok_or_else(|| {
        err("Non-scalar density prescribed, but no radial coordinates given.")
    })?;

    match n {
        DensityInput::Scalar(_) | DensityInput::OneD(_) => {
            Err(err("Prescribed density data has only one dimension."))
        }
        DensityInput::TwoD(_) => Err(err("Prescribed density data has only two dimensions.")),
        DensityInput::ThreeD(n) => {
            let t = t.ok_or_else(|| {
                err("3D ion density prescribed, but no time coordinates given.")
            })?;
            let (a, b, c) = n.dim();
            if a != nstates || b != t.len() || c != r.len() {
                return Err(err(format!(
                    "Invalid dimensions of prescribed density: {a}x{b}x{c}. Expected {nstates}x{}x{}",
                    t.len(),
                    r.len()
                )));
            }
            check_ascending(MODULE, "t", t)?;
            check_ascending(MODULE, "r", r)?;
            Ok(IonDensity::Prescribed {
                t: t.clone(),
                r: r.clone(),
                n,
            })
        }
    }
}

fn initial_density(z: usize, n: DensityInput, r: Option<&Array1<f64>>) -> DreamResult<IonDensity> {
    let nstates = z + 1;
    if let DensityInput::Scalar(_) = n {
        return Err(err(
            "Initial density must be two dimensional (charge states x radius).",
        ));
    }

    let r = r.ok_or_else(|| {
        err("Non-scalar initial ion density prescribed, but no radial coordinates given.")
    })?;

    match n {
        DensityInput::TwoD(n) => {
            let (a, b) = n.dim();
            if a != nstates || b != r.len() {
                return Err(err(format!(
                    "Invalid dimensions of initial ion density: {a}x{b}. Expected {nstates}x{}.",
                    r.len()
                )));
            }
            check_ascending(MODULE, "r", r)?;
            Ok(IonDensity::Initial { r: r.clone(), n })
        }
        other => Err(err(format!(
            "Unrecognized shape of initial density: {:?}.",
            other.shape()
        ))),
    }
}

fn dynamic_charge_state_density(
    z: usize,
    z0: usize,
    n: DensityInput,
    grids: &IonGrids,
) -> DreamResult<IonDensity> {
    check_charge_state(z, z0)?;

    if let DensityInput::Scalar(v) = n {
        let r = grids.interpr.clone().unwrap_or_else(default_r);
        let mut full = Array2::zeros((z + 1, r.len()));
        full.row_mut(z0).fill(v);
        return initial_density(z, DensityInput::TwoD(full), Some(&r));
    }

    let r = grids.r.as_ref().ok_or_else(|| {
        err("Non-scalar density prescribed, but no radial coordinates given.")
    })?;

    match n {
        DensityInput::OneD(profile) => {
            if profile.len() != r.len() {
                return Err(err(format!(
                    "Invalid dimensions of prescribed density: {}. Expected {}.",
                    profile.len(),
                    r.len()
                )));
            }
            let mut full = Array2::zeros((z + 1, r.len()));
            full.row_mut(z0).assign(&profile);
            initial_density(z, DensityInput::TwoD(full), Some(r))
        }
        other => Err(err(format!(
            "Unrecognized shape of prescribed density: {:?}.",
            other.shape()
        ))),
    }
}

fn prescribed_charge_state_density(
    z: usize,
    z0: usize,
    n: DensityInput,
    grids: &IonGrids,
) -> DreamResult<IonDensity> {
    check_charge_state(z, z0)?;

    if let DensityInput::Scalar(v) = n {
        let t = grids.interpt.clone().unwrap_or_else(default_t);
        let r = grids.interpr.clone().unwrap_or_else(default_r);
        let mut full = Array3::zeros((z + 1, t.len(), r.len()));
        full.slice_mut(s![z0, .., ..]).fill(v);
        return prescribed_density(z, DensityInput::ThreeD(full), Some(&r), Some(&t));
    }

    let r = grids.r.as_ref().ok_or_else(|| {
        err("Non-scalar density prescribed, but no radial coordinates given.")
    })?;

    // A radial profile is held constant in time
    let (n, t) = match n {
        DensityInput::OneD(profile) => {
            if profile.len() != r.len() {
                return Err(err(format!(
                    "Invalid dimensions of prescribed density: {}. Expected {}.",
                    profile.len(),
                    r.len()
                )));
            }
            let t = grids.interpt.clone().unwrap_or_else(default_t);
            let n = profile
                .broadcast((t.len(), r.len()))
                .ok_or_else(|| err("Unable to broadcast radial profile in time."))?
                .to_owned();
            (n, t)
        }
        DensityInput::TwoD(n) => {
            let t = grids.t.clone().ok_or_else(|| {
                err("2D ion density prescribed, but no time coordinates given.")
            })?;
            (n, t)
        }
        other => {
            return Err(err(format!(
                "Unrecognized shape of prescribed density: {:?}.",
                other.shape()
            )))
        }
    };

    let (a, b) = n.dim();
    if a != t.len() || b != r.len() {
        return Err(err(format!(
            "Invalid dimensions of prescribed density: {a}x{b}. Expected {}x{}.",
            t.len(),
            r.len()
        )));
    }

    let mut full = Array3::zeros((z + 1, t.len(), r.len()));
    full.slice_mut(s![z0, .., ..]).assign(&n);
    prescribed_density(z, DensityInput::ThreeD(full), Some(r), Some(&t))
}

/// A single ion species with all of its charge states.
#[derive(Debug, Clone, PartialEq)]
pub struct IonSpecies {
    name: String,
    z: usize,
    isotope: i64,
    ttype: IonType,
    density: IonDensity,
    /// Fraction of each pellet shard made up of this species.
    spi_molar_fraction: Option<Vec<f64>>,
}

impl IonSpecies {
    /// Create and initialize an ion species.
    ///
    /// The interface-only types (`DynamicNeutral`, ...) place the whole
    /// density in one charge state and resolve to the matching solver type.
    pub fn new(
        name: &str,
        z: usize,
        isotope: i64,
        ttype: IonType,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<Self> {
        if z == 0 {
            return Err(err(format!("Invalid charge number Z = 0 for '{name}'.")));
        }
        let (ttype, density) = Self::build(z, ttype, n.into(), grids)?;
        Ok(IonSpecies {
            name: name.to_string(),
            z,
            isotope,
            ttype,
            density,
            spi_molar_fraction: None,
        })
    }

    fn build(
        z: usize,
        ttype: IonType,
        n: DensityInput,
        grids: &IonGrids,
    ) -> DreamResult<(IonType, IonDensity)> {
        let r = grids.r.as_ref();
        let t = grids.t.as_ref();
        Ok(match ttype {
            IonType::Prescribed => (IonType::Prescribed, prescribed_density(z, n, r, t)?),
            IonType::Dynamic => (IonType::Dynamic, initial_density(z, n, r)?),
            IonType::Equilibrium => (IonType::Equilibrium, initial_density(z, n, r)?),
            IonType::DynamicNeutral => (
                IonType::Dynamic,
                dynamic_charge_state_density(z, 0, n, grids)?,
            ),
            IonType::DynamicFullyIonized => (
                IonType::Dynamic,
                dynamic_charge_state_density(z, z, n, grids)?,
            ),
            IonType::PrescribedNeutral => (
                IonType::Prescribed,
                prescribed_charge_state_density(z, 0, n, grids)?,
            ),
            IonType::PrescribedFullyIonized => (
                IonType::Prescribed,
                prescribed_charge_state_density(z, z, n, grids)?,
            ),
        })
    }

    pub fn with_spi_molar_fraction(mut self, fraction: Vec<f64>) -> Self {
        self.spi_molar_fraction = Some(fraction);
        self
    }

    // ── Initialization ──────────────────────────────────────────────

    pub fn initialize_prescribed(
        &mut self,
        n: impl Into<DensityInput>,
        r: Option<&Array1<f64>>,
        t: Option<&Array1<f64>>,
    ) -> DreamResult<()> {
        self.density = prescribed_density(self.z, n.into(), r, t)?;
        self.ttype = IonType::Prescribed;
        Ok(())
    }

    pub fn initialize_dynamic(
        &mut self,
        n: impl Into<DensityInput>,
        r: Option<&Array1<f64>>,
    ) -> DreamResult<()> {
        self.density = initial_density(self.z, n.into(), r)?;
        self.ttype = IonType::Dynamic;
        Ok(())
    }

    pub fn initialize_equilibrium(
        &mut self,
        n: impl Into<DensityInput>,
        r: Option<&Array1<f64>>,
    ) -> DreamResult<()> {
        self.density = initial_density(self.z, n.into(), r)?;
        self.ttype = IonType::Equilibrium;
        Ok(())
    }

    pub fn initialize_dynamic_charge_state(
        &mut self,
        z0: usize,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.density = dynamic_charge_state_density(self.z, z0, n.into(), grids)?;
        self.ttype = IonType::Dynamic;
        Ok(())
    }

    pub fn initialize_dynamic_neutral(
        &mut self,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.initialize_dynamic_charge_state(0, n, grids)
    }

    pub fn initialize_dynamic_fully_ionized(
        &mut self,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.initialize_dynamic_charge_state(self.z, n, grids)
    }

    pub fn initialize_prescribed_charge_state(
        &mut self,
        z0: usize,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.density = prescribed_charge_state_density(self.z, z0, n.into(), grids)?;
        self.ttype = IonType::Prescribed;
        Ok(())
    }

    pub fn initialize_prescribed_neutral(
        &mut self,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.initialize_prescribed_charge_state(0, n, grids)
    }

    pub fn initialize_prescribed_fully_ionized(
        &mut self,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.initialize_prescribed_charge_state(self.z, n, grids)
    }

    // ── Getters ─────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn z(&self) -> usize {
        self.z
    }

    pub fn isotope(&self) -> i64 {
        self.isotope
    }

    /// Solver type (always one of prescribed, equilibrium, dynamic).
    pub fn ion_type(&self) -> IonType {
        self.ttype
    }

    pub fn charge_states(&self) -> usize {
        self.z + 1
    }

    pub fn density_data(&self) -> &IonDensity {
        &self.density
    }

    /// Density with charge state as the first axis.
    pub fn density(&self) -> ArrayViewD<'_, f64> {
        match &self.density {
            IonDensity::Initial { n, .. } => n.view().into_dyn(),
            IonDensity::Prescribed { n, .. } => n.view().into_dyn(),
        }
    }

    pub fn r(&self) -> &Array1<f64> {
        match &self.density {
            IonDensity::Initial { r, .. } => r,
            IonDensity::Prescribed { r, .. } => r,
        }
    }

    /// Time grid; only prescribed species have one.
    pub fn t(&self) -> Option<&Array1<f64>> {
        match &self.density {
            IonDensity::Initial { .. } => None,
            IonDensity::Prescribed { t, .. } => Some(t),
        }
    }

    pub fn spi_molar_fraction(&self) -> Option<&[f64]> {
        self.spi_molar_fraction.as_deref()
    }

    pub fn set_spi_molar_fraction(&mut self, fraction: Option<Vec<f64>>) {
        self.spi_molar_fraction = fraction;
    }

    pub fn is_spi_connected(&self) -> bool {
        self.spi_molar_fraction.is_some()
    }
}

// ── Ion collection ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InitialData {
    r: Vec<f64>,
    x: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrescribedData {
    r: Vec<f64>,
    t: Vec<f64>,
    x: Vec<Vec<Vec<f64>>>,
}

/// Collection of ion species (`eqsys/n_i`).
#[derive(Debug, Clone, PartialEq)]
pub struct Ions {
    species: Vec<IonSpecies>,
    ionization: IonizationMode,
}

impl Default for Ions {
    fn default() -> Self {
        Ions {
            species: Vec::new(),
            ionization: IonizationMode::Fluid,
        }
    }
}

impl Ions {
    pub fn add_ion(&mut self, species: IonSpecies) -> DreamResult<()> {
        self.check_new_name(&species.name)?;
        self.species.push(species);
        Ok(())
    }

    /// Check that `name` could be added: non-empty, without `;`, and not
    /// already taken.
    pub fn check_new_name(&self, name: &str) -> DreamResult<()> {
        if name.is_empty() || name.contains(';') {
            return Err(DreamError::equation(
                MODULE_IONS,
                format!("Invalid ion name '{name}'."),
            ));
        }
        if self.species.iter().any(|s| s.name == name) {
            return Err(DreamError::equation(
                MODULE_IONS,
                format!("An ion species with name '{name}' has already been added."),
            ));
        }
        Ok(())
    }

    /// Create a species and add it to the collection.
    pub fn add(
        &mut self,
        name: &str,
        z: usize,
        isotope: i64,
        ttype: IonType,
        n: impl Into<DensityInput>,
        grids: &IonGrids,
    ) -> DreamResult<()> {
        self.add_ion(IonSpecies::new(name, z, isotope, ttype, n, grids)?)
    }

    pub fn ions(&self) -> &[IonSpecies] {
        &self.species
    }

    pub fn ions_mut(&mut self) -> &mut [IonSpecies] {
        &mut self.species
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn get_index(&self, name: &str) -> DreamResult<usize> {
        self.species
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| {
                DreamError::equation(MODULE_IONS, format!("No ion with name '{name}' has been defined."))
            })
    }

    pub fn get_species(&self, name: &str) -> DreamResult<&IonSpecies> {
        Ok(&self.species[self.get_index(name)?])
    }

    /// Total number of charge states over all species.
    pub fn charge_state_count(&self) -> usize {
        self.species.iter().map(IonSpecies::charge_states).sum()
    }

    pub fn ionization(&self) -> IonizationMode {
        self.ionization
    }

    pub fn set_ionization(&mut self, ionization: IonizationMode) {
        self.ionization = ionization;
    }

    /// Number of pellet shards the SPI-connected species refer to.
    pub fn spi_shard_count(&self) -> Option<usize> {
        self.species
            .iter()
            .find_map(|s| s.spi_molar_fraction.as_ref().map(Vec::len))
    }

    pub fn to_dict(&self) -> DreamResult<Value> {
        self.verify_settings()?;

        let mut spi_fraction = Vec::new();
        for s in &self.species {
            match &s.spi_molar_fraction {
                Some(f) => spi_fraction.extend_from_slice(f),
                None => spi_fraction.push(SPI_MOLAR_FRACTION_UNUSED),
            }
        }

        let names: Vec<&str> = self.species.iter().map(|s| s.name.as_str()).collect();
        let data = serde_json::json!({
            "names": names.join(";"),
            "Z": self.species.iter().map(|s| s.z).collect::<Vec<_>>(),
            "isotopes": self.species.iter().map(|s| s.isotope).collect::<Vec<_>>(),
            "types": self.species.iter().map(|s| s.ttype).collect::<Vec<_>>(),
            "SPIMolarFraction": spi_fraction,
            "ionization": self.ionization,
            "initial": self.initial_data(),
            "prescribed": self.prescribed_data(),
        });
        Ok(data)
    }

    /// Initial densities of all non-prescribed species on a common radial grid.
    fn initial_data(&self) -> InitialData {
        let initial: Vec<(&Array1<f64>, &Array2<f64>)> = self
            .species
            .iter()
            .filter_map(|s| match &s.density {
                IonDensity::Initial { r, n } => Some((r, n)),
                IonDensity::Prescribed { .. } => None,
            })
            .collect();

        let Some(r_ref) = finest_grid(initial.iter().map(|(r, _)| *r)) else {
            return InitialData::default();
        };

        let mut x = Vec::new();
        for (r, n) in initial {
            for row in n.outer_iter() {
                x.push(resample(r, &row.to_vec(), r_ref));
            }
        }
        InitialData {
            r: r_ref.to_vec(),
            x,
        }
    }

    /// Prescribed densities on a common time and radial grid.
    fn prescribed_data(&self) -> PrescribedData {
        let prescribed: Vec<(&Array1<f64>, &Array1<f64>, &Array3<f64>)> = self
            .species
            .iter()
            .filter_map(|s| match &s.density {
                IonDensity::Prescribed { t, r, n } => Some((t, r, n)),
                IonDensity::Initial { .. } => None,
            })
            .collect();

        let (Some(t_ref), Some(r_ref)) = (
            finest_grid(prescribed.iter().map(|(t, _, _)| *t)),
            finest_grid(prescribed.iter().map(|(_, r, _)| *r)),
        ) else {
            return PrescribedData::default();
        };

        let mut x = Vec::new();
        for (t, r, n) in prescribed {
            for state in n.outer_iter() {
                // Radius first, then time
                let radial: Vec<Vec<f64>> = state
                    .outer_iter()
                    .map(|row| resample(r, &row.to_vec(), r_ref))
                    .collect();
                let mut out = vec![vec![0.0; r_ref.len()]; t_ref.len()];
                for ir in 0..r_ref.len() {
                    let column: Vec<f64> = radial.iter().map(|row| row[ir]).collect();
                    let resampled = resample(t, &column, t_ref);
                    for (it, v) in resampled.into_iter().enumerate() {
                        out[it][ir] = v;
                    }
                }
                x.push(out);
            }
        }
        PrescribedData {
            r: r_ref.to_vec(),
            t: t_ref.to_vec(),
            x,
        }
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        let names: String = field(data, "names", MODULE_IONS)?;
        let z: Vec<usize> = field(data, "Z", MODULE_IONS)?;
        let isotopes: Vec<i64> = field(data, "isotopes", MODULE_IONS)?;
        let types: Vec<IonType> = field(data, "types", MODULE_IONS)?;
        let spi_fraction: Vec<f64> = field(data, "SPIMolarFraction", MODULE_IONS)?;
        let ionization: IonizationMode = field(data, "ionization", MODULE_IONS)?;
        let initial: InitialData = field(data, "initial", MODULE_IONS)?;
        let prescribed: PrescribedData = field(data, "prescribed", MODULE_IONS)?;

        let nz = z.len();
        if types.len() != nz || isotopes.len() != nz {
            return Err(DreamError::equation(
                MODULE_IONS,
                "Expected the lengths of 'Z', 'isotopes' and 'types' to match.",
            ));
        }

        let mut names: Vec<String> = names
            .split(';')
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();
        if names.len() > nz {
            return Err(DreamError::equation(
                MODULE_IONS,
                format!("Too many ion names given: {}. Expected {nz}.", names.len()),
            ));
        }
        for i in names.len()..nz {
            names.push(format!("Ion {i}"));
        }

        let fractions = split_spi_molar_fraction(&spi_fraction, nz)?;

        let initial_r = Array1::from_vec(initial.r);
        let prescribed_r = Array1::from_vec(prescribed.r);
        let prescribed_t = Array1::from_vec(prescribed.t);
        check_ascending(MODULE_IONS, "initial/r", &initial_r)?;
        check_ascending(MODULE_IONS, "prescribed/r", &prescribed_r)?;
        check_ascending(MODULE_IONS, "prescribed/t", &prescribed_t)?;
        let mut initial_rows = initial.x.into_iter();
        let mut prescribed_rows = prescribed.x.into_iter();

        let mut ions = Ions {
            species: Vec::with_capacity(nz),
            ionization,
        };

        for (i, fraction) in fractions.into_iter().enumerate() {
            let nstates = z[i] + 1;
            let density = match types[i] {
                IonType::Prescribed => {
                    let mut flat = Vec::new();
                    for _ in 0..nstates {
                        let state = prescribed_rows.next().ok_or_else(|| {
                            DreamError::equation(MODULE_IONS, "Too few rows in 'prescribed/x'.")
                        })?;
                        if state.len() != prescribed_t.len() {
                            return Err(DreamError::equation(
                                MODULE_IONS,
                                "Prescribed density does not match the time grid.",
                            ));
                        }
                        for row in state {
                            check_row(&row, prescribed_r.len(), "prescribed/x")?;
                            flat.extend(row);
                        }
                    }
                    let n = Array3::from_shape_vec(
                        (nstates, prescribed_t.len(), prescribed_r.len()),
                        flat,
                    )
                    .map_err(|e| DreamError::equation(MODULE_IONS, e.to_string()))?;
                    IonDensity::Prescribed {
                        t: prescribed_t.clone(),
                        r: prescribed_r.clone(),
                        n,
                    }
                }
                IonType::Dynamic | IonType::Equilibrium => {
                    let mut flat = Vec::new();
                    for _ in 0..nstates {
                        let row = initial_rows.next().ok_or_else(|| {
                            DreamError::equation(MODULE_IONS, "Too few rows in 'initial/x'.")
                        })?;
                        check_row(&row, initial_r.len(), "initial/x")?;
                        flat.extend(row);
                    }
                    let n = Array2::from_shape_vec((nstates, initial_r.len()), flat)
                        .map_err(|e| DreamError::equation(MODULE_IONS, e.to_string()))?;
                    IonDensity::Initial {
                        r: initial_r.clone(),
                        n,
                    }
                }
                other => {
                    return Err(DreamError::equation(
                        MODULE_IONS,
                        format!("Ion type {} is not a solver type.", other.code()),
                    ))
                }
            };

            ions.add_ion(IonSpecies {
                name: names[i].clone(),
                z: z[i],
                isotope: isotopes[i],
                ttype: types[i],
                density,
                spi_molar_fraction: fraction,
            })?;
        }

        ions.verify_settings()?;
        Ok(ions)
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        let mut seen = HashSet::new();
        for s in &self.species {
            if !seen.insert(s.name.as_str()) {
                return Err(DreamError::equation(
                    MODULE_IONS,
                    format!("Duplicate ion name '{}'.", s.name),
                ));
            }
            if !s.ttype.is_solver_type() {
                return Err(DreamError::equation(
                    MODULE_IONS,
                    format!("Ion '{}' has not been initialized.", s.name),
                ));
            }
            if s.density().iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(DreamError::equation(
                    MODULE_IONS,
                    format!("Ion '{}' has negative or non-finite densities.", s.name),
                ));
            }
        }

        let mut shards = None;
        for s in &self.species {
            let Some(f) = &s.spi_molar_fraction else {
                continue;
            };
            if f.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(DreamError::equation(
                    MODULE_IONS,
                    format!("Invalid SPI molar fraction for ion '{}'.", s.name),
                ));
            }
            match shards {
                None => shards = Some(f.len()),
                Some(n) if n != f.len() => {
                    return Err(DreamError::equation(
                        MODULE_IONS,
                        format!(
                            "Inconsistent number of shards in 'SPIMolarFraction' of ion '{}': {}. Expected {n}.",
                            s.name,
                            f.len()
                        ),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

fn check_row(row: &[f64], expected: usize, key: &str) -> DreamResult<()> {
    if row.len() != expected {
        return Err(DreamError::equation(
            MODULE_IONS,
            format!("Row of '{key}' has length {}. Expected {expected}.", row.len()),
        ));
    }
    Ok(())
}

/// Grid with the most points; the first one wins on ties.
fn finest_grid<'a>(grids: impl Iterator<Item = &'a Array1<f64>>) -> Option<&'a Array1<f64>> {
    grids.fold(None, |best: Option<&Array1<f64>>, g| match best {
        Some(b) if b.len() >= g.len() => Some(b),
        _ => Some(g),
    })
}

/// Interpolate `values(src)` onto `dst`; copies when the grids coincide.
fn resample(src: &Array1<f64>, values: &[f64], dst: &Array1<f64>) -> Vec<f64> {
    if src == dst {
        return values.to_vec();
    }
    let xp = src.to_vec();
    dst.iter().map(|&x| interp(x, &xp, values)).collect()
}

/// Split the flattened SPI molar fraction array into one entry per species.
///
/// Unconnected species contribute a single marker value; connected ones
/// contribute one value per shard.
fn split_spi_molar_fraction(data: &[f64], nz: usize) -> DreamResult<Vec<Option<Vec<f64>>>> {
    let unused = data
        .iter()
        .filter(|&&v| v == SPI_MOLAR_FRACTION_UNUSED)
        .count();
    if unused > nz {
        return Err(DreamError::equation(
            MODULE_IONS,
            "Too many entries in 'SPIMolarFraction'.",
        ));
    }
    let connected = nz - unused;
    let nshard = if connected == 0 {
        0
    } else {
        let used = data.len() - unused;
        if used % connected != 0 {
            return Err(DreamError::equation(
                MODULE_IONS,
                "Length of 'SPIMolarFraction' is inconsistent with the number of ions.",
            ));
        }
        used / connected
    };

    let mut out = Vec::with_capacity(nz);
    let mut pos = 0;
    for _ in 0..nz {
        match data.get(pos) {
            Some(&v) if v == SPI_MOLAR_FRACTION_UNUSED => {
                out.push(None);
                pos += 1;
            }
            Some(_) if pos + nshard <= data.len() => {
                out.push(Some(data[pos..pos + nshard].to_vec()));
                pos += nshard;
            }
            _ => {
                return Err(DreamError::equation(
                    MODULE_IONS,
                    "Too few entries in 'SPIMolarFraction'.",
                ))
            }
        }
    }
    if pos != data.len() {
        return Err(DreamError::equation(
            MODULE_IONS,
            "Too many entries in 'SPIMolarFraction'.",
        ));
    }
    Ok(out)
}
