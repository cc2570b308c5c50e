// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Settings Root
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Root settings object, written to and read from a JSON settings file.

use crate::dict::field;
use crate::electric_field::ElectricFieldSettings;
use crate::ions::Ions;
use crate::momentum_grid::MomentumGrid;
use crate::runaway::RunawayElectrons;
use crate::spi::SpiSettings;
use crate::time_stepper::TimeStepper;
use dream_types::error::{DreamError, DreamResult};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

pub const HOTTAIL_GRID: &str = "hottailgrid";
pub const RUNAWAY_GRID: &str = "runawaygrid";

/// Unknown quantities of the equation system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EquationSystem {
    pub e_field: ElectricFieldSettings,
    pub n_i: Ions,
    pub n_re: RunawayElectrons,
    pub spi: SpiSettings,
}

impl EquationSystem {
    pub fn to_dict(&self) -> DreamResult<Value> {
        Ok(json!({
            "E_field": self.e_field.to_dict()?,
            "n_i": self.n_i.to_dict()?,
            "n_re": self.n_re.to_dict()?,
            "spi": self.spi.to_dict()?,
        }))
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        let section = |key: &str| -> DreamResult<&Value> {
            data.get(key).ok_or_else(|| {
                DreamError::Settings(format!("eqsys: Missing mandatory setting '{key}'."))
            })
        };
        Ok(EquationSystem {
            e_field: ElectricFieldSettings::from_dict(section("E_field")?)?,
            n_i: Ions::from_dict(section("n_i")?)?,
            n_re: RunawayElectrons::from_dict(section("n_re")?)?,
            spi: SpiSettings::from_dict(section("spi")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DreamSettings {
    pub hottailgrid: MomentumGrid,
    pub runawaygrid: MomentumGrid,
    pub eqsys: EquationSystem,
    pub timestep: TimeStepper,
}

impl Default for DreamSettings {
    fn default() -> Self {
        DreamSettings {
            hottailgrid: MomentumGrid::disabled(HOTTAIL_GRID),
            runawaygrid: MomentumGrid::disabled(RUNAWAY_GRID),
            eqsys: EquationSystem::default(),
            timestep: TimeStepper::default(),
        }
    }
}

impl DreamSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_dict(&self, verify: bool) -> DreamResult<Value> {
        if verify {
            self.verify_settings()?;
        }
        Ok(json!({
            HOTTAIL_GRID: self.hottailgrid.to_dict(false)?,
            RUNAWAY_GRID: self.runawaygrid.to_dict(false)?,
            "eqsys": self.eqsys.to_dict()?,
            "timestep": self.timestep.to_dict()?,
        }))
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        let grid = |name: &str| -> DreamResult<MomentumGrid> {
            match data.get(name) {
                Some(v) => MomentumGrid::from_dict(name, v),
                None => Ok(MomentumGrid::disabled(name)),
            }
        };
        let eqsys: Value = field(data, "eqsys", "settings")?;
        let timestep: Value = field(data, "timestep", "settings")?;

        let settings = DreamSettings {
            hottailgrid: grid(HOTTAIL_GRID)?,
            runawaygrid: grid(RUNAWAY_GRID)?,
            eqsys: EquationSystem::from_dict(&eqsys)?,
            timestep: TimeStepper::from_dict(&timestep)?,
        };
        settings.verify_settings()?;
        Ok(settings)
    }

    /// Write the verified settings as a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> DreamResult<()> {
        let data = self.to_dict(true)?;
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(&data)?)?;
        info!(path = %path.as_ref().display(), "settings saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> DreamResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let data: Value = serde_json::from_str(&contents)?;
        let settings = Self::from_dict(&data)?;
        info!(path = %path.as_ref().display(), "settings loaded");
        Ok(settings)
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        self.hottailgrid.verify_settings()?;
        self.runawaygrid.verify_settings()?;
        self.eqsys.e_field.verify_settings()?;
        self.eqsys.n_i.verify_settings()?;
        self.eqsys.n_re.verify_settings()?;
        self.eqsys.spi.verify_settings()?;
        self.timestep.verify_settings()?;

        if let Some(n) = self.eqsys.n_i.spi_shard_count() {
            let n_shard = self.eqsys.spi.n_shard();
            if n != n_shard {
                return Err(DreamError::Settings(format!(
                    "The ion SPI molar fractions refer to {n} shards, but {n_shard} shards have been set."
                )));
            }
        }
        Ok(())
    }
}
