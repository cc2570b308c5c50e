// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Momentum Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Hot-tail and runaway momentum grid settings.
//!
//! Only p/xi grids are supported; ppar/pperp grids are rejected
//! everywhere a grid type is accepted.

use crate::dict::{field, optional_field};
use dream_types::error::{DreamError, DreamResult};
use dream_types::options::{MomentumGridType, PGridType, XiGridType};
use serde_json::{json, Map, Value};
use tracing::warn;

/// Default number of momentum points.
pub const DEFAULT_NP: usize = 100;
/// Default number of pitch points.
pub const DEFAULT_NXI: usize = 1;

/// Momentum (p) grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PGrid {
    name: String,
    ptype: PGridType,
    np: usize,
    pmax: Option<f64>,
    /// Number of points below `psep` on a biuniform grid.
    npsep: Option<usize>,
    /// Separating momentum on a biuniform grid.
    psep: Option<f64>,
}

impl PGrid {
    pub fn new(name: &str, np: usize, pmax: Option<f64>) -> DreamResult<Self> {
        let mut grid = PGrid {
            name: name.to_string(),
            ptype: PGridType::Uniform,
            np: DEFAULT_NP,
            pmax: None,
            npsep: None,
            psep: None,
        };
        grid.set_np(np)?;
        if let Some(pmax) = pmax {
            grid.set_pmax(pmax)?;
        }
        Ok(grid)
    }

    pub fn np(&self) -> usize {
        self.np
    }

    pub fn pmax(&self) -> Option<f64> {
        self.pmax
    }

    pub fn grid_type(&self) -> PGridType {
        self.ptype
    }

    pub fn npsep(&self) -> Option<usize> {
        self.npsep
    }

    pub fn psep(&self) -> Option<f64> {
        self.psep
    }

    pub fn set_np(&mut self, np: usize) -> DreamResult<()> {
        if np == 0 {
            return Err(DreamError::Settings(format!(
                "PGrid {}: Invalid value assigned to 'np': {np}. Must be > 0.",
                self.name
            )));
        }
        self.np = np;
        Ok(())
    }

    pub fn set_pmax(&mut self, pmax: f64) -> DreamResult<()> {
        if !(pmax.is_finite() && pmax > 0.0) {
            return Err(DreamError::Settings(format!(
                "PGrid {}: Invalid value assigned to 'pmax': {pmax}. Must be > 0.",
                self.name
            )));
        }
        self.pmax = Some(pmax);
        Ok(())
    }

    /// Switch to a biuniform grid split at `psep`.
    ///
    /// Exactly one of `npsep` (points below `psep`) and `npsep_frac`
    /// (fraction of `np` below `psep`) must be given.
    pub fn set_biuniform(
        &mut self,
        psep: f64,
        npsep: Option<usize>,
        npsep_frac: Option<f64>,
    ) -> DreamResult<()> {
        let npsep = match (npsep, npsep_frac) {
            (Some(n), None) => n,
            (None, Some(frac)) => {
                if !(frac > 0.0 && frac < 1.0) {
                    return Err(DreamError::Settings(format!(
                        "PGrid {}: Invalid value assigned to 'npsep_frac': {frac}. Must be in (0, 1).",
                        self.name
                    )));
                }
                (frac * self.np as f64).round() as usize
            }
            _ => {
                return Err(DreamError::Settings(format!(
                    "PGrid {}: Exactly one of 'npsep' and 'npsep_frac' must be given.",
                    self.name
                )))
            }
        };

        self.ptype = PGridType::Biuniform;
        self.psep = Some(psep);
        self.npsep = Some(npsep);
        Ok(())
    }

    pub fn to_dict(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("pgrid".into(), json!(self.ptype.code()));
        data.insert("np".into(), json!(self.np));
        data.insert("pmax".into(), json!(self.pmax));
        if self.ptype == PGridType::Biuniform {
            data.insert("npsep".into(), json!(self.npsep));
            data.insert("psep".into(), json!(self.psep));
        }
        data
    }

    pub fn from_dict(name: &str, data: &Value) -> DreamResult<Self> {
        let ptype: PGridType = field(data, "pgrid", "pgrid")?;
        Ok(PGrid {
            name: name.to_string(),
            ptype,
            np: field(data, "np", "pgrid")?,
            pmax: optional_field(data, "pmax", "pgrid")?,
            npsep: optional_field(data, "npsep", "pgrid")?,
            psep: optional_field(data, "psep", "pgrid")?,
        })
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        if self.np == 0 {
            return Err(DreamError::Settings(format!(
                "PGrid {}: Invalid value assigned to 'np': {}. Must be > 0.",
                self.name, self.np
            )));
        }
        let pmax = match self.pmax {
            Some(p) if p.is_finite() && p > 0.0 => p,
            other => {
                return Err(DreamError::Settings(format!(
                    "PGrid {}: Invalid value assigned to 'pmax': {other:?}. Must be > 0.",
                    self.name
                )))
            }
        };

        if self.ptype == PGridType::Biuniform {
            match self.psep {
                Some(psep) if psep > 0.0 && psep < pmax => {}
                other => {
                    return Err(DreamError::Settings(format!(
                        "PGrid {}: Invalid value assigned to 'psep': {other:?}. Must be in (0, pmax).",
                        self.name
                    )))
                }
            }
            match self.npsep {
                Some(n) if n > 0 && n < self.np => {}
                other => {
                    return Err(DreamError::Settings(format!(
                        "PGrid {}: Invalid value assigned to 'npsep': {other:?}. Must be in (0, np).",
                        self.name
                    )))
                }
            }
        }
        Ok(())
    }
}

/// Pitch (xi) grid.
#[derive(Debug, Clone, PartialEq)]
pub struct XiGrid {
    name: String,
    xitype: XiGridType,
    nxi: usize,
}

impl XiGrid {
    pub fn new(name: &str, nxi: usize) -> DreamResult<Self> {
        let mut grid = XiGrid {
            name: name.to_string(),
            xitype: XiGridType::Uniform,
            nxi: DEFAULT_NXI,
        };
        grid.set_nxi(nxi)?;
        Ok(grid)
    }

    pub fn nxi(&self) -> usize {
        self.nxi
    }

    pub fn grid_type(&self) -> XiGridType {
        self.xitype
    }

    pub fn set_nxi(&mut self, nxi: usize) -> DreamResult<()> {
        if nxi == 0 {
            return Err(DreamError::Settings(format!(
                "XiGrid {}: Invalid value assigned to 'nxi': {nxi}. Must be > 0.",
                self.name
            )));
        }
        self.nxi = nxi;
        Ok(())
    }

    pub fn to_dict(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("xigrid".into(), json!(self.xitype.code()));
        data.insert("nxi".into(), json!(self.nxi));
        data
    }

    pub fn from_dict(name: &str, data: &Value) -> DreamResult<Self> {
        Ok(XiGrid {
            name: name.to_string(),
            xitype: field(data, "xigrid", "xigrid")?,
            nxi: field(data, "nxi", "xigrid")?,
        })
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        if self.nxi == 0 {
            return Err(DreamError::Settings(format!(
                "XiGrid {}: Invalid value assigned to 'nxi': {}. Must be > 0.",
                self.name, self.nxi
            )));
        }
        Ok(())
    }
}

/// Hot-tail or runaway momentum grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumGrid {
    name: String,
    enabled: bool,
    gtype: MomentumGridType,
    pgrid: PGrid,
    xigrid: XiGrid,
}

impl MomentumGrid {
    pub fn new(
        name: &str,
        enabled: bool,
        gtype: MomentumGridType,
        np: usize,
        nxi: usize,
        pmax: Option<f64>,
    ) -> DreamResult<Self> {
        require_pxi(name, gtype)?;
        Ok(MomentumGrid {
            name: name.to_string(),
            enabled,
            gtype,
            pgrid: PGrid::new(name, np, pmax)?,
            xigrid: XiGrid::new(name, nxi)?,
        })
    }

    /// Disabled p/xi grid with default resolution.
    pub fn disabled(name: &str) -> Self {
        MomentumGrid {
            name: name.to_string(),
            enabled: false,
            gtype: MomentumGridType::PXi,
            pgrid: PGrid {
                name: name.to_string(),
                ptype: PGridType::Uniform,
                np: DEFAULT_NP,
                pmax: None,
                npsep: None,
                psep: None,
            },
            xigrid: XiGrid {
                name: name.to_string(),
                xitype: XiGridType::Uniform,
                nxi: DEFAULT_NXI,
            },
        }
    }

    /// Reset every setting of this grid.
    pub fn set(
        &mut self,
        enabled: bool,
        gtype: MomentumGridType,
        np: usize,
        nxi: usize,
        pmax: Option<f64>,
    ) -> DreamResult<()> {
        *self = MomentumGrid::new(&self.name, enabled, gtype, np, nxi, pmax)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn grid_type(&self) -> MomentumGridType {
        self.gtype
    }

    pub fn pgrid(&self) -> &PGrid {
        &self.pgrid
    }

    pub fn xigrid(&self) -> &XiGrid {
        &self.xigrid
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_np(&mut self, np: usize) -> DreamResult<()> {
        if np == 0 {
            return Err(DreamError::Settings(format!(
                "{}: Invalid value assigned to 'np': {np}. Must be > 0.",
                self.name
            )));
        }
        if np == 1 {
            warn!(
                grid = %self.name,
                "np = 1. Consider disabling the grid altogether."
            );
        }
        self.pgrid.set_np(np)
    }

    pub fn set_nxi(&mut self, nxi: usize) -> DreamResult<()> {
        self.xigrid.set_nxi(nxi)
    }

    pub fn set_pmax(&mut self, pmax: f64) -> DreamResult<()> {
        self.pgrid.set_pmax(pmax)
    }

    pub fn set_biuniform_grid(
        &mut self,
        psep: f64,
        npsep: Option<usize>,
        npsep_frac: Option<f64>,
    ) -> DreamResult<()> {
        self.pgrid.set_biuniform(psep, npsep, npsep_frac)
    }

    /// Dictionary form. Disabled grids only carry `enabled` and `type`.
    pub fn to_dict(&self, verify: bool) -> DreamResult<Value> {
        if verify {
            self.verify_settings()?;
        }
        require_pxi(&self.name, self.gtype)?;

        let mut data = Map::new();
        data.insert("enabled".into(), json!(self.enabled));
        data.insert("type".into(), json!(self.gtype.code()));
        if self.enabled {
            data.extend(self.pgrid.to_dict());
            data.extend(self.xigrid.to_dict());
        }
        Ok(Value::Object(data))
    }

    pub fn from_dict(name: &str, data: &Value) -> DreamResult<Self> {
        let enabled: bool = field(data, "enabled", "momentum grid")?;
        let gtype: MomentumGridType = field(data, "type", "momentum grid")?;
        require_pxi(name, gtype)?;

        let grid = if enabled {
            MomentumGrid {
                name: name.to_string(),
                enabled,
                gtype,
                pgrid: PGrid::from_dict(name, data)?,
                xigrid: XiGrid::from_dict(name, data)?,
            }
        } else {
            MomentumGrid::disabled(name)
        };

        grid.verify_settings()?;
        Ok(grid)
    }

    /// Look up a single setting of the (unverified) dictionary form.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.to_dict(false).ok()?.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        require_pxi(&self.name, self.gtype)?;
        if self.enabled {
            self.pgrid.verify_settings()?;
            self.xigrid.verify_settings()?;
        }
        Ok(())
    }
}

fn require_pxi(name: &str, gtype: MomentumGridType) -> DreamResult<()> {
    match gtype {
        MomentumGridType::PXi => Ok(()),
        MomentumGridType::PparPperp => Err(DreamError::Settings(format!(
            "{name}: No support implemented yet for 'ppar/pperp' grids."
        ))),
    }
}
