// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Electric Field Settings
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Electric field settings (`eqsys/E_field`).
//!
//! The field is either prescribed as E(t, r) or evolved self-consistently,
//! in which case the prescribed data (if any) is the initial profile and
//! the boundary condition at the wall must be specified.

use dream_types::error::{DreamError, DreamResult};
use dream_types::options::{EFieldType, WallBoundaryType};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MODULE: &str = "E_field";

/// E(t, r) on a time/radius grid. `x` is nt x nr.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldData {
    pub t: Vec<f64>,
    pub r: Vec<f64>,
    pub x: Vec<Vec<f64>>,
}

impl FieldData {
    pub fn to_array(&self) -> DreamResult<Array2<f64>> {
        let nr = self.r.len();
        let flat: Vec<f64> = self.x.iter().flatten().copied().collect();
        Array2::from_shape_vec((self.x.len(), nr), flat)
            .map_err(|e| DreamError::equation(MODULE, format!("Invalid field data: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    #[serde(rename = "type")]
    pub bctype: WallBoundaryType,
    /// Minor radius of the conducting wall (m).
    pub wall_radius: f64,
    /// Inverse resistive wall time (1/s); zero for a perfectly conducting wall.
    pub inverse_wall_time: f64,
    /// Major radius (m), needed with a finite wall time.
    #[serde(rename = "R0")]
    pub r0: f64,
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        BoundaryCondition {
            bctype: WallBoundaryType::SelfConsistent,
            wall_radius: 0.0,
            inverse_wall_time: 0.0,
            r0: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricFieldSettings {
    #[serde(rename = "type")]
    pub ftype: EFieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FieldData>,
    pub bc: BoundaryCondition,
}

impl Default for ElectricFieldSettings {
    fn default() -> Self {
        ElectricFieldSettings {
            ftype: EFieldType::Prescribed,
            data: None,
            bc: BoundaryCondition::default(),
        }
    }
}

impl ElectricFieldSettings {
    pub fn set_type(&mut self, ftype: EFieldType) {
        self.ftype = ftype;
    }

    /// Prescribe a constant field in space and time.
    pub fn set_prescribed_constant(&mut self, efield: f64) {
        self.data = Some(FieldData {
            t: vec![0.0],
            r: vec![0.0, 1.0],
            x: vec![vec![efield, efield]],
        });
    }

    /// Prescribe E(t, r); `efield` is nt x nr.
    pub fn set_prescribed_data(
        &mut self,
        efield: &Array2<f64>,
        t: &Array1<f64>,
        r: &Array1<f64>,
    ) -> DreamResult<()> {
        let (nt, nr) = efield.dim();
        if nt != t.len() || nr != r.len() {
            return Err(DreamError::equation(
                MODULE,
                format!(
                    "Invalid dimensions of prescribed electric field: {nt}x{nr}. Expected {}x{}.",
                    t.len(),
                    r.len()
                ),
            ));
        }
        self.data = Some(FieldData {
            t: t.to_vec(),
            r: r.to_vec(),
            x: efield.outer_iter().map(|row| row.to_vec()).collect(),
        });
        Ok(())
    }

    pub fn set_boundary_condition(
        &mut self,
        bctype: WallBoundaryType,
        wall_radius: f64,
        inverse_wall_time: f64,
        r0: f64,
    ) {
        self.bc = BoundaryCondition {
            bctype,
            wall_radius,
            inverse_wall_time,
            r0,
        };
    }

    pub fn to_dict(&self) -> DreamResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        serde_json::from_value(data.clone())
            .map_err(|e| DreamError::equation(MODULE, format!("Invalid settings: {e}")))
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        if let Some(data) = &self.data {
            if data.x.len() != data.t.len() {
                return Err(DreamError::equation(
                    MODULE,
                    format!(
                        "Invalid number of time points in electric field data: {}. Expected {}.",
                        data.x.len(),
                        data.t.len()
                    ),
                ));
            }
            if data.x.iter().any(|row| row.len() != data.r.len()) {
                return Err(DreamError::equation(
                    MODULE,
                    format!(
                        "Invalid number of radial points in electric field data. Expected {}.",
                        data.r.len()
                    ),
                ));
            }
        }

        match self.ftype {
            EFieldType::Prescribed => {
                if self.data.is_none() {
                    return Err(DreamError::equation(
                        MODULE,
                        "No data has been prescribed for the electric field.",
                    ));
                }
            }
            EFieldType::SelfConsistent => {
                if self.bc.bctype == WallBoundaryType::SelfConsistent {
                    if !(self.bc.wall_radius > 0.0) {
                        return Err(DreamError::equation(
                            MODULE,
                            "Invalid value assigned to 'wall_radius'. Must be positive.",
                        ));
                    }
                    if self.bc.inverse_wall_time < 0.0 {
                        return Err(DreamError::equation(
                            MODULE,
                            "Invalid value assigned to 'inverse_wall_time'. Must be >= 0.",
                        ));
                    }
                    if self.bc.inverse_wall_time > 0.0 && !(self.bc.r0 > 0.0) {
                        return Err(DreamError::equation(
                            MODULE,
                            "A finite wall time requires a positive major radius 'R0'.",
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_prescribed_requires_data() {
        let mut ef = ElectricFieldSettings::default();
        assert!(ef.verify_settings().is_err());
        ef.set_prescribed_constant(0.5);
        assert!(ef.verify_settings().is_ok());
    }

    #[test]
    fn test_prescribed_data_dimensions() {
        let mut ef = ElectricFieldSettings::default();
        let e = Array2::<f64>::zeros((2, 3));
        assert!(ef
            .set_prescribed_data(&e, &array![0.0, 1.0], &array![0.0, 0.5, 1.0])
            .is_ok());
        assert_eq!(ef.data.as_ref().unwrap().to_array().unwrap(), e);
        assert!(ef
            .set_prescribed_data(&e, &array![0.0], &array![0.0, 0.5, 1.0])
            .is_err());
    }

    #[test]
    fn test_self_consistent_wall() {
        let mut ef = ElectricFieldSettings::default();
        ef.set_type(EFieldType::SelfConsistent);
        assert!(ef.verify_settings().is_err());

        ef.set_boundary_condition(WallBoundaryType::SelfConsistent, 0.6, 0.0, 0.0);
        assert!(ef.verify_settings().is_ok());

        ef.set_boundary_condition(WallBoundaryType::SelfConsistent, 0.6, 100.0, 0.0);
        assert!(ef.verify_settings().is_err());

        ef.set_boundary_condition(WallBoundaryType::SelfConsistent, 0.6, 100.0, 1.65);
        assert!(ef.verify_settings().is_ok());
    }

    #[test]
    fn test_dict_roundtrip() {
        let mut ef = ElectricFieldSettings::default();
        ef.set_prescribed_constant(0.2);
        let data = ef.to_dict().unwrap();
        assert_eq!(data["type"], serde_json::json!(1));
        assert_eq!(data["bc"]["type"], serde_json::json!(2));
        assert_eq!(ElectricFieldSettings::from_dict(&data).unwrap(), ef);
    }

    #[test]
    fn test_ragged_data_rejected() {
        let mut ef = ElectricFieldSettings::default();
        ef.data = Some(FieldData {
            t: vec![0.0],
            r: vec![0.0, 1.0],
            x: vec![vec![1.0]],
        });
        assert!(ef.verify_settings().is_err());
    }
}
