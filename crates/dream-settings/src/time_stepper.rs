// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Time Stepper
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Time stepper settings (`timestep`).

use dream_types::error::{DreamError, DreamResult};
use dream_types::options::TimeStepperType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MODULE: &str = "timestep";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStepper {
    #[serde(rename = "type")]
    pub ttype: TimeStepperType,
    pub tmax: f64,
    /// Fixed step length; zero when `nt` is used instead.
    #[serde(default)]
    pub dt: f64,
    /// Number of steps; zero when `dt` is used instead.
    #[serde(default)]
    pub nt: usize,
}

impl Default for TimeStepper {
    fn default() -> Self {
        TimeStepper {
            ttype: TimeStepperType::Constant,
            tmax: 0.0,
            dt: 0.0,
            nt: 0,
        }
    }
}

impl TimeStepper {
    pub fn constant_dt(tmax: f64, dt: f64) -> Self {
        TimeStepper {
            tmax,
            dt,
            ..Default::default()
        }
    }

    pub fn constant_nt(tmax: f64, nt: usize) -> Self {
        TimeStepper {
            tmax,
            nt,
            ..Default::default()
        }
    }

    pub fn set_tmax(&mut self, tmax: f64) {
        self.tmax = tmax;
    }

    /// Use a fixed step length. Clears `nt`.
    pub fn set_dt(&mut self, dt: f64) {
        self.dt = dt;
        self.nt = 0;
    }

    /// Use a fixed number of steps. Clears `dt`.
    pub fn set_nt(&mut self, nt: usize) {
        self.nt = nt;
        self.dt = 0.0;
    }

    /// Number of steps the solver will take.
    pub fn step_count(&self) -> DreamResult<usize> {
        self.verify_settings()?;
        if self.nt > 0 {
            Ok(self.nt)
        } else {
            Ok((self.tmax / self.dt).ceil() as usize)
        }
    }

    pub fn to_dict(&self) -> DreamResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        serde_json::from_value(data.clone())
            .map_err(|e| DreamError::equation(MODULE, format!("Invalid settings: {e}")))
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        if self.ttype != TimeStepperType::Constant {
            return Err(DreamError::equation(
                MODULE,
                format!("Unsupported time stepper type: {}.", self.ttype.code()),
            ));
        }
        if !(self.tmax.is_finite() && self.tmax > 0.0) {
            return Err(DreamError::equation(
                MODULE,
                format!("Invalid value assigned to 'tmax': {}. Must be positive.", self.tmax),
            ));
        }
        let has_dt = self.dt > 0.0;
        let has_nt = self.nt > 0;
        if self.dt < 0.0 || self.dt.is_nan() {
            return Err(DreamError::equation(
                MODULE,
                format!("Invalid value assigned to 'dt': {}.", self.dt),
            ));
        }
        match (has_dt, has_nt) {
            (true, true) => Err(DreamError::equation(
                MODULE,
                "Both 'dt' and 'nt' have been set. Only one may be specified.",
            )),
            (false, false) => Err(DreamError::equation(
                MODULE,
                "Neither 'dt' nor 'nt' has been set.",
            )),
            _ => Ok(()),
        }
    }
}
