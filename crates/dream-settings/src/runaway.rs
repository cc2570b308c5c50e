// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Runaway Electrons
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Settings for the runaway electron density `n_re`.
//!
//! Selects which generation mechanisms (Dreicer, avalanche, Compton)
//! feed the runaway population and how the effective critical field is
//! evaluated.

use dream_types::error::{DreamError, DreamResult};
use dream_types::options::{AvalancheMode, ComptonRate, DreicerRate, EceffMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const MODULE: &str = "n_re";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunawayElectrons {
    pub avalanche: AvalancheMode,
    pub dreicer: DreicerRate,
    pub compton: ComptonRate,
    #[serde(rename = "Eceff")]
    pub eceff: EceffMode,
    /// Momentum above which knock-on electrons count as runaways.
    /// Mandatory with kinetic avalanche.
    #[serde(rename = "pCutAvalanche")]
    pub p_cut_avalanche: f64,
}

impl Default for RunawayElectrons {
    fn default() -> Self {
        RunawayElectrons {
            avalanche: AvalancheMode::Neglect,
            dreicer: DreicerRate::Disabled,
            compton: ComptonRate::Neglect,
            eceff: EceffMode::Cylindrical,
            p_cut_avalanche: 0.0,
        }
    }
}

impl RunawayElectrons {
    pub fn set_avalanche(&mut self, avalanche: AvalancheMode, p_cut_avalanche: f64) {
        self.avalanche = avalanche;
        self.p_cut_avalanche = p_cut_avalanche;
    }

    pub fn set_dreicer(&mut self, dreicer: DreicerRate) {
        self.dreicer = dreicer;
    }

    pub fn set_compton(&mut self, compton: ComptonRate) {
        self.compton = compton;
    }

    pub fn set_eceff(&mut self, eceff: EceffMode) {
        self.eceff = eceff;
    }

    pub fn to_dict(&self) -> DreamResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_dict(data: &Value) -> DreamResult<Self> {
        serde_json::from_value(data.clone())
            .map_err(|e| DreamError::equation(MODULE, format!("Invalid settings: {e}")))
    }

    pub fn verify_settings(&self) -> DreamResult<()> {
        if !self.p_cut_avalanche.is_finite() || self.p_cut_avalanche < 0.0 {
            return Err(DreamError::equation(
                MODULE,
                format!(
                    "Invalid value assigned to 'pCutAvalanche': {}. Must be >= 0.",
                    self.p_cut_avalanche
                ),
            ));
        }
        if self.avalanche == AvalancheMode::Kinetic && self.p_cut_avalanche == 0.0 {
            return Err(DreamError::equation(
                MODULE,
                "Invalid value assigned to 'pCutAvalanche'. Must be set explicitly when using KINETIC avalanche.",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_dict_codes() {
        let data = RunawayElectrons::default().to_dict().unwrap();
        assert_eq!(
            data,
            json!({
                "avalanche": 1,
                "dreicer": 1,
                "compton": 1,
                "Eceff": 1,
                "pCutAvalanche": 0.0,
            })
        );
    }

    #[test]
    fn test_from_dict() {
        let data = json!({
            "avalanche": 2,
            "dreicer": 4,
            "compton": 2,
            "Eceff": 3,
            "pCutAvalanche": 0.0,
        });
        let re = RunawayElectrons::from_dict(&data).unwrap();
        assert_eq!(re.avalanche, AvalancheMode::Fluid);
        assert_eq!(re.dreicer, DreicerRate::NeuralNetwork);
        assert_eq!(re.compton, ComptonRate::IterDms);
        assert_eq!(re.eceff, EceffMode::Full);
    }

    #[test]
    fn test_from_dict_rejects_unknown_code() {
        let data = json!({
            "avalanche": 4,
            "dreicer": 1,
            "compton": 1,
            "Eceff": 1,
            "pCutAvalanche": 0.0,
        });
        let err = RunawayElectrons::from_dict(&data).unwrap_err();
        assert!(err.to_string().starts_with("n_re:"));
    }

    #[test]
    fn test_kinetic_avalanche_requires_pcut() {
        let mut re = RunawayElectrons::default();
        re.set_avalanche(AvalancheMode::Kinetic, 0.0);
        assert!(re.verify_settings().is_err());

        re.set_avalanche(AvalancheMode::Kinetic, 0.1);
        assert!(re.verify_settings().is_ok());

        re.set_avalanche(AvalancheMode::Fluid, 0.0);
        assert!(re.verify_settings().is_ok());
    }

    #[test]
    fn test_negative_pcut_rejected() {
        let mut re = RunawayElectrons::default();
        re.set_avalanche(AvalancheMode::Fluid, -1.0);
        assert!(re.verify_settings().is_err());
    }
}
