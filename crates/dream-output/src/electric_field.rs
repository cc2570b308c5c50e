// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Electric Field Output
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! The parallel electric field `E_field`, with normalization to the
//! critical and Dreicer fields saved among the other quantities.

use crate::fluid_quantity::{FluidQuantity, DEFAULT_PROFILE_RADIUS, DEFAULT_PROFILE_TIME};
use crate::other::OtherQuantities;
use crate::plot::{ContourPlot, LinePlot};
use dream_types::error::{DreamError, DreamResult};
use ndarray::{s, Array2, ArrayD};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const E_FIELD: &str = "E_field";

/// Reference fields an electric field may be normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormField {
    /// Effective critical field (Hesslow et al).
    Eceff,
    /// Connor-Hastie field with the free electron density.
    Ecfree,
    /// Connor-Hastie field with the total electron density.
    Ectot,
    /// Dreicer field.
    EDreic,
}

impl NormField {
    pub const ALL: [NormField; 4] = [
        NormField::Eceff,
        NormField::Ecfree,
        NormField::Ectot,
        NormField::EDreic,
    ];

    /// Name of the saved other quantity.
    pub fn as_str(&self) -> &'static str {
        match self {
            NormField::Eceff => "Eceff",
            NormField::Ecfree => "Ecfree",
            NormField::Ectot => "Ectot",
            NormField::EDreic => "EDreic",
        }
    }
}

impl FromStr for NormField {
    type Err = DreamError;

    /// Accepts the saved names and the aliases `Ec` (Ectot) and `ED` (EDreic).
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "Eceff" => Ok(NormField::Eceff),
            "Ecfree" => Ok(NormField::Ecfree),
            "Ectot" | "Ec" => Ok(NormField::Ectot),
            "EDreic" | "ED" => Ok(NormField::EDreic),
            _ => Err(DreamError::Output(format!(
                "Cannot normalize to '{name}': This seems to not make sense."
            ))),
        }
    }
}

impl fmt::Display for NormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// View of the electric field together with the other quantities of the
/// same output.
#[derive(Debug, Clone, Copy)]
pub struct ElectricField<'a> {
    quantity: &'a FluidQuantity,
    other: Option<&'a OtherQuantities>,
}

impl<'a> ElectricField<'a> {
    pub fn new(quantity: &'a FluidQuantity, other: Option<&'a OtherQuantities>) -> Self {
        ElectricField { quantity, other }
    }

    pub fn quantity(&self) -> &'a FluidQuantity {
        self.quantity
    }

    /// Fetch a normalizing field (`Eceff`, `Ecfree`, `Ectot`/`Ec`,
    /// `EDreic`/`ED`) from the other quantities.
    pub fn norm_field(&self, field: &str, r: Option<isize>, t: Option<isize>) -> DreamResult<ArrayD<f64>> {
        self.norm_quantity(field)?.get(r, t)
    }

    fn norm_quantity(&self, field: &str) -> DreamResult<&'a FluidQuantity> {
        let other = self.other.filter(|o| o.has_fluid()).ok_or_else(|| {
            DreamError::Output(
                "No \"other\" fluid quantities saved in output. Normalizing electric fields are thus not available."
                    .to_string(),
            )
        })?;
        let norm: NormField = field.parse()?;
        other.fluid(norm.as_str()).ok_or_else(|| {
            DreamError::Output(format!(
                "Cannot normalize to '{field}': quantity not saved to output after simulation."
            ))
        })
    }

    /// E divided by the named reference field.
    ///
    /// The reference field has no value at t = 0, so the first time slice
    /// reuses the second.
    pub fn normalize(&self, to: &str) -> DreamResult<FluidQuantity> {
        let reference = self.norm_quantity(to)?;
        let (nt, nr) = self.quantity.data().dim();
        if nt < 2 {
            return Err(DreamError::Output(format!(
                "Cannot normalize to '{to}': at least two time points are required."
            )));
        }
        if reference.data().dim() != (nt - 1, nr) {
            return Err(DreamError::Output(format!(
                "Cannot normalize to '{to}': size {} x {} does not match the electric field ({} x {nr}).",
                reference.nt(),
                reference.nr(),
                nt - 1
            )));
        }

        let mut enorm = Array2::<f64>::zeros((nt, nr));
        enorm.slice_mut(s![1.., ..]).assign(reference.data());
        let second = enorm.row(1).to_owned();
        enorm.row_mut(0).assign(&second);

        let data = self.quantity.data() / &enorm;
        FluidQuantity::new(
            &format!("E / {to}"),
            data,
            Arc::clone(&self.quantity.grid),
        )
    }

    /// Alias of [`ElectricField::normalize`].
    pub fn norm(&self, to: &str) -> DreamResult<FluidQuantity> {
        self.normalize(to)
    }

    fn maybe_normalized(&self, norm: Option<&str>) -> DreamResult<FluidQuantity> {
        match norm {
            Some(to) => self.normalize(to),
            None => Ok(self.quantity.clone()),
        }
    }

    pub fn plot(&self, norm: Option<&str>) -> DreamResult<ContourPlot> {
        Ok(self.maybe_normalized(norm)?.contour_plot())
    }

    pub fn plot_radial_profile(&self, norm: Option<&str>, t: Option<isize>) -> DreamResult<LinePlot> {
        self.maybe_normalized(norm)?
            .radial_profile_plot(t.unwrap_or(DEFAULT_PROFILE_TIME))
    }

    pub fn plot_time_profile(&self, norm: Option<&str>, r: Option<isize>) -> DreamResult<LinePlot> {
        self.maybe_normalized(norm)?
            .time_profile_plot(r.unwrap_or(DEFAULT_PROFILE_RADIUS))
    }
}
