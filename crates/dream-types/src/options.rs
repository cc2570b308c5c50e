// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Option Codes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Integer option codes understood by the DREAM solver.
//!
//! Every option is a Rust enum that serializes as its integer code, so a
//! settings file written from these types is readable by the solver and
//! an unknown code is rejected at load time.

use crate::error::DreamError;
use serde::{Deserialize, Serialize};

macro_rules! option_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Integer code written to the settings file.
            pub const fn code(self) -> i64 {
                match self {
                    $( $name::$variant => $code ),+
                }
            }
        }

        impl TryFrom<i64> for $name {
            type Error = DreamError;

            fn try_from(code: i64) -> Result<Self, Self::Error> {
                match code {
                    $( $code => Ok($name::$variant), )+
                    _ => Err(DreamError::UnknownOption { option: $label, code }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.code()
            }
        }
    };
}

// ── Grids ────────────────────────────────────────────────────────────

option_enum! {
    /// Momentum grid coordinates.
    MomentumGridType, "type" {
        PXi = 1,
        PparPperp = 2,
    }
}

option_enum! {
    PGridType, "pgrid" {
        Uniform = 1,
        /// Two uniform sections with different spacing, split at `psep`.
        Biuniform = 2,
    }
}

option_enum! {
    XiGridType, "xigrid" {
        Uniform = 1,
    }
}

// ── Time stepper ─────────────────────────────────────────────────────

option_enum! {
    TimeStepperType, "timestep/type" {
        Constant = 1,
        Adaptive = 2,
    }
}

// ── Unknown quantities ───────────────────────────────────────────────

option_enum! {
    EFieldType, "E_field/type" {
        Prescribed = 1,
        SelfConsistent = 2,
    }
}

option_enum! {
    /// Boundary condition for the self-consistent electric field at r = b.
    WallBoundaryType, "E_field/bc/type" {
        Prescribed = 1,
        SelfConsistent = 2,
    }
}

option_enum! {
    /// Ion evolution method.
    ///
    /// Negative codes are conveniences of this interface: they initialize
    /// every ion in one charge state and resolve to a solver type.
    IonType, "n_i/types" {
        Prescribed = 1,
        Equilibrium = 2,
        Dynamic = 3,
        DynamicNeutral = -1,
        DynamicFullyIonized = -2,
        PrescribedNeutral = -3,
        PrescribedFullyIonized = -4,
    }
}

impl IonType {
    /// True for the types the solver itself understands.
    pub fn is_solver_type(self) -> bool {
        self.code() > 0
    }
}

option_enum! {
    IonizationMode, "n_i/ionization" {
        Fluid = 1,
        Kinetic = 2,
        KineticApproxJac = 3,
    }
}

// ── Runaway generation ───────────────────────────────────────────────

option_enum! {
    DreicerRate, "dreicer" {
        Disabled = 1,
        ConnorHastieNoCorr = 2,
        ConnorHastie = 3,
        NeuralNetwork = 4,
    }
}

option_enum! {
    /// Effective critical field model used in the avalanche growth rate.
    EceffMode, "Eceff" {
        Cylindrical = 1,
        Simple = 2,
        Full = 3,
    }
}

option_enum! {
    AvalancheMode, "avalanche" {
        Neglect = 1,
        Fluid = 2,
        Kinetic = 3,
    }
}

option_enum! {
    ComptonRate, "compton" {
        Neglect = 1,
        IterDms = 2,
    }
}

// ── Shattered pellet injection ───────────────────────────────────────

option_enum! {
    SpiVelocityMode, "velocity" {
        None = 1,
        Prescribed = 2,
    }
}

option_enum! {
    SpiAblationMode, "ablation" {
        Neglect = 1,
        FluidNgs = 2,
        KineticNgs = 3,
    }
}

option_enum! {
    SpiDepositionMode, "deposition" {
        Neglect = 1,
        Local = 2,
        LocalLastFluxTube = 3,
        LocalGaussian = 4,
    }
}

option_enum! {
    SpiHeatAbsorptionMode, "heatAbsorbtion" {
        Neglect = 1,
        LocalFluidNgs = 2,
        LocalFluidNgsGaussian = 3,
    }
}

option_enum! {
    SpiCloudRadiusMode, "cloudRadiusMode" {
        Neglect = 1,
        PrescribedConstant = 2,
        SelfConsistent = 3,
    }
}
