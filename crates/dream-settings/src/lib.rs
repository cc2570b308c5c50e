// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Settings
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Input settings for the DREAM runaway electron solver.
//!
//! Every settings object converts to and from the dictionary layout read
//! by the solver (`to_dict` / `from_dict`) and checks itself with
//! `verify_settings` before it is written.

pub mod dict;
pub mod electric_field;
pub mod ions;
pub mod momentum_grid;
pub mod runaway;
pub mod settings;
pub mod spi;
pub mod time_stepper;

pub use settings::DreamSettings;
