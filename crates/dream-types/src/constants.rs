// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Avogadro constant (1/mol)
pub const N_A: f64 = 6.02214076e23;

/// Isotope code for a naturally occurring mix.
pub const ISOTOPE_NATURAL: i64 = 0;

/// Solid pellet material data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PelletMaterial {
    pub z: i64,
    /// Mass number, or `ISOTOPE_NATURAL`.
    pub isotope: i64,
    /// Molar mass (kg/mol)
    pub molar_mass: f64,
    /// Solid density (kg/m^3)
    pub solid_density: f64,
}

/// Pellet materials with known solid-state data: deuterium, hydrogen, neon.
pub const PELLET_MATERIALS: [PelletMaterial; 3] = [
    PelletMaterial {
        z: 1,
        isotope: 2,
        molar_mass: 0.0020141,
        solid_density: 205.9,
    },
    PelletMaterial {
        z: 1,
        isotope: ISOTOPE_NATURAL,
        molar_mass: 0.001008,
        solid_density: 86.0,
    },
    PelletMaterial {
        z: 10,
        isotope: ISOTOPE_NATURAL,
        molar_mass: 0.020183,
        solid_density: 1444.0,
    },
];

/// Look up solid-state data for the species (Z, isotope).
pub fn pellet_material(z: i64, isotope: i64) -> Option<&'static PelletMaterial> {
    PELLET_MATERIALS
        .iter()
        .find(|m| m.z == z && m.isotope == isotope)
}
