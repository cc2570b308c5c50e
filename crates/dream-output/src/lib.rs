//! Accessors for DREAM simulation output.
//!
//! Output files are NumPy `.npz` archives holding the grid (`grid/t`,
//! `grid/r`), the unknowns of the equation system (`eqsys/<name>`) and
//! derived fluid quantities (`other/fluid/<name>`).

pub mod electric_field;
pub mod fluid_quantity;
pub mod grid;
pub mod other;
pub mod output;
pub mod plot;

pub use electric_field::{ElectricField, NormField};
pub use fluid_quantity::FluidQuantity;
pub use grid::OutputGrid;
pub use output::DreamOutput;
