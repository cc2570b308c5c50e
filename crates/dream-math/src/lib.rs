//! Mathematical primitives for DREAM-RS.

pub mod interp;
pub mod quadrature;
pub mod special;
