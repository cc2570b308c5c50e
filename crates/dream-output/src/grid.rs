// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Output Grid
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use dream_types::error::{DreamError, DreamResult};
use ndarray::{s, Array1};

/// Time and radial grid of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputGrid {
    pub t: Array1<f64>,
    pub r: Array1<f64>,
}

impl OutputGrid {
    pub fn new(t: Array1<f64>, r: Array1<f64>) -> DreamResult<Self> {
        check_ascending("t", &t)?;
        check_ascending("r", &r)?;
        Ok(OutputGrid { t, r })
    }

    pub fn nt(&self) -> usize {
        self.t.len()
    }

    pub fn nr(&self) -> usize {
        self.r.len()
    }

    /// Grid of the derived quantities, which are not saved at t = 0.
    pub fn without_initial_time(&self) -> OutputGrid {
        let t = if self.t.is_empty() {
            Array1::zeros(0)
        } else {
            self.t.slice(s![1..]).to_owned()
        };
        OutputGrid {
            t,
            r: self.r.clone(),
        }
    }
}

fn check_ascending(name: &str, x: &Array1<f64>) -> DreamResult<()> {
    if x.is_empty() {
        return Err(DreamError::Output(format!("The grid '{name}' is empty.")));
    }
    if x.windows(2).into_iter().any(|w| !(w[1] > w[0])) {
        return Err(DreamError::Output(format!(
            "The grid '{name}' is not strictly increasing."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rejects_empty_and_unsorted() {
        assert!(OutputGrid::new(array![], array![0.1]).is_err());
        assert!(OutputGrid::new(array![0.0, 1.0], array![0.5, 0.2]).is_err());
        assert!(OutputGrid::new(array![0.0, 0.0], array![0.5]).is_err());
    }

    #[test]
    fn test_without_initial_time() {
        let g = OutputGrid::new(array![0.0, 1.0, 2.0], array![0.1, 0.5]).unwrap();
        let o = g.without_initial_time();
        assert_eq!(o.t, array![1.0, 2.0]);
        assert_eq!(o.r, g.r);
    }
}
