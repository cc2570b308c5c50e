// ─────────────────────────────────────────────────────────────────────
// DREAM-RS — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DreamError {
    /// Inconsistent or incomplete settings (grid, time stepper, root object).
    #[error("Settings error: {0}")]
    Settings(String),

    /// Invalid settings for a single unknown quantity (n_i, n_re, spi, ...).
    #[error("{module}: {message}")]
    Equation { module: &'static str, message: String },

    #[error("Unrecognized option code for '{option}': {code}")]
    UnknownOption { option: &'static str, code: i64 },

    #[error("Output error: {0}")]
    Output(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("NPZ error: {0}")]
    Npz(String),
}

impl DreamError {
    pub fn equation(module: &'static str, message: impl Into<String>) -> Self {
        DreamError::Equation {
            module,
            message: message.into(),
        }
    }
}

pub type DreamResult<T> = Result<T, DreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equation_error_is_prefixed_with_module() {
        let err = DreamError::equation("n_re", "Invalid value assigned to 'pCutAvalanche'.");
        assert_eq!(
            err.to_string(),
            "n_re: Invalid value assigned to 'pCutAvalanche'."
        );
    }

    #[test]
    fn test_unknown_option_message() {
        let err = DreamError::UnknownOption {
            option: "dreicer",
            code: 9,
        };
        assert_eq!(
            err.to_string(),
            "Unrecognized option code for 'dreicer': 9"
        );
    }
}
