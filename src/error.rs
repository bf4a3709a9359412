use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Range error: {0}")]
    Range(String),

    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),

    #[error("{what} did not converge after {iterations} iterations")]
    Convergence {
        what: &'static str,
        iterations: usize,
    },

    #[error("Non-finite state at t = {t}")]
    NonFiniteState { t: f64 },
}

pub type Result<T> = std::result::Result<T, SolverError>;
