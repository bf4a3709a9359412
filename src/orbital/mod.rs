pub mod elements;
pub mod kepler;
pub mod newton;

pub use elements::OrbitalElements;
pub use kepler::{AnomalyType, KeplerConfig, KeplerPropagator};
pub use newton::{newton_raphson, solve_kepler};
