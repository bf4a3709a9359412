//! Runge-Kutta-Fehlberg 4(5) coefficients
//!
//! Six-stage embedded pair from Fehlberg, E. (1969), "Low-order classical
//! Runge-Kutta formulas with stepsize control and their application to
//! some heat transfer problems", NASA TR R-315.
//!
//! The 5th-order weights advance the solution; the difference between
//! the 5th- and 4th-order weights gives the local error estimate.

/// Number of stages
pub const STAGES: usize = 6;

/// Nodes: stage i is evaluated at t + C[i] * h
pub const C: [f64; STAGES] = [0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0];

/// Stage matrix, A[i][j] for j < i
pub const A: [[f64; 5]; STAGES] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 4.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 32.0, 9.0 / 32.0, 0.0, 0.0, 0.0],
    [1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0, 0.0, 0.0],
    [439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0, 0.0],
    [-8.0 / 27.0, 2.0, -3544.0 / 2565.0, 1859.0 / 4104.0, -11.0 / 40.0],
];

/// 5th-order solution weights
pub const B: [f64; STAGES] = [
    16.0 / 135.0,
    0.0,
    6656.0 / 12825.0,
    28561.0 / 56430.0,
    -9.0 / 50.0,
    2.0 / 55.0,
];

/// Error weights: 5th-order minus 4th-order weights
pub const B_ERR: [f64; STAGES] = [
    1.0 / 360.0,
    0.0,
    -128.0 / 4275.0,
    -2197.0 / 75240.0,
    1.0 / 50.0,
    2.0 / 55.0,
];
