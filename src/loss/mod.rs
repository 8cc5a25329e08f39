//! Regression losses between bootstrapped targets and predicted action-values.

pub mod functions;

pub use functions::{Loss, MSE};
