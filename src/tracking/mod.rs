pub mod estimator;
pub mod navigator;
