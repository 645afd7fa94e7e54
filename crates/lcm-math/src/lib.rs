//! Log-domain math utilities for latent class posterior inference.

pub mod math;

pub use math::bernoulli;
pub use math::stable::*;
