//! Core math modules.

pub mod bernoulli;
pub mod stable;
