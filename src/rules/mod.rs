//! Predefined implementations of the host facing traits.

pub mod entropy;
pub mod scene;
