//! wavebake - Offline FFT ocean displacement baker
//!
//! Samples an octave-based wave spectrum at discrete times over a loop
//! period, packs the multi-resolution cascade fields into one buffer per
//! frame, and persists a half-precision time-indexed dataset a renderer can
//! sample without recomputing the spectrum.

pub mod bake;
pub mod cascade;
pub mod compose;
pub mod error;
pub mod evaluate;
pub mod params;
pub mod spectrum;
