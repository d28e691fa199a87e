//! Wave-field evaluation: collaborator contract and raw per-cascade fields.

mod spectral;

pub use spectral::SpectralEvaluator;

use crate::cascade::CascadeConfig;
use crate::error::BakeResult;
use crate::params::WindParams;
use crate::spectrum::WaveSpectrum;

/// One evaluation request: the wave field at a single loop time
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'a> {
    /// Loop time in seconds, within [0, loop_period_s)
    pub time_s: f32,

    /// Loop period in seconds
    pub loop_period_s: f32,

    /// Grid resolution per cascade
    pub resolution: u32,

    /// Cascade pyramid to cover
    pub cascades: CascadeConfig,

    /// Wind forcing
    pub wind: WindParams,

    /// Octave power settings
    pub spectrum: &'a WaveSpectrum,
}

/// Raw displacement field of a single cascade: three scalar planes,
/// each resolution * resolution samples in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeField {
    /// Global cascade index
    pub cascade_index: i32,

    pub displace_x: Vec<f32>,
    pub height: Vec<f32>,
    pub displace_z: Vec<f32>,
}

/// Produces the per-cascade raw fields for one loop time
///
/// Implementations must be deterministic: the same request always yields the
/// same field stack, so a bake is reproducible.
pub trait WaveFieldEvaluator {
    fn evaluate(&mut self, request: &FieldRequest) -> BakeResult<Vec<CascadeField>>;
}
