//! Per-frame sampling: evaluate the wave field, pack it into one buffer.

use crate::cascade::CascadeConfig;
use crate::compose::CascadeCompositor;
use crate::error::BakeResult;
use crate::evaluate::{FieldRequest, WaveFieldEvaluator};
use crate::params::BakeParams;
use crate::spectrum::WaveSpectrum;

use super::FrameBuffer;

/// Samples one packed frame buffer per time step
///
/// Owns no state of its own: it borrows the evaluator and compositor for the
/// duration of the bake and threads the immutable request context through
/// both collaborators.
pub struct FrameSampler<'a, E, C>
where
    E: WaveFieldEvaluator + ?Sized,
    C: CascadeCompositor + ?Sized,
{
    evaluator: &'a mut E,
    compositor: &'a mut C,
    spectrum: &'a WaveSpectrum,
    params: &'a BakeParams,
    cascades: CascadeConfig,
}

impl<'a, E, C> FrameSampler<'a, E, C>
where
    E: WaveFieldEvaluator + ?Sized,
    C: CascadeCompositor + ?Sized,
{
    pub fn new(
        evaluator: &'a mut E,
        compositor: &'a mut C,
        spectrum: &'a WaveSpectrum,
        params: &'a BakeParams,
        cascades: CascadeConfig,
    ) -> Self {
        Self {
            evaluator,
            compositor,
            spectrum,
            params,
            cascades,
        }
    }

    /// Produce the packed buffer for one loop time
    ///
    /// One evaluator call and one compositor round-trip; an error from either
    /// collaborator propagates and aborts the bake.
    pub fn sample_frame(&mut self, time_s: f32) -> BakeResult<FrameBuffer> {
        let request = FieldRequest {
            time_s,
            loop_period_s: self.params.loop_period_s,
            resolution: self.params.resolution,
            cascades: self.cascades,
            wind: self.params.wind,
            spectrum: self.spectrum,
        };

        let fields = self.evaluator.evaluate(&request)?;
        self.compositor
            .composite(&fields, self.cascades, self.params.resolution)
    }
}
