//! The bake pipeline: resolve, configure, sample, accumulate, build.

mod accumulate;
mod dataset;
mod sampler;

pub use accumulate::BakeAccumulator;
pub use dataset::{BakedDataset, DatasetSink, FileSink};
pub use sampler::FrameSampler;

use crate::cascade::CascadeConfig;
use crate::compose::CascadeCompositor;
use crate::error::BakeResult;
use crate::evaluate::WaveFieldEvaluator;
use crate::params::BakeParams;
use crate::spectrum::WaveSpectrum;

/// One packed time step: 4-channel displacement texels, cascades stacked
/// vertically (height = resolution * cascade_count rows of `resolution`)
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    pub resolution: u32,
    pub cascade_count: u32,
    pub samples: Vec<[f32; 4]>,
}

impl FrameBuffer {
    /// Rows in the packed buffer
    pub fn height(&self) -> u32 {
        self.resolution * self.cascade_count
    }
}

/// Run one complete bake
///
/// A strictly linear one-shot sequence: resolve the octave range, derive the
/// cascade pyramid, sample every frame across the loop period, accumulate
/// into the flattened half-precision sequence, and build the dataset.
/// Spectrum and parameter problems surface before any frame is evaluated; a
/// frame failure aborts the bake and discards everything accumulated so far.
pub fn bake<E, C>(
    spectrum: &WaveSpectrum,
    params: &BakeParams,
    evaluator: &mut E,
    compositor: &mut C,
) -> BakeResult<BakedDataset>
where
    E: WaveFieldEvaluator + ?Sized,
    C: CascadeCompositor + ?Sized,
{
    params.validate()?;

    let range = spectrum.resolve_range(params.min_wavelength_m);
    let cascades = CascadeConfig::from_octave_range(range, params.min_wavelength_m, params.resolution)?;
    let frame_count = params.frame_count();

    log::info!(
        "baking {} frames of {}x{} texels ({} cascades from index {})",
        frame_count,
        params.resolution,
        params.resolution * cascades.cascade_count,
        cascades.cascade_count,
        cascades.first_cascade,
    );

    let samples_per_frame =
        (params.resolution * params.resolution * cascades.cascade_count * 4) as usize;
    let mut accumulator = BakeAccumulator::with_capacity(frame_count as usize * samples_per_frame);
    let mut sampler = FrameSampler::new(evaluator, compositor, spectrum, params, cascades);

    let step_s = params.loop_period_s / frame_count as f32;
    for frame in 0..frame_count {
        let frame_buffer = sampler.sample_frame(frame as f32 * step_s)?;
        accumulator.push_frame(frame_buffer);
        log::debug!("sampled frame {}/{}", frame + 1, frame_count);
    }

    let (samples, min_value, max_value) = accumulator.finish();
    log::info!("value bounds [{}, {}]", min_value, max_value);

    Ok(BakedDataset::build(
        params.loop_period_s,
        params.resolution,
        cascades,
        frame_count,
        min_value,
        max_value,
        samples,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::CpuCompositor;
    use crate::error::{BakeError, BakeResult};
    use crate::evaluate::{CascadeField, FieldRequest};
    use crate::spectrum::WaveSpectrum;

    /// Deterministic stand-in evaluator: every sample equals the request time
    struct ConstantTimeEvaluator {
        calls: u32,
        fail_at_call: Option<u32>,
    }

    impl ConstantTimeEvaluator {
        fn new() -> Self {
            Self {
                calls: 0,
                fail_at_call: None,
            }
        }
    }

    impl WaveFieldEvaluator for ConstantTimeEvaluator {
        fn evaluate(&mut self, request: &FieldRequest) -> BakeResult<Vec<CascadeField>> {
            self.calls += 1;
            if self.fail_at_call == Some(self.calls) {
                return Err(BakeError::evaluator("synthetic device loss"));
            }

            let len = (request.resolution * request.resolution) as usize;
            Ok(request
                .cascades
                .indices()
                .map(|cascade_index| CascadeField {
                    cascade_index,
                    displace_x: vec![request.time_s; len],
                    height: vec![request.time_s; len],
                    displace_z: vec![request.time_s; len],
                })
                .collect())
        }
    }

    /// Spectrum with exactly two adjacent active octaves, giving 3 cascades
    fn two_octave_spectrum() -> WaveSpectrum {
        let mut spectrum = WaveSpectrum::silent();
        for octave in [3, 4] {
            spectrum.power_log[octave] = 1.0;
            spectrum.disabled[octave] = false;
        }
        spectrum
    }

    fn params(resolution: u32, loop_period_s: f32, frames_per_second: f32) -> BakeParams {
        BakeParams {
            resolution,
            loop_period_s,
            frames_per_second,
            ..BakeParams::default()
        }
    }

    #[test]
    fn test_flattened_sample_count_scenario() {
        // 16 frames, resolution 32, 3 cascades: 16 * 32 * (32*3) * 4 samples
        let spectrum = two_octave_spectrum();
        let params = params(32, 2.0, 8.0);
        let mut evaluator = ConstantTimeEvaluator::new();

        let dataset = bake(&spectrum, &params, &mut evaluator, &mut CpuCompositor).unwrap();

        assert_eq!(dataset.frame_count, 16);
        assert_eq!(dataset.cascade_count, 3);
        assert_eq!(dataset.samples.len(), 196_608);
    }

    #[test]
    fn test_frames_flatten_in_time_order() {
        let spectrum = two_octave_spectrum();
        let params = params(4, 2.0, 2.0);
        let mut evaluator = ConstantTimeEvaluator::new();

        let dataset = bake(&spectrum, &params, &mut evaluator, &mut CpuCompositor).unwrap();

        // Every sample of frame k equals t_k, and t_k strictly increases
        let per_frame = dataset.samples.len() / dataset.frame_count as usize;
        let mut previous = f32::NEG_INFINITY;
        for chunk in dataset.samples.chunks_exact(per_frame) {
            let t = chunk[0].to_f32();
            assert!(chunk.iter().all(|s| s.to_f32() == t));
            assert!(t > previous);
            previous = t;
        }
    }

    #[test]
    fn test_bounds_cover_every_sample() {
        let spectrum = two_octave_spectrum();
        let params = params(8, 2.0, 4.0);
        let mut evaluator = ConstantTimeEvaluator::new();

        let dataset = bake(&spectrum, &params, &mut evaluator, &mut CpuCompositor).unwrap();

        let min = dataset.min_value.to_f32();
        let max = dataset.max_value.to_f32();
        assert!(dataset
            .samples
            .iter()
            .all(|s| min <= s.to_f32() && s.to_f32() <= max));
        // The stub makes bounds exact: first frame time and last frame time
        assert_eq!(min, 0.0);
        assert_eq!(max, 2.0 - 2.0 / dataset.frame_count as f32);
    }

    #[test]
    fn test_identical_requests_bake_identical_datasets() {
        let spectrum = two_octave_spectrum();
        let params = params(8, 2.0, 4.0);

        let first = bake(
            &spectrum,
            &params,
            &mut ConstantTimeEvaluator::new(),
            &mut CpuCompositor,
        )
        .unwrap();
        let second = bake(
            &spectrum,
            &params,
            &mut ConstantTimeEvaluator::new(),
            &mut CpuCompositor,
        )
        .unwrap();

        assert_eq!(first.samples, second.samples);
        assert_eq!(first.min_value, second.min_value);
        assert_eq!(first.max_value, second.max_value);
    }

    #[test]
    fn test_invalid_spectrum_aborts_before_sampling() {
        let spectrum = WaveSpectrum::silent();
        let params = params(8, 2.0, 4.0);
        let mut evaluator = ConstantTimeEvaluator::new();

        let result = bake(&spectrum, &params, &mut evaluator, &mut CpuCompositor);

        assert!(matches!(result, Err(BakeError::InvalidSpectrum(_))));
        assert_eq!(evaluator.calls, 0);
    }

    #[test]
    fn test_evaluator_failure_aborts_frame_loop() {
        let spectrum = two_octave_spectrum();
        let params = params(8, 2.0, 4.0);
        let mut evaluator = ConstantTimeEvaluator::new();
        evaluator.fail_at_call = Some(3);

        let result = bake(&spectrum, &params, &mut evaluator, &mut CpuCompositor);

        assert!(matches!(result, Err(BakeError::Evaluator(_))));
        // The loop stopped at the failing frame rather than running to the end
        assert_eq!(evaluator.calls, 3);
    }

    #[test]
    fn test_invalid_params_rejected_first() {
        let spectrum = two_octave_spectrum();
        let params = params(13, 2.0, 4.0);
        let mut evaluator = ConstantTimeEvaluator::new();

        let result = bake(&spectrum, &params, &mut evaluator, &mut CpuCompositor);

        assert!(matches!(result, Err(BakeError::InvalidParams(_))));
        assert_eq!(evaluator.calls, 0);
    }
}
