//! CPU reference evaluator: inverse-FFT synthesis of the octave spectrum.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::{BakeError, BakeResult};
use crate::evaluate::{CascadeField, FieldRequest, WaveFieldEvaluator};
use crate::spectrum::{NUM_OCTAVES, SMALLEST_WL_POW_2};

/// Gravitational acceleration (m/s^2), deep-water dispersion
const GRAVITY: f32 = 9.81;

/// Deterministic spectral wave evaluator
///
/// Synthesizes each cascade as a sum of wind-shaped sinusoids via a 2D
/// inverse FFT. Angular frequencies are quantized to integer multiples of
/// 2*pi / loop_period so the resulting animation loops exactly, and phases
/// are a pure hash of the frequency lattice coordinates, so evaluation is
/// reproducible with no RNG state.
pub struct SpectralEvaluator {
    planner: FftPlanner<f32>,
}

impl SpectralEvaluator {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    fn evaluate_cascade(
        &mut self,
        request: &FieldRequest,
        slice: u32,
    ) -> CascadeField {
        let n = request.resolution as usize;
        let cascade_index = request.cascades.first_cascade + slice as i32;
        let patch_m = request.cascades.world_size(slice);
        let dk = TAU / patch_m;

        let lowest = slice == 0;
        let highest = slice + 1 == request.cascades.cascade_count;

        // Band ownership: each wavelength is represented by exactly one
        // cascade. Interior cascades own [patch/2, patch); the lowest extends
        // down to its Nyquist wavelength, the highest keeps its fundamental.
        let band_min_m = if lowest {
            2.0 * patch_m / n as f32
        } else {
            0.5 * patch_m
        };

        let wind_dir = Vec2::from_angle(request.wind.direction_rad);
        let cutoff_m = request.wind.speed_mps * request.wind.speed_mps / GRAVITY;
        let turbulence = request.wind.turbulence;

        let mut height_spec = vec![Complex::new(0.0, 0.0); n * n];
        let mut dx_spec = vec![Complex::new(0.0, 0.0); n * n];
        let mut dz_spec = vec![Complex::new(0.0, 0.0); n * n];

        for row in 0..n {
            let sz = signed_freq(row, n);
            for col in 0..n {
                let sx = signed_freq(col, n);
                if sx == 0 && sz == 0 {
                    continue;
                }

                let k = Vec2::new(sx as f32 * dk, sz as f32 * dk);
                let k_len = k.length();
                let wavelength_m = TAU / k_len;

                if wavelength_m < band_min_m {
                    continue;
                }
                if !highest && wavelength_m >= patch_m {
                    continue;
                }

                let octave = (wavelength_m.log2() - SMALLEST_WL_POW_2 as f32).floor();
                if octave < 0.0 || octave >= NUM_OCTAVES as f32 {
                    continue;
                }
                let octave = octave as usize;
                if !request.spectrum.octave_active(octave) {
                    continue;
                }
                let power = request.spectrum.octave_power(octave);

                // Phillips-style cutoff: waves longer than the wind can
                // sustain are attenuated
                let kl = k_len * cutoff_m;
                let sustain = (-1.0 / (kl * kl)).exp();

                let k_hat = k / k_len;
                let alignment = k_hat.dot(wind_dir).max(0.0);
                let spreading = turbulence + (1.0 - turbulence) * alignment * alignment;

                let amplitude = (2.0 * power * sustain * spreading).sqrt() * dk / k_len;
                if amplitude == 0.0 {
                    continue;
                }

                // Quantize dispersion to whole cycles per loop period
                let omega = (GRAVITY * k_len).sqrt();
                let cycles = (omega * request.loop_period_s / TAU).round().max(1.0);
                let omega_looped = cycles * TAU / request.loop_period_s;

                let phase = hash_phase(cascade_index, sx, sz) + omega_looped * request.time_s;
                let mode = Complex::from_polar(amplitude, phase);

                let idx = row * n + col;
                height_spec[idx] = mode;
                // Horizontal displacement: i * k_hat * H(k) (choppy waves)
                dx_spec[idx] = mode * Complex::new(0.0, k_hat.x);
                dz_spec[idx] = mode * Complex::new(0.0, k_hat.y);
            }
        }

        let fft = self.planner.plan_fft_inverse(n);
        ifft2(&mut height_spec, n, &fft);
        ifft2(&mut dx_spec, n, &fft);
        ifft2(&mut dz_spec, n, &fft);

        CascadeField {
            cascade_index,
            displace_x: dx_spec.iter().map(|c| c.re).collect(),
            height: height_spec.iter().map(|c| c.re).collect(),
            displace_z: dz_spec.iter().map(|c| c.re).collect(),
        }
    }
}

impl Default for SpectralEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveFieldEvaluator for SpectralEvaluator {
    fn evaluate(&mut self, request: &FieldRequest) -> BakeResult<Vec<CascadeField>> {
        let any_active = (0..NUM_OCTAVES).any(|octave| request.spectrum.octave_active(octave));
        if !any_active {
            return Err(BakeError::evaluator(
                "spectrum has no active octaves above the noise floor",
            ));
        }

        Ok((0..request.cascades.cascade_count)
            .map(|slice| self.evaluate_cascade(request, slice))
            .collect())
    }
}

/// Signed frequency index in standard FFT ordering
fn signed_freq(index: usize, n: usize) -> i32 {
    if index < n / 2 {
        index as i32
    } else {
        index as i32 - n as i32
    }
}

/// In-place 2D inverse FFT: rows, then columns
fn ifft2(grid: &mut [Complex<f32>], n: usize, fft: &Arc<dyn Fft<f32>>) {
    for row in grid.chunks_exact_mut(n) {
        fft.process(row);
    }

    let mut column = vec![Complex::new(0.0, 0.0); n];
    for x in 0..n {
        for y in 0..n {
            column[y] = grid[y * n + x];
        }
        fft.process(&mut column);
        for y in 0..n {
            grid[y * n + x] = column[y];
        }
    }
}

/// Deterministic phase from the frequency lattice position (lowbias32 mix)
fn hash_phase(cascade_index: i32, kx: i32, kz: i32) -> f32 {
    let mut h = (cascade_index as u32).wrapping_mul(0x9E37_79B9)
        ^ (kx as u32).wrapping_mul(0x85EB_CA6B)
        ^ (kz as u32).wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7FEB_352D);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846C_A68B);
    h ^= h >> 16;
    (h as f32 / u32::MAX as f32) * TAU
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CascadeConfig;
    use crate::params::WindParams;
    use crate::spectrum::WaveSpectrum;

    fn request(spectrum: &WaveSpectrum, time_s: f32) -> FieldRequest {
        let range = spectrum.resolve_range(1.0);
        let cascades = CascadeConfig::from_octave_range(range, 1.0, 32).unwrap();
        FieldRequest {
            time_s,
            loop_period_s: 16.0,
            resolution: 32,
            cascades,
            wind: WindParams::default(),
            spectrum,
        }
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let spectrum = WaveSpectrum::moderate();
        let mut evaluator = SpectralEvaluator::new();

        let first = evaluator.evaluate(&request(&spectrum, 3.5)).unwrap();
        let second = evaluator.evaluate(&request(&spectrum, 3.5)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_field_loops_exactly() {
        let spectrum = WaveSpectrum::moderate();
        let mut evaluator = SpectralEvaluator::new();

        let start = evaluator.evaluate(&request(&spectrum, 0.0)).unwrap();
        let wrapped = evaluator.evaluate(&request(&spectrum, 16.0)).unwrap();

        for (a, b) in start.iter().zip(&wrapped) {
            for (x, y) in a.height.iter().zip(&b.height) {
                assert!((x - y).abs() < 1e-3, "loop mismatch: {} vs {}", x, y);
            }
        }
    }

    #[test]
    fn test_active_spectrum_produces_motion() {
        let spectrum = WaveSpectrum::stormy();
        let mut evaluator = SpectralEvaluator::new();

        let fields = evaluator.evaluate(&request(&spectrum, 1.0)).unwrap();

        assert_eq!(fields.len() as u32, request(&spectrum, 1.0).cascades.cascade_count);
        let energy: f32 = fields
            .iter()
            .flat_map(|f| f.height.iter())
            .map(|h| h.abs())
            .sum();
        assert!(energy > 0.0);
    }

    #[test]
    fn test_silent_spectrum_is_rejected() {
        let spectrum = WaveSpectrum::silent();
        let mut evaluator = SpectralEvaluator::new();

        let cascades = CascadeConfig {
            first_cascade: 5,
            cascade_count: 2,
        };
        let request = FieldRequest {
            time_s: 0.0,
            loop_period_s: 16.0,
            resolution: 32,
            cascades,
            wind: WindParams::default(),
            spectrum: &spectrum,
        };

        assert!(matches!(
            evaluator.evaluate(&request),
            Err(BakeError::Evaluator(_))
        ));
    }
}
