//! Wave spectrum octaves and active-range resolution.

/// Number of discrete frequency bands in a spectrum
pub const NUM_OCTAVES: usize = 14;

/// Octave i covers wavelengths starting at 2^(SMALLEST_WL_POW_2 + i) meters
pub const SMALLEST_WL_POW_2: i32 = 1;

/// Noise floor exponent: octaves with power at or below 10^MIN_POWER_LOG are absent
pub const MIN_POWER_LOG: f32 = -8.0;

/// Per-octave wave power settings (log10 scale) with disabled flags
#[derive(Debug, Clone)]
pub struct WaveSpectrum {
    /// Power per octave, log10 scale
    pub power_log: [f32; NUM_OCTAVES],

    /// Octaves switched off regardless of power
    pub disabled: [bool; NUM_OCTAVES],
}

/// Contiguous range of octaves that must be represented by the cascade pyramid
///
/// `smallest` is set at most once during resolution (first qualifying octave
/// wins); `largest` tracks the last active octave seen. Both `None` means the
/// spectrum has no active octaves at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctaveRange {
    pub smallest: Option<usize>,
    pub largest: Option<usize>,
}

impl OctaveRange {
    /// True when no octave was active during resolution
    pub fn is_empty(&self) -> bool {
        self.largest.is_none()
    }
}

impl WaveSpectrum {
    /// Spectrum with every octave disabled
    pub fn silent() -> Self {
        Self {
            power_log: [MIN_POWER_LOG; NUM_OCTAVES],
            disabled: [true; NUM_OCTAVES],
        }
    }

    /// Spectrum shaped as a swell peak with quadratic log-power falloff
    ///
    /// # Arguments
    /// * `peak_octave` - Octave index carrying the most energy
    /// * `peak_power_log` - log10 power at the peak
    pub fn swell(peak_octave: usize, peak_power_log: f32) -> Self {
        let mut spectrum = Self::silent();
        for i in 0..NUM_OCTAVES {
            let distance = i as f32 - peak_octave as f32;
            spectrum.power_log[i] = peak_power_log - 0.5 * distance * distance;
            spectrum.disabled[i] = false;
        }
        spectrum
    }

    /// Light wind, short waves
    pub fn calm() -> Self {
        Self::swell(2, 0.5)
    }

    /// Typical open-sea conditions
    pub fn moderate() -> Self {
        Self::swell(4, 1.5)
    }

    /// Heavy swell with long-wavelength energy
    pub fn stormy() -> Self {
        Self::swell(7, 2.5)
    }

    /// Effective linear power of an octave (0 when disabled)
    pub fn octave_power(&self, octave: usize) -> f32 {
        if self.disabled[octave] {
            0.0
        } else {
            10f32.powf(self.power_log[octave])
        }
    }

    /// True when the octave carries power above the noise floor
    pub fn octave_active(&self, octave: usize) -> bool {
        self.octave_power(octave) > 10f32.powf(MIN_POWER_LOG)
    }

    /// Minimum wavelength of an octave in meters
    pub fn octave_min_wavelength(octave: usize) -> f32 {
        (2f32).powi(SMALLEST_WL_POW_2 + octave as i32)
    }

    /// Resolve the contiguous octave range the cascade pyramid must cover
    ///
    /// `smallest` becomes the first active octave whose doubled minimum
    /// wavelength exceeds `min_included_wavelength` and is never overwritten
    /// afterwards. `largest` is the last active octave over the full scan.
    pub fn resolve_range(&self, min_included_wavelength: f32) -> OctaveRange {
        let mut range = OctaveRange::default();

        for octave in 0..NUM_OCTAVES {
            if !self.octave_active(octave) {
                continue;
            }

            let min_wavelength = Self::octave_min_wavelength(octave);
            if range.smallest.is_none() && 2.0 * min_wavelength > min_included_wavelength {
                range.smallest = Some(octave);
            }
            range.largest = Some(octave);
        }

        range
    }
}

impl Default for WaveSpectrum {
    fn default() -> Self {
        Self::moderate()
    }
}
