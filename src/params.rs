//! Bake request parameters with physical units and documented semantics.

use crate::error::{BakeError, BakeResult};

/// Wind forcing parameters for the wave field
#[derive(Debug, Clone, Copy)]
pub struct WindParams {
    /// Wind speed in meters per second
    pub speed_mps: f32,

    /// Wind direction in radians (0 = +X axis)
    pub direction_rad: f32,

    /// Directional turbulence in [0, 1]: 0 = fully wind-aligned waves,
    /// 1 = isotropic sea
    pub turbulence: f32,
}

impl Default for WindParams {
    fn default() -> Self {
        Self {
            speed_mps: 10.0,
            direction_rad: 0.0,
            turbulence: 0.3,
        }
    }
}

/// Parameters of one bake request
#[derive(Debug, Clone)]
pub struct BakeParams {
    /// Grid resolution per cascade (texels per side, power of two)
    pub resolution: u32,

    /// Smallest wavelength the bake must resolve, in meters
    pub min_wavelength_m: f32,

    /// Time resolution: sampled frames per second of loop time
    pub frames_per_second: f32,

    /// Loop period in seconds; the baked animation repeats exactly after this
    pub loop_period_s: f32,

    /// Wind forcing
    pub wind: WindParams,
}

impl Default for BakeParams {
    fn default() -> Self {
        Self {
            resolution: 32,
            min_wavelength_m: 1.0,
            frames_per_second: 8.0,
            loop_period_s: 16.0,
            wind: WindParams::default(),
        }
    }
}

impl BakeParams {
    /// Number of time steps spanning the loop period
    pub fn frame_count(&self) -> u32 {
        (self.loop_period_s * self.frames_per_second).round().max(1.0) as u32
    }

    /// Validate the request before any expensive work
    pub fn validate(&self) -> BakeResult<()> {
        if self.resolution == 0 || !self.resolution.is_power_of_two() {
            return Err(BakeError::invalid_params(format!(
                "resolution must be a power of 2, got {}",
                self.resolution
            )));
        }
        if self.min_wavelength_m <= 0.0 {
            return Err(BakeError::invalid_params(
                "minimum wavelength must be positive",
            ));
        }
        if self.loop_period_s <= 0.0 {
            return Err(BakeError::invalid_params("loop period must be positive"));
        }
        if self.frames_per_second <= 0.0 {
            return Err(BakeError::invalid_params(
                "time resolution must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.wind.turbulence) {
            return Err(BakeError::invalid_params(
                "turbulence must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_validate() {
        assert!(BakeParams::default().validate().is_ok());
    }

    #[test]
    fn test_frame_count() {
        let params = BakeParams {
            loop_period_s: 16.0,
            frames_per_second: 8.0,
            ..BakeParams::default()
        };
        assert_eq!(params.frame_count(), 128);

        // Degenerate but positive inputs still produce at least one frame
        let params = BakeParams {
            loop_period_s: 0.01,
            frames_per_second: 1.0,
            ..BakeParams::default()
        };
        assert_eq!(params.frame_count(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_resolution() {
        for resolution in [0, 3, 48] {
            let params = BakeParams {
                resolution,
                ..BakeParams::default()
            };
            assert!(params.validate().is_err());
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_turbulence() {
        let params = BakeParams {
            wind: WindParams {
                turbulence: 1.5,
                ..WindParams::default()
            },
            ..BakeParams::default()
        };
        assert!(params.validate().is_err());
    }
}
