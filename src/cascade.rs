//! Cascade pyramid configuration derived from an octave range.

use crate::error::{BakeError, BakeResult};
use crate::spectrum::OctaveRange;

/// Spatial resolution pyramid layout, derived once per bake
///
/// Cascade widths double with index; the cascade at global index i spans
/// 2^(i-1) meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeConfig {
    /// Global index of the finest cascade
    pub first_cascade: i32,

    /// Number of stacked cascades (always >= 2 for a valid spectrum)
    pub cascade_count: u32,
}

impl CascadeConfig {
    /// Derive the pyramid from a resolved octave range
    ///
    /// `first_cascade = round(log2(min_wavelength * resolution))` encodes two
    /// samples per smallest wave: the finest cascade is
    /// `resolution * min_wavelength / 2` meters wide. A spectrum bar's
    /// wavelength range straddles two cascade scales, hence the `+ 2` in the
    /// cascade count.
    pub fn from_octave_range(
        range: OctaveRange,
        min_wavelength: f32,
        resolution: u32,
    ) -> BakeResult<Self> {
        let (smallest, largest) = match (range.smallest, range.largest) {
            (Some(smallest), Some(largest)) if smallest <= largest => (smallest, largest),
            (None, None) => {
                return Err(BakeError::invalid_spectrum(
                    "no active octaves above the noise floor",
                ))
            }
            _ => {
                return Err(BakeError::invalid_spectrum(
                    "active octaves are all below the included wavelength threshold",
                ))
            }
        };

        let first_cascade = (min_wavelength * resolution as f32).log2().round() as i32;
        let cascade_count = (largest - smallest) as u32 + 2;

        Ok(Self {
            first_cascade,
            cascade_count,
        })
    }

    /// Physical width in meters of the cascade at offset `slice` into the stack
    pub fn world_size(&self, slice: u32) -> f32 {
        (2f32).powi(self.first_cascade + slice as i32 - 1)
    }

    /// Global cascade indices covered by the stack
    pub fn indices(&self) -> impl Iterator<Item = i32> {
        let first = self.first_cascade;
        (0..self.cascade_count).map(move |slice| first + slice as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::OctaveRange;

    fn range(smallest: usize, largest: usize) -> OctaveRange {
        OctaveRange {
            smallest: Some(smallest),
            largest: Some(largest),
        }
    }

    #[test]
    fn test_cascade_count_formula() {
        let config = CascadeConfig::from_octave_range(range(3, 7), 1.0, 32).unwrap();
        assert_eq!(config.cascade_count, 6);

        // A single-octave range still needs two cascade scales
        let config = CascadeConfig::from_octave_range(range(5, 5), 1.0, 32).unwrap();
        assert_eq!(config.cascade_count, 2);
    }

    #[test]
    fn test_first_cascade_log2_scenario() {
        // round(log2(2.0 * 64)) = 7
        let config = CascadeConfig::from_octave_range(range(0, 0), 2.0, 64).unwrap();
        assert_eq!(config.first_cascade, 7);
    }

    #[test]
    fn test_first_cascade_monotonic_in_wavelength() {
        let mut previous = i32::MIN;
        for min_wavelength in [0.25, 0.5, 1.0, 1.7, 2.0, 4.0, 9.0, 16.0] {
            let config = CascadeConfig::from_octave_range(range(0, 2), min_wavelength, 64).unwrap();
            assert!(config.first_cascade >= previous);
            previous = config.first_cascade;
        }
    }

    #[test]
    fn test_empty_range_fails() {
        let result = CascadeConfig::from_octave_range(OctaveRange::default(), 1.0, 32);
        assert!(matches!(result, Err(crate::error::BakeError::InvalidSpectrum(_))));
    }

    #[test]
    fn test_inconsistent_range_fails() {
        // largest set without smallest: only non-qualifying octaves were active
        let inconsistent = OctaveRange {
            smallest: None,
            largest: Some(4),
        };
        let result = CascadeConfig::from_octave_range(inconsistent, 1.0, 32);
        assert!(matches!(result, Err(crate::error::BakeError::InvalidSpectrum(_))));
    }

    #[test]
    fn test_world_sizes_double() {
        let config = CascadeConfig::from_octave_range(range(0, 1), 1.0, 32).unwrap();
        assert_eq!(config.first_cascade, 5);
        assert_eq!(config.world_size(0), 16.0);
        assert_eq!(config.world_size(1), 32.0);
        assert_eq!(config.world_size(2), 64.0);
    }
}
