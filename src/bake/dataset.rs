//! The terminal bake artifact and its persistence sink.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use half::f16;

use crate::cascade::CascadeConfig;
use crate::error::BakeResult;

/// Completed bake: header fields plus the flattened half-precision samples
/// in [frame][row][col][channel] order
///
/// Constructed exactly once at the end of a bake and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedDataset {
    pub loop_period_s: f32,
    pub resolution: u32,
    pub first_cascade: i32,
    pub cascade_count: u32,
    pub frame_count: u32,
    pub min_value: f16,
    pub max_value: f16,
    pub samples: Vec<f16>,
}

impl BakedDataset {
    /// Assemble the dataset; pure construction, no I/O
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        loop_period_s: f32,
        resolution: u32,
        cascades: CascadeConfig,
        frame_count: u32,
        min_value: f16,
        max_value: f16,
        samples: Vec<f16>,
    ) -> Self {
        Self {
            loop_period_s,
            resolution,
            first_cascade: cascades.first_cascade,
            cascade_count: cascades.cascade_count,
            frame_count,
            min_value,
            max_value,
            samples,
        }
    }

    /// Samples per frame: resolution * (resolution * cascade_count) * 4
    pub fn samples_per_frame(&self) -> usize {
        (self.resolution * self.resolution * self.cascade_count * 4) as usize
    }

    /// The flattened slice belonging to one frame
    pub fn frame_samples(&self, frame: usize) -> &[f16] {
        let stride = self.samples_per_frame();
        &self.samples[frame * stride..(frame + 1) * stride]
    }
}

/// Durable storage for a completed dataset
///
/// A sink failure is reported to the caller but does not invalidate the
/// in-memory dataset.
pub trait DatasetSink {
    fn store(&mut self, dataset: &BakedDataset) -> BakeResult<()>;
}

/// Writes the dataset as a little-endian binary file: header
/// (loop period f32, resolution i32, first cascade i32, cascade count i32,
/// frame count i32, min f16, max f16) followed by the raw f16 samples
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSink for FileSink {
    fn store(&mut self, dataset: &BakedDataset) -> BakeResult<()> {
        let mut writer = BufWriter::new(File::create(&self.path)?);

        writer.write_all(&dataset.loop_period_s.to_le_bytes())?;
        writer.write_all(&(dataset.resolution as i32).to_le_bytes())?;
        writer.write_all(&dataset.first_cascade.to_le_bytes())?;
        writer.write_all(&(dataset.cascade_count as i32).to_le_bytes())?;
        writer.write_all(&(dataset.frame_count as i32).to_le_bytes())?;
        writer.write_all(&dataset.min_value.to_le_bytes())?;
        writer.write_all(&dataset.max_value.to_le_bytes())?;

        for sample in &dataset.samples {
            writer.write_all(&sample.to_le_bytes())?;
        }
        writer.flush()?;

        Ok(())
    }
}
