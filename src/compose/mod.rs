//! Cascade compositing: packing raw per-cascade planes into one frame buffer.

mod gpu;

pub use gpu::GpuCompositor;

use crate::bake::FrameBuffer;
use crate::cascade::CascadeConfig;
use crate::error::{BakeError, BakeResult};
use crate::evaluate::CascadeField;

/// Packs a raw cascade field stack into one 4-channel frame buffer
///
/// The packed layout interleaves (displace_x, height, displace_z, 0) per
/// texel and stacks cascades vertically in cascade order, giving a buffer of
/// resolution columns and resolution * cascade_count rows. Implementations
/// must produce identical output for identical input.
pub trait CascadeCompositor {
    fn composite(
        &mut self,
        fields: &[CascadeField],
        config: CascadeConfig,
        resolution: u32,
    ) -> BakeResult<FrameBuffer>;
}

/// Reference compositor running on the host
pub struct CpuCompositor;

impl CascadeCompositor for CpuCompositor {
    fn composite(
        &mut self,
        fields: &[CascadeField],
        config: CascadeConfig,
        resolution: u32,
    ) -> BakeResult<FrameBuffer> {
        validate_stack(fields, config, resolution)?;

        let plane_len = (resolution * resolution) as usize;
        let mut samples = Vec::with_capacity(plane_len * fields.len());
        for field in fields {
            for i in 0..plane_len {
                samples.push([field.displace_x[i], field.height[i], field.displace_z[i], 0.0]);
            }
        }

        Ok(FrameBuffer {
            resolution,
            cascade_count: config.cascade_count,
            samples,
        })
    }
}

/// Check that the evaluator delivered the stack the pyramid asked for
pub(crate) fn validate_stack(
    fields: &[CascadeField],
    config: CascadeConfig,
    resolution: u32,
) -> BakeResult<()> {
    if fields.len() as u32 != config.cascade_count {
        return Err(BakeError::evaluator(format!(
            "expected {} cascade fields, got {}",
            config.cascade_count,
            fields.len()
        )));
    }

    let plane_len = (resolution * resolution) as usize;
    for (field, expected_index) in fields.iter().zip(config.indices()) {
        if field.cascade_index != expected_index {
            return Err(BakeError::evaluator(format!(
                "cascade field out of order: expected index {}, got {}",
                expected_index, field.cascade_index
            )));
        }
        if field.displace_x.len() != plane_len
            || field.height.len() != plane_len
            || field.displace_z.len() != plane_len
        {
            return Err(BakeError::evaluator(format!(
                "cascade {} planes do not match resolution {}",
                field.cascade_index, resolution
            )));
        }
    }

    Ok(())
}
