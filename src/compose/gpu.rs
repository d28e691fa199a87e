//! GPU compositor: compute-kernel packing with synchronous readback.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::bake::FrameBuffer;
use crate::cascade::CascadeConfig;
use crate::error::{BakeError, BakeResult};
use crate::evaluate::CascadeField;

use super::{validate_stack, CascadeCompositor};

/// Kernel parameters mirrored in composite.wgsl
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct KernelParams {
    resolution: u32,
    cascade_count: u32,
    first_cascade: i32,
    _padding: u32,
}

/// Compositor dispatching the packing kernel on a wgpu device
///
/// One compute dispatch and one blocking staging-buffer readback per frame;
/// the device is owned here and used by a single frame at a time.
pub struct GpuCompositor {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl GpuCompositor {
    /// Acquire a device and build the packing pipeline
    pub fn new() -> BakeResult<Self> {
        pollster::block_on(Self::init())
    }

    async fn init() -> BakeResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| BakeError::device("no suitable GPU adapter"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Bake Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| BakeError::device(format!("failed to request device: {}", e)))?;

        log::info!("compositing on {}", adapter.get_info().name);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Composite Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("composite.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Composite Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, true),
                storage_entry(4, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Composite Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Composite Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("cs_main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
        })
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl CascadeCompositor for GpuCompositor {
    fn composite(
        &mut self,
        fields: &[CascadeField],
        config: CascadeConfig,
        resolution: u32,
    ) -> BakeResult<FrameBuffer> {
        validate_stack(fields, config, resolution)?;

        let pixel_count = (resolution * resolution * config.cascade_count) as usize;

        // Concatenate the per-cascade planes in cascade order
        let mut displace_x = Vec::with_capacity(pixel_count);
        let mut height = Vec::with_capacity(pixel_count);
        let mut displace_z = Vec::with_capacity(pixel_count);
        for field in fields {
            displace_x.extend_from_slice(&field.displace_x);
            height.extend_from_slice(&field.height);
            displace_z.extend_from_slice(&field.displace_z);
        }

        let params = KernelParams {
            resolution,
            cascade_count: config.cascade_count,
            first_cascade: config.first_cascade,
            _padding: 0,
        };

        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Composite Params"),
                contents: bytemuck::cast_slice(&[params]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let plane_buffer = |label, plane: &[f32]| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents: bytemuck::cast_slice(plane),
                    usage: wgpu::BufferUsages::STORAGE,
                })
        };
        let displace_x_buffer = plane_buffer("Displace X Plane", &displace_x);
        let height_buffer = plane_buffer("Height Plane", &height);
        let displace_z_buffer = plane_buffer("Displace Z Plane", &displace_z);

        let output_size = (pixel_count * std::mem::size_of::<[f32; 4]>()) as u64;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Packed Frame"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Staging"),
            size: output_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Composite Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: displace_x_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: height_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: displace_z_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Composite Encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Composite Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                resolution.div_ceil(8),
                (resolution * config.cascade_count).div_ceil(8),
                1,
            );
        }

        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Blocking readback: map the staging buffer and wait for the device
        let buffer_slice = staging_buffer.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        receiver
            .recv()
            .map_err(|_| BakeError::readback("map callback never fired"))?
            .map_err(|e| BakeError::readback(format!("buffer mapping failed: {:?}", e)))?;

        let data = buffer_slice.get_mapped_range();
        let samples: Vec<[f32; 4]> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging_buffer.unmap();

        Ok(FrameBuffer {
            resolution,
            cascade_count: config.cascade_count,
            samples,
        })
    }
}
