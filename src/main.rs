//! wavebake - Offline FFT ocean displacement baker
//!
//! Resolves the active octave range of a wave spectrum, derives the cascade
//! pyramid, samples every frame of the loop period, and writes the packed
//! half-precision dataset.

mod cli;

use clap::Parser;

use cli::Args;
use wavebake::bake::{bake, BakedDataset, DatasetSink, FileSink};
use wavebake::compose::{CascadeCompositor, CpuCompositor, GpuCompositor};
use wavebake::error::BakeResult;
use wavebake::evaluate::SpectralEvaluator;

fn main() {
    env_logger::init();

    println!("wavebake - FFT ocean displacement baker");

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Bake failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> BakeResult<()> {
    let spectrum = args.parse_spectrum();
    let params = args.bake_params();

    let mut evaluator = SpectralEvaluator::new();
    let mut compositor = create_compositor(&args.backend)?;

    let dataset = bake(&spectrum, &params, &mut evaluator, compositor.as_mut())?;

    println!(
        "Baked {} frames ({} samples), value bounds [{}, {}]",
        dataset.frame_count,
        dataset.samples.len(),
        dataset.min_value,
        dataset.max_value,
    );

    // A sink failure is reported but leaves the computed dataset valid
    let mut sink = FileSink::new(&args.output);
    match sink.store(&dataset) {
        Ok(()) => println!("Dataset written to {}", args.output),
        Err(e) => log::error!("failed to store dataset: {}", e),
    }

    if let Some(dir) = &args.dump_frames {
        dump_frames(&dataset, dir)?;
    }

    Ok(())
}

fn create_compositor(backend: &str) -> BakeResult<Box<dyn CascadeCompositor>> {
    match backend.to_lowercase().as_str() {
        "cpu" => {
            println!("Backend: CPU compositor");
            Ok(Box::new(CpuCompositor))
        }
        "gpu" => {
            println!("Backend: GPU compositor");
            Ok(Box::new(GpuCompositor::new()?))
        }
        other => {
            eprintln!("Warning: Unknown backend '{}', using cpu", other);
            Ok(Box::new(CpuCompositor))
        }
    }
}

/// Diagnostic dump: one grayscale height map per frame, normalized to the
/// dataset value bounds
fn dump_frames(dataset: &BakedDataset, dir: &str) -> BakeResult<()> {
    std::fs::create_dir_all(dir)?;

    let width = dataset.resolution;
    let height = dataset.resolution * dataset.cascade_count;
    let min = dataset.min_value.to_f32();
    let span = (dataset.max_value.to_f32() - min).max(f32::EPSILON);

    for frame in 0..dataset.frame_count as usize {
        let pixels: Vec<u8> = dataset
            .frame_samples(frame)
            .chunks_exact(4)
            .map(|texel| {
                let normalized = (texel[1].to_f32() - min) / span;
                (normalized.clamp(0.0, 1.0) * 255.0) as u8
            })
            .collect();

        let frame_path = format!("{}/frame_{:05}.png", dir, frame);
        if let Err(e) = image::save_buffer(&frame_path, &pixels, width, height, image::ColorType::L8)
        {
            eprintln!("Failed to save frame {}: {}", frame, e);
        }
    }

    log::info!("wrote {} frame dumps to {}", dataset.frame_count, dir);
    Ok(())
}
