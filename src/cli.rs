//! Command-line argument parsing.

use clap::Parser;

use wavebake::params::{BakeParams, WindParams};
use wavebake::spectrum::WaveSpectrum;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "wavebake")]
#[command(about = "Offline FFT ocean displacement baker", long_about = None)]
pub struct Args {
    /// Output dataset path
    #[arg(long, value_name = "PATH", default_value = "ocean.bake")]
    pub output: String,

    /// Sea state preset: calm, moderate, stormy
    #[arg(long, value_name = "PRESET", default_value = "moderate")]
    pub sea_state: String,

    /// Grid resolution per cascade (texels per side, power of two)
    #[arg(long, value_name = "TEXELS", default_value = "32")]
    pub resolution: u32,

    /// Smallest wavelength to resolve (meters)
    #[arg(long, value_name = "METERS", default_value = "1.0")]
    pub min_wavelength: f32,

    /// Loop period (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "16.0")]
    pub loop_period: f32,

    /// Sampled frames per second of loop time
    #[arg(long, value_name = "FPS", default_value = "8.0")]
    pub time_resolution: f32,

    /// Wind speed (meters per second)
    #[arg(long, value_name = "MPS", default_value = "10.0")]
    pub wind_speed: f32,

    /// Wind direction (degrees, 0 = +X)
    #[arg(long, value_name = "DEGREES", default_value = "0.0")]
    pub wind_direction: f32,

    /// Directional turbulence: 0 = wind-aligned, 1 = isotropic
    #[arg(long, value_name = "FACTOR", default_value = "0.3")]
    pub turbulence: f32,

    /// Compositing backend: gpu or cpu
    #[arg(long, value_name = "BACKEND", default_value = "gpu")]
    pub backend: String,

    /// Write per-frame height maps as PNGs into this directory
    #[arg(long, value_name = "DIR")]
    pub dump_frames: Option<String>,
}

impl Args {
    /// Parse sea state preset from command-line arguments
    pub fn parse_spectrum(&self) -> WaveSpectrum {
        match self.sea_state.to_lowercase().as_str() {
            "calm" => {
                println!("Sea state: calm");
                WaveSpectrum::calm()
            }
            "stormy" => {
                println!("Sea state: stormy");
                WaveSpectrum::stormy()
            }
            "moderate" => {
                println!("Sea state: moderate");
                WaveSpectrum::moderate()
            }
            other => {
                eprintln!("Warning: Unknown sea state '{}', using moderate", other);
                WaveSpectrum::moderate()
            }
        }
    }

    /// Assemble the bake request from command-line arguments
    pub fn bake_params(&self) -> BakeParams {
        BakeParams {
            resolution: self.resolution,
            min_wavelength_m: self.min_wavelength,
            frames_per_second: self.time_resolution,
            loop_period_s: self.loop_period,
            wind: WindParams {
                speed_mps: self.wind_speed,
                direction_rad: self.wind_direction.to_radians(),
                turbulence: self.turbulence,
            },
        }
    }
}
