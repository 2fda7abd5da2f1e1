//! Rotate, scale and translate a volume about its center.

use clap::Parser;
use log::{LevelFilter, error, info};
use nalgebra::Vector3;
use std::path::PathBuf;
use std::process::ExitCode;
use volume_filters::{
    AffineJob, DEFAULT_SINC_RADIUS, Interpolation, MAX_SINC_RADIUS, ResampleParams,
    TransformParams, TransformPolicy,
};

#[derive(Parser)]
#[command(name = "affine-transform")]
#[command(version)]
#[command(about = "Resample a volume through rotation, scaling and translation", long_about = None)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Input volume: NIfTI/Analyze file, DICOM file or directory of DICOM slices
    input: PathBuf,

    /// Where to write the transformed volume
    output: PathBuf,

    /// Rotation about the x axis, in radians
    x_rotation: f64,

    /// Rotation about the y axis, in radians
    y_rotation: f64,

    /// Rotation about the z axis, in radians
    z_rotation: f64,

    /// Uniform scale factor
    scale: f64,

    /// Translation along x, in physical units
    x_translation: f64,

    /// Translation along y, in physical units
    y_translation: f64,

    /// Translation along z, in physical units
    z_translation: f64,

    /// Interpolation kernel
    #[arg(long, value_enum, default_value_t = Interpolation::WindowedSinc)]
    interpolation: Interpolation,

    /// Support radius of the windowed-sinc kernel, in samples
    #[arg(
        long,
        default_value_t = DEFAULT_SINC_RADIUS as u64,
        value_parser = clap::value_parser!(u64).range(1..=MAX_SINC_RADIUS as u64)
    )]
    sinc_radius: u64,

    /// Value written where the transformed volume has no source data
    #[arg(long, default_value_t = 0)]
    default_value: u8,

    /// How several requested transforms are combined
    #[arg(long, value_enum, default_value_t = TransformPolicy::Compose)]
    policy: TransformPolicy,

    /// Also write the middle axial slice of the result as PNG
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Verbose output
    ///
    /// When specified, sets the log level to `info` and ignores the `RUST_LOG`
    /// environment variable. When not specified, uses `RUST_LOG`
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn job(&self) -> AffineJob {
        AffineJob {
            input: self.input.clone(),
            output: self.output.clone(),
            transform: TransformParams {
                rotation: Vector3::new(self.x_rotation, self.y_rotation, self.z_rotation),
                scale: self.scale,
                translation: Vector3::new(
                    self.x_translation,
                    self.y_translation,
                    self.z_translation,
                ),
            },
            policy: self.policy,
            resample: ResampleParams {
                interpolation: self.interpolation,
                sinc_radius: self.sinc_radius as usize,
                default_value: self.default_value,
            },
            preview: self.preview.clone(),
        }
    }

    fn main(self) -> ExitCode {
        if self.verbose {
            env_logger::builder().filter_level(LevelFilter::Info).init();
            info!("Verbose output enabled (ignoring RUST_LOG environment variable)");
        } else {
            env_logger::init();
        }

        match self.job().run() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{err}");
                ExitCode::FAILURE
            }
        }
    }
}

fn main() -> ExitCode {
    Cli::parse().main()
}
