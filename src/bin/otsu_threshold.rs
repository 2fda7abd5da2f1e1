//! Binarise a volume with Otsu's method.
//!
//! Prints the selected threshold and writes the mask, by default to
//! `Output_Images/otsu_threshold_image.nii`.

use clap::Parser;
use log::{LevelFilter, error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use volume_filters::{DEFAULT_OTSU_OUTPUT, OtsuJob, ThresholdParams};

#[derive(Parser)]
#[command(name = "otsu-threshold")]
#[command(version)]
#[command(about = "Binarise a volume with Otsu's threshold", long_about = None)]
struct Cli {
    /// Input volume: NIfTI/Analyze file, DICOM file or directory of DICOM slices
    input: PathBuf,

    /// Where to write the thresholded volume
    #[arg(short, long, default_value = DEFAULT_OTSU_OUTPUT)]
    output: PathBuf,

    /// Value written for samples at or below the threshold
    #[arg(long, default_value_t = 0)]
    inside_value: u8,

    /// Value written for samples above the threshold
    #[arg(long, default_value_t = 255)]
    outside_value: u8,

    /// Log processing errors but still exit successfully
    #[arg(long, default_value_t = false)]
    ignore_errors: bool,

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
    fn job(&self) -> OtsuJob {
        OtsuJob {
            input: self.input.clone(),
            output: self.output.clone(),
            params: ThresholdParams {
                inside_value: self.inside_value,
                outside_value: self.outside_value,
            },
            preview: self.preview.clone(),
        }
    }

    fn exit_code(&self) -> ExitCode {
        if self.ignore_errors {
            warn!("--ignore-errors set, reporting success");
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }

    fn main(self) -> ExitCode {
        if self.verbose {
            env_logger::builder().filter_level(LevelFilter::Info).init();
            info!("Verbose output enabled (ignoring RUST_LOG environment variable)");
        } else {
            env_logger::init();
        }

        let job = self.job();
        let result = match job.compute() {
            Ok(result) => result,
            Err(err) => {
                error!("{err}");
                return self.exit_code();
            }
        };
        println!("Threshold = {}", result.threshold);

        if let Err(err) = job.save(&result) {
            error!("{err}");
            return self.exit_code();
        }
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    Cli::parse().main()
}
