#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

/// Rule used to read a volume at a non-integer continuous index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Interpolation {
    /// Hamming-windowed sinc, radius taken from `ResampleParams::sinc_radius`.
    #[default]
    WindowedSinc,
    Trilinear,
    Nearest,
}

/// How a sequence of requested transforms is turned into resampling passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum TransformPolicy {
    /// Multiply all steps into one matrix and resample once.
    #[default]
    Compose,
    /// One resampling pass per step, each reading the previous output.
    Sequential,
    /// Only the last requested step is applied.
    LastWins,
}

#[derive(Default)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
