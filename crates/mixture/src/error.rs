use std::path::PathBuf;

/// Result alias for mixture and training operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the numerical core and its boundary codecs.
///
/// Record-scoped variants carry the offending record index when the
/// caller knows it; see [`Error::at`].
#[derive(Debug)]
pub enum Error {
    /// Model dimensions must both be positive.
    InvalidShape { dim: usize, components: usize },
    /// Feature vector length differs from the model dimension.
    DimensionMismatch {
        expected: usize,
        found: usize,
        record: Option<usize>,
    },
    /// Two accumulators (or an accumulator and a model) disagree on
    /// `(components, dim)`.
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// A component received no responsibility mass.
    DegenerateComponent { component: usize },
    /// Every component density underflowed to zero for a record.
    NumericalUnderflow { record: Option<usize> },
    /// Too few records to estimate what was asked for.
    InsufficientData { records: usize, required: usize },
    /// A feature dimension is constant across the dataset.
    ZeroVariance { dimension: usize },
    /// Parameter text failed to parse. Lines are 1-based.
    MalformedParameterFile { line: usize, reason: String },
    /// Dataset text failed to parse. Lines are 1-based.
    MalformedDataRecord { line: usize, reason: String },
    /// Serialized sufficient statistics failed to decode.
    MalformedStatistics(String),
    /// No persisted snapshot exists at the given path.
    MissingParameterFile(PathBuf),
    /// Underlying I/O failure.
    Io(std::io::Error),
}

impl Error {
    /// Attaches a record index to record-scoped errors.
    /// Other variants pass through unchanged.
    pub fn at(self, index: usize) -> Self {
        match self {
            Self::DimensionMismatch {
                expected,
                found,
                record: None,
            } => Self::DimensionMismatch {
                expected,
                found,
                record: Some(index),
            },
            Self::NumericalUnderflow { record: None } => Self::NumericalUnderflow {
                record: Some(index),
            },
            other => other,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidShape { dim, components } => write!(
                f,
                "invalid model shape: {} components of dimension {}",
                components, dim
            ),
            Self::DimensionMismatch {
                expected,
                found,
                record: Some(i),
            } => write!(
                f,
                "dimension mismatch at record {}: expected {}, found {}",
                i, expected, found
            ),
            Self::DimensionMismatch {
                expected,
                found,
                record: None,
            } => write!(f, "dimension mismatch: expected {}, found {}", expected, found),
            Self::ShapeMismatch { expected, found } => write!(
                f,
                "shape mismatch: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            Self::DegenerateComponent { component } => write!(
                f,
                "degenerate component {}: no responsibility mass",
                component
            ),
            Self::NumericalUnderflow { record: Some(i) } => write!(
                f,
                "numerical underflow at record {}: all component densities are zero",
                i
            ),
            Self::NumericalUnderflow { record: None } => {
                write!(f, "numerical underflow: all component densities are zero")
            }
            Self::InsufficientData { records, required } => write!(
                f,
                "insufficient data: {} records, at least {} required",
                records, required
            ),
            Self::ZeroVariance { dimension } => {
                write!(f, "feature dimension {} has zero variance", dimension)
            }
            Self::MalformedParameterFile { line, reason } => {
                write!(f, "malformed parameter file at line {}: {}", line, reason)
            }
            Self::MalformedDataRecord { line, reason } => {
                write!(f, "malformed data record at line {}: {}", line, reason)
            }
            Self::MalformedStatistics(reason) => {
                write!(f, "malformed sufficient statistics: {}", reason)
            }
            Self::MissingParameterFile(path) => {
                write!(f, "parameter file not found: {}", path.display())
            }
            Self::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
