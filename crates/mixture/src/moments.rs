use super::*;
use emgmm_core::*;

/// Per-dimension mean and unbiased variance of a dataset.
///
/// Used to seed data-driven initialization and to derive the variance floor.
#[derive(Debug, Clone, PartialEq)]
pub struct Moments {
    mean: Vec<Feature>,
    variance: Vec<Feature>,
}

impl Moments {
    /// Two-pass estimate over `records`, each of length `dim`.
    /// The variance uses the `n - 1` denominator.
    pub fn from_records(records: &[Vec<Feature>], dim: usize) -> Result<Self> {
        if records.len() < 2 {
            return Err(Error::InsufficientData {
                records: records.len(),
                required: 2,
            });
        }
        if let Some((i, x)) = records.iter().enumerate().find(|(_, x)| x.len() != dim) {
            return Err(Error::DimensionMismatch {
                expected: dim,
                found: x.len(),
                record: Some(i),
            });
        }
        let n = records.len() as Feature;
        let mean = (0..dim)
            .map(|j| records.iter().map(|x| x[j]).sum::<Feature>() / n)
            .collect::<Vec<Feature>>();
        let variance = (0..dim)
            .map(|j| {
                records
                    .iter()
                    .map(|x| x[j] - mean[j])
                    .map(|d| d * d)
                    .sum::<Feature>()
                    / (n - 1.)
            })
            .collect::<Vec<Feature>>();
        Ok(Self { mean, variance })
    }

    /// Recovers the data moments from a global merge.
    ///
    /// Summing over components, `ss0` gives the record count, `ss1` the
    /// feature sums and `ss2` the squared-feature sums, so a stateless
    /// reducer sees the same moments the sequential trainer computed.
    pub fn from_statistics(stats: &SufficientStatistics) -> Result<Self> {
        let n = stats.mass();
        if !(n > 1.) {
            return Err(Error::InsufficientData {
                records: stats.records(),
                required: 2,
            });
        }
        let sums = stats.ss1().iter().fold(vec![0.; stats.dim()], |acc, row| {
            acc.iter().zip(row).map(|(a, b)| a + b).collect()
        });
        let squares = stats.ss2().iter().fold(vec![0.; stats.dim()], |acc, row| {
            acc.iter().zip(row).map(|(a, b)| a + b).collect()
        });
        let mean = sums.iter().map(|s| s / n).collect::<Vec<Feature>>();
        let variance = squares
            .iter()
            .zip(sums.iter())
            .map(|(sq, s)| ((sq - s * s / n) / (n - 1.)).max(0.))
            .collect::<Vec<Feature>>();
        Ok(Self { mean, variance })
    }

    pub fn mean(&self) -> &[Feature] {
        &self.mean
    }
    pub fn variance(&self) -> &[Feature] {
        &self.variance
    }

    /// Fails on the first dimension whose variance is not strictly positive.
    pub fn nondegenerate(self) -> Result<Self> {
        match self.variance.iter().position(|v| !(*v > 0.)) {
            Some(dimension) => Err(Error::ZeroVariance { dimension }),
            None => Ok(self),
        }
    }
}
