use super::*;
use emgmm_core::*;

/// Accumulated 0th, 1st and 2nd order moments for the M-step.
///
/// One accumulator is created per aggregation scope (a partition, a local
/// combine, the global merge) and only ever grows:
///
/// - [`SufficientStatistics::accumulate`] folds in one record against a model snapshot
/// - [`SufficientStatistics::merge`] folds in another accumulator
///
/// Both are element-wise sums, so any partitioning of the dataset and any
/// merge order or nesting yields the same totals up to floating-point
/// summation order.
#[derive(Debug, Clone, PartialEq)]
pub struct SufficientStatistics {
    dim: usize,
    components: usize,
    /// Records folded in, including those merged from other accumulators.
    records: usize,
    /// Σ_t γ_ti
    ss0: Vec<Probability>,
    /// Σ_t γ_ti · x_t
    ss1: Vec<Vec<Feature>>,
    /// Σ_t γ_ti · x_t²
    ss2: Vec<Vec<Feature>>,
    /// Σ_t ln p(x_t). Diagnostic only.
    log_likelihood: Likelihood,
}

impl SufficientStatistics {
    /// Zeroed accumulator for `components` mixtures of dimension `dim`.
    pub fn new(components: usize, dim: usize) -> Self {
        Self {
            dim,
            components,
            records: 0,
            ss0: vec![0.; components],
            ss1: vec![vec![0.; dim]; components],
            ss2: vec![vec![0.; dim]; components],
            log_likelihood: 0.,
        }
    }

    /// Rebuilds an accumulator from decoded fields. Shapes are checked.
    pub(crate) fn from_parts(
        records: usize,
        ss0: Vec<Probability>,
        ss1: Vec<Vec<Feature>>,
        ss2: Vec<Vec<Feature>>,
        log_likelihood: Likelihood,
    ) -> Result<Self> {
        let components = ss0.len();
        let dim = ss1.first().map(Vec::len).unwrap_or(0);
        for rows in [&ss1, &ss2] {
            if rows.len() != components || rows.iter().any(|row| row.len() != dim) {
                return Err(Error::ShapeMismatch {
                    expected: (components, dim),
                    found: (rows.len(), rows.first().map(Vec::len).unwrap_or(0)),
                });
            }
        }
        Ok(Self {
            dim,
            components,
            records,
            ss0,
            ss1,
            ss2,
            log_likelihood,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
    pub fn components(&self) -> usize {
        self.components
    }
    pub fn records(&self) -> usize {
        self.records
    }
    pub fn ss0(&self) -> &[Probability] {
        &self.ss0
    }
    pub fn ss1(&self) -> &[Vec<Feature>] {
        &self.ss1
    }
    pub fn ss2(&self) -> &[Vec<Feature>] {
        &self.ss2
    }
    pub fn log_likelihood(&self) -> Likelihood {
        self.log_likelihood
    }
    /// Total responsibility mass. Equals the record count up to rounding.
    pub fn mass(&self) -> Probability {
        self.ss0.iter().sum()
    }
    fn shape(&self) -> (usize, usize) {
        (self.components, self.dim)
    }

    /// Fails unless this accumulator matches the model's shape.
    pub fn conforms(&self, model: &Mixture) -> Result<()> {
        let expected = (model.components(), model.dim());
        if self.shape() == expected {
            Ok(())
        } else {
            Err(Error::ShapeMismatch {
                expected,
                found: self.shape(),
            })
        }
    }

    /// E-step for one record against a read-only model snapshot.
    ///
    /// Nothing is added unless the whole record succeeds.
    pub fn accumulate(&mut self, x: &[Feature], model: &Mixture) -> Result<()> {
        self.conforms(model)?;
        let (gamma, llh) = model.expectation(x)?;
        for (i, g) in gamma.iter().enumerate() {
            self.ss0[i] += g;
            for (j, x) in x.iter().enumerate() {
                let weighted = g * x;
                self.ss1[i][j] += weighted;
                self.ss2[i][j] += weighted * x;
            }
        }
        self.log_likelihood += llh;
        self.records += 1;
        Ok(())
    }

    /// Element-wise sum with another accumulator of the same shape.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.shape(),
                found: other.shape(),
            });
        }
        self.ss0
            .iter_mut()
            .zip(other.ss0.iter())
            .for_each(|(a, b)| *a += b);
        for (mine, theirs) in [(&mut self.ss1, &other.ss1), (&mut self.ss2, &other.ss2)] {
            mine.iter_mut()
                .flat_map(|row| row.iter_mut())
                .zip(theirs.iter().flatten())
                .for_each(|(a, b)| *a += b);
        }
        self.log_likelihood += other.log_likelihood;
        self.records += other.records;
        Ok(())
    }

    /// Sweeps `records` in order, tagging failures with their index.
    pub fn sweep(model: &Mixture, records: &[Vec<Feature>]) -> Result<Self> {
        Self::sweep_from(model, records, 0)
    }

    /// Like [`SufficientStatistics::sweep`], for a slice that starts at
    /// `offset` within the full dataset.
    pub fn sweep_from(model: &Mixture, records: &[Vec<Feature>], offset: usize) -> Result<Self> {
        records
            .iter()
            .enumerate()
            .try_fold(Self::from(model), |mut stats, (t, x)| {
                stats
                    .accumulate(x, model)
                    .map_err(|e| e.at(offset + t))
                    .map(|_| stats)
            })
    }
}

impl From<&Mixture> for SufficientStatistics {
    fn from(model: &Mixture) -> Self {
        Self::new(model.components(), model.dim())
    }
}
