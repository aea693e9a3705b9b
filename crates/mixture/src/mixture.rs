use super::*;
use emgmm_core::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Diagonal-covariance Gaussian mixture model.
///
/// Owns the mixture weights, component means and per-dimension variances,
/// plus the two numerical halves of EM:
///
/// - [`Mixture::expectation`] — per-record responsibilities and log-likelihood (E-step primitive)
/// - [`Mixture::update`] — parameter re-estimation from merged statistics (M-step)
///
/// `dim` and `components` are fixed at construction. Parameters only ever
/// change through initialization or a complete `update`; a failed update
/// leaves the model exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Mixture {
    /// Feature vector length.
    dim: usize,
    /// Number of mixture components.
    components: usize,
    /// Mixture weights, summing to one.
    weights: Vec<Probability>,
    /// Component means, `components × dim`.
    means: Vec<Vec<Feature>>,
    /// Component variances, `components × dim`.
    variances: Vec<Vec<Feature>>,
    /// −(dim/2)·ln(2π), the Gaussian normalizer shared by every component.
    constant: Likelihood,
}

impl Mixture {
    /// Uninformative model: uniform weights, zero means, unit variances.
    pub fn new(dim: usize, components: usize) -> Result<Self> {
        if dim == 0 || components == 0 {
            return Err(Error::InvalidShape { dim, components });
        }
        Ok(Self {
            dim,
            components,
            weights: vec![1. / components as Probability; components],
            means: vec![vec![0.; dim]; components],
            variances: vec![vec![1.; dim]; components],
            constant: Self::normalizer(dim),
        })
    }

    /// Assembles a model from explicit parameters, checking only their shape.
    pub fn from_parts(
        weights: Vec<Probability>,
        means: Vec<Vec<Feature>>,
        variances: Vec<Vec<Feature>>,
    ) -> Result<Self> {
        let components = weights.len();
        let dim = means.first().map(Vec::len).unwrap_or(0);
        if dim == 0 || components == 0 {
            return Err(Error::InvalidShape { dim, components });
        }
        for rows in [&means, &variances] {
            let found = (rows.len(), rows.iter().map(Vec::len).max().unwrap_or(0));
            if rows.len() != components || rows.iter().any(|row| row.len() != dim) {
                return Err(Error::ShapeMismatch {
                    expected: (components, dim),
                    found,
                });
            }
        }
        Ok(Self {
            dim,
            components,
            weights,
            means,
            variances,
            constant: Self::normalizer(dim),
        })
    }

    fn normalizer(dim: usize) -> Likelihood {
        -(dim as Likelihood / 2.) * (2. * std::f64::consts::PI).ln()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
    pub fn components(&self) -> usize {
        self.components
    }
    pub fn weights(&self) -> &[Probability] {
        &self.weights
    }
    pub fn means(&self) -> &[Vec<Feature>] {
        &self.means
    }
    pub fn variances(&self) -> &[Vec<Feature>] {
        &self.variances
    }
    pub fn constant(&self) -> Likelihood {
        self.constant
    }
    /// Smallest variance across all components and dimensions.
    pub fn minimum_variance(&self) -> Feature {
        self.variances
            .iter()
            .flatten()
            .copied()
            .fold(Feature::INFINITY, Feature::min)
    }

    /// Rejects feature vectors whose length differs from `dim`.
    pub fn check(&self, x: &[Feature]) -> Result<()> {
        if x.len() == self.dim {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dim,
                found: x.len(),
                record: None,
            })
        }
    }
}

// E-step primitives
impl Mixture {
    /// Unweighted diagonal Gaussian density of component `i` at `x`.
    fn density(&self, i: usize, x: &[Feature]) -> Likelihood {
        let (logdet, mahalanobis) = self.means[i]
            .iter()
            .zip(self.variances[i].iter())
            .zip(x.iter())
            .fold((0., 0.), |(logdet, mahalanobis), ((mu, var), x)| {
                let d = x - mu;
                (logdet + var.ln(), mahalanobis + d * d / var)
            });
        (self.constant - 0.5 * logdet - 0.5 * mahalanobis).exp()
    }

    /// Weighted component densities `weights[i] · N(x; means[i], variances[i])`.
    pub fn joint(&self, x: &[Feature]) -> Result<Vec<Likelihood>> {
        self.check(x)?;
        Ok((0..self.components)
            .map(|i| self.weights[i] * self.density(i, x))
            .collect())
    }

    /// Responsibilities and log-likelihood of one record in a single pass.
    ///
    /// Fails with [`Error::NumericalUnderflow`] when the weighted densities
    /// sum to zero (or leave the finite range), rather than producing NaN
    /// posteriors that would silently poison the statistics.
    pub fn expectation(&self, x: &[Feature]) -> Result<(Vec<Probability>, Likelihood)> {
        let joint = self.joint(x)?;
        let total = joint.iter().sum::<Likelihood>();
        if total > 0. && total.is_finite() {
            Ok((joint.iter().map(|p| p / total).collect(), total.ln()))
        } else {
            Err(Error::NumericalUnderflow { record: None })
        }
    }

    /// Posterior probability of each component given `x`, summing to one.
    pub fn responsibilities(&self, x: &[Feature]) -> Result<Vec<Probability>> {
        self.expectation(x).map(|(gamma, _)| gamma)
    }

    /// `ln Σ_i weights[i] · N(x; means[i], variances[i])`.
    pub fn log_likelihood(&self, x: &[Feature]) -> Result<Likelihood> {
        self.expectation(x).map(|(_, llh)| llh)
    }

    /// Sum of per-record log-likelihoods. Diagnostic only.
    pub fn total_log_likelihood(&self, records: &[Vec<Feature>]) -> Result<Likelihood> {
        records
            .iter()
            .enumerate()
            .map(|(t, x)| self.log_likelihood(x).map_err(|e| e.at(t)))
            .sum()
    }
}

// M-step
impl Mixture {
    /// Re-estimates every parameter from merged sufficient statistics.
    ///
    /// `records` is the number of records the statistics were accumulated
    /// over. Variances below `floor` are clamped to it, with a warning per
    /// clamped `(component, dimension)`. All three parameter arrays are
    /// computed before any is replaced, so an error leaves `self` intact.
    pub fn update(
        &mut self,
        stats: &SufficientStatistics,
        records: usize,
        floor: &VarianceFloor,
    ) -> Result<()> {
        stats.conforms(self)?;
        if floor.dim() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: floor.dim(),
                record: None,
            });
        }
        if records == 0 {
            return Err(Error::InsufficientData {
                records,
                required: 1,
            });
        }
        if let Some(component) = stats.ss0().iter().position(|mass| !(*mass > 0.)) {
            return Err(Error::DegenerateComponent { component });
        }
        let n = records as Probability;
        let weights = stats
            .ss0()
            .iter()
            .map(|mass| mass / n)
            .collect::<Vec<Probability>>();
        let means = stats
            .ss1()
            .iter()
            .zip(stats.ss0().iter())
            .map(|(row, mass)| row.iter().map(|s| s / mass).collect())
            .collect::<Vec<Vec<Feature>>>();
        let variances = stats
            .ss2()
            .iter()
            .zip(stats.ss0().iter())
            .zip(means.iter())
            .enumerate()
            .map(|(i, ((row, mass), mean))| {
                row.iter()
                    .zip(mean.iter())
                    .enumerate()
                    .map(|(j, (s, mu))| {
                        let variance = s / mass - mu * mu;
                        if variance >= floor.get(j) {
                            variance
                        } else {
                            log::warn!(
                                "variance ({}, {}) set to floor {:.5}",
                                i,
                                j,
                                floor.get(j)
                            );
                            floor.get(j)
                        }
                    })
                    .collect()
            })
            .collect::<Vec<Vec<Feature>>>();
        self.weights = weights;
        self.means = means;
        self.variances = variances;
        Ok(())
    }
}

// initialization
impl Mixture {
    /// Seeded random initialization.
    ///
    /// Means are uniform in [−1, 1], every variance is
    /// [`RANDOM_INIT_VARIANCE`], weights are uniform. The same seed always
    /// yields bit-identical parameters; distinct seeds give distinct starts.
    pub fn initialize_random(&mut self, seed: u64) {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        self.means = (0..self.components)
            .map(|_| {
                (0..self.dim)
                    .map(|_| (rng.random::<Feature>() - 0.5) * 2. * RANDOM_INIT_SPREAD)
                    .collect()
            })
            .collect();
        self.variances = vec![vec![RANDOM_INIT_VARIANCE; self.dim]; self.components];
        self.weights = vec![1. / self.components as Probability; self.components];
    }

    /// Data-driven initialization.
    ///
    /// Seeds each component's mean with a distinct, uniformly drawn record
    /// and its variance with the dataset's per-dimension variance. Returns
    /// the variance floor `factor × variance[j]` derived from that same
    /// variance (see [`VARIANCE_FLOOR_FACTOR`]).
    ///
    /// With fewer records than components, some component cannot be seeded
    /// and would receive no mass, so this fails with
    /// [`Error::DegenerateComponent`] naming the first such component.
    pub fn initialize_from_data(
        &mut self,
        records: &[Vec<Feature>],
        seed: u64,
        factor: f64,
    ) -> Result<VarianceFloor> {
        if records.len() < self.components {
            return Err(Error::DegenerateComponent {
                component: records.len(),
            });
        }
        let moments = Moments::from_records(records, self.dim)?.nondegenerate()?;
        let floor = VarianceFloor::scaled(&moments, factor);
        let ref mut rng = SmallRng::seed_from_u64(seed);
        self.means = rand::seq::index::sample(rng, records.len(), self.components)
            .into_vec()
            .into_iter()
            .map(|t| records[t].clone())
            .collect();
        self.variances = vec![moments.variance().to_vec(); self.components];
        self.weights = vec![1. / self.components as Probability; self.components];
        Ok(floor)
    }
}

impl std::fmt::Display for Mixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let row = |xs: &[Feature]| {
            xs.iter()
                .map(|x| format!("{:>10.3}", x))
                .collect::<Vec<String>>()
                .join("")
        };
        writeln!(f, "means:")?;
        for mean in self.means.iter() {
            writeln!(f, "{}", row(mean.as_slice()))?;
        }
        writeln!(f, "variances:")?;
        for variance in self.variances.iter() {
            writeln!(f, "{}", row(variance.as_slice()))?;
        }
        writeln!(f, "weights:")?;
        write!(f, "{}", row(self.weights.as_slice()))
    }
}
