use super::*;
use emgmm_core::*;
use emgmm_mixture::*;

/// Where a [`Trainer`] is in its lifecycle.
///
/// Counts are completed iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Iterating(usize),
    Converged(usize),
    IterationLimitReached(usize),
    Interrupted(usize),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Converged(_) | Self::IterationLimitReached(_) | Self::Interrupted(_)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Iterating(n) => write!(f, "iterating ({})", n),
            Self::Converged(n) => write!(f, "converged after {} iterations", n),
            Self::IterationLimitReached(n) => write!(f, "stopped at iteration limit {}", n),
            Self::Interrupted(n) => write!(f, "interrupted after {} iterations", n),
        }
    }
}

/// Knobs for a training run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    pub seed: u64,
    /// Variance floor as a fraction of each dimension's data variance.
    pub floor: f64,
    /// Stop once the log-likelihood gain between two iterations drops
    /// below this. `None` always runs to the iteration limit.
    pub tolerance: Option<Likelihood>,
    pub execution: Execution,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            floor: VARIANCE_FLOOR_FACTOR,
            tolerance: None,
            execution: Execution::default(),
        }
    }
}

impl TrainerConfig {
    pub fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }
    pub fn floor(self, floor: f64) -> Self {
        Self { floor, ..self }
    }
    pub fn tolerance(self, tolerance: Likelihood) -> Self {
        Self {
            tolerance: Some(tolerance),
            ..self
        }
    }
    pub fn execution(self, execution: Execution) -> Self {
        Self { execution, ..self }
    }
}

/// Sequential EM driver.
///
/// Owns the single authoritative mutable model. Each iteration sweeps the
/// dataset against an immutable borrow of that model and only then applies
/// the update, so a failed iteration leaves the previous parameters intact.
pub struct Trainer {
    config: TrainerConfig,
    model: Mixture,
    floor: VarianceFloor,
    phase: Phase,
    history: Vec<Likelihood>,
}

impl Trainer {
    pub fn new(dim: usize, components: usize, config: TrainerConfig) -> Result<Self> {
        Ok(Self {
            config,
            model: Mixture::new(dim, components)?,
            floor: VarianceFloor::zero(dim),
            phase: Phase::Uninitialized,
            history: Vec::new(),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }
    pub fn model(&self) -> &Mixture {
        &self.model
    }
    pub fn into_model(self) -> Mixture {
        self.model
    }
    pub fn floor(&self) -> &VarianceFloor {
        &self.floor
    }
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }
    /// Total log-likelihood of the dataset before each completed update.
    pub fn history(&self) -> &[Likelihood] {
        &self.history
    }

    /// Data-driven initialization. Resets any previous progress.
    pub fn initialize(&mut self, dataset: &Dataset) -> Result<()> {
        if dataset.dim() != self.model.dim() {
            return Err(Error::DimensionMismatch {
                expected: self.model.dim(),
                found: dataset.dim(),
                record: None,
            });
        }
        self.floor = self.model.initialize_from_data(
            dataset.records(),
            self.config.seed,
            self.config.floor,
        )?;
        self.history.clear();
        self.phase = Phase::Initialized;
        log::info!("{:<32}{:<32}", "initialized from data", format!("seed {}", self.config.seed));
        log::debug!("initial model\n{}", self.model);
        Ok(())
    }

    /// One EM iteration, initializing first if needed.
    ///
    /// Returns the total log-likelihood of `dataset` under the parameters
    /// the iteration started from.
    pub fn step(&mut self, dataset: &Dataset) -> Result<Likelihood> {
        if self.phase == Phase::Uninitialized {
            self.initialize(dataset)?;
        }
        let iteration = self.history.len() + 1;
        self.phase = Phase::Iterating(self.history.len());
        let start = std::time::Instant::now();
        let minimum = self.model.minimum_variance();
        let stats = self.config.execution.sweep(&self.model, dataset.records())?;
        let likelihood = stats.log_likelihood();
        self.model.update(&stats, dataset.len(), &self.floor)?;
        self.history.push(likelihood);
        self.phase = Phase::Iterating(iteration);
        log::info!(
            "{:<32}{:<32}{:<32}{:<32}",
            format!("iteration {}", iteration),
            format!("log likelihood {:.5}", likelihood),
            format!("min variance {:.5}", minimum),
            format!("{:.2?}", start.elapsed()),
        );
        Ok(likelihood)
    }

    /// Initializes from `dataset` and runs up to `iterations` EM steps.
    ///
    /// Stops early when the configured tolerance is met, or when a graceful
    /// interrupt has been requested. Errors abort the run without retry.
    pub fn train(&mut self, dataset: &Dataset, iterations: usize) -> Result<Phase> {
        log::info!("{:<32}{:<32}", "training mixture", format!("{} records", dataset.len()));
        self.initialize(dataset)?;
        while self.history.len() < iterations {
            self.step(dataset)?;
            if self.converged() {
                self.phase = Phase::Converged(self.history.len());
                break;
            }
            if interrupted() {
                self.phase = Phase::Interrupted(self.history.len());
                break;
            }
        }
        if !self.phase.is_terminal() {
            self.phase = Phase::IterationLimitReached(self.history.len());
        }
        log::info!("{}", self.phase);
        Ok(self.phase)
    }

    fn converged(&self) -> bool {
        match (self.config.tolerance, self.history.as_slice()) {
            (Some(tolerance), [.., prev, last]) => last - prev < tolerance,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn clusters(centers: &[(Feature, Feature)], each: usize, seed: u64) -> Dataset {
        let ref mut rng = SmallRng::seed_from_u64(seed);
        let records = centers
            .iter()
            .flat_map(|&(x, y)| std::iter::repeat((x, y)).take(each))
            .map(|(x, y)| vec![x + rng.random_range(-1. ..1.), y + rng.random_range(-1. ..1.)])
            .collect();
        Dataset::new(2, records).unwrap()
    }

    #[test]
    fn two_clusters_are_recovered() {
        let dataset = clusters(&[(-5., -5.), (5., 5.)], 50, 1);
        let mut trainer = Trainer::new(2, 2, TrainerConfig::default()).unwrap();
        let phase = trainer.train(&dataset, 20).unwrap();
        assert_eq!(phase, Phase::IterationLimitReached(20));
        assert_eq!(trainer.history().len(), 20);
        let model = trainer.model();
        for center in [-5., 5.] {
            let i = model
                .means()
                .iter()
                .position(|m| (m[0] - center).abs() < 0.5 && (m[1] - center).abs() < 0.5);
            assert!(i.is_some(), "no mean near ({}, {})\n{}", center, center, model);
        }
        for w in model.weights() {
            assert!((w - 0.5).abs() < 0.05);
        }
    }

    #[test]
    fn likelihood_never_drops() {
        let dataset = clusters(&[(0., 0.), (4., 0.), (0., 4.)], 60, 2);
        for seed in 0..4 {
            let mut trainer = Trainer::new(2, 3, TrainerConfig::default().seed(seed)).unwrap();
            trainer.train(&dataset, 15).unwrap();
            for pair in trainer.history().windows(2) {
                assert!(pair[1] >= pair[0] - 1e-6, "seed {}: {:?}", seed, trainer.history());
            }
        }
    }

    #[test]
    fn invariants_hold_after_every_update() {
        let dataset = clusters(&[(0., 0.), (4., 0.), (0., 4.)], 60, 3);
        let mut trainer = Trainer::new(2, 3, TrainerConfig::default()).unwrap();
        trainer.initialize(&dataset).unwrap();
        for _ in 0..10 {
            trainer.step(&dataset).unwrap();
            let model = trainer.model();
            assert!(model.weights().iter().all(|w| *w >= 0.));
            assert!((model.weights().iter().sum::<Probability>() - 1.).abs() < 1e-9);
            for row in model.variances() {
                for (j, v) in row.iter().enumerate() {
                    assert!(*v >= trainer.floor().get(j));
                }
            }
        }
    }

    #[test]
    fn floor_follows_configured_factor() {
        let dataset = clusters(&[(0., 0.), (4., 4.)], 20, 9);
        let moments = Moments::from_records(dataset.records(), 2).unwrap();
        let mut trainer = Trainer::new(2, 2, TrainerConfig::default().floor(0.25)).unwrap();
        trainer.initialize(&dataset).unwrap();
        for j in 0..2 {
            assert!((trainer.floor().get(j) - 0.25 * moments.variance()[j]).abs() < 1e-12);
        }
    }

    #[test]
    fn tolerance_stops_early() {
        let dataset = clusters(&[(-5., -5.), (5., 5.)], 50, 4);
        let config = TrainerConfig::default().tolerance(1e-3);
        let mut trainer = Trainer::new(2, 2, config).unwrap();
        match trainer.train(&dataset, 200).unwrap() {
            Phase::Converged(n) => assert!(n < 200 && n >= 2),
            phase => panic!("unexpected {:?}", phase),
        }
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let dataset = clusters(&[(0., 0.), (4., 0.), (0., 4.)], 60, 5);
        let run = |execution| {
            let config = TrainerConfig::default().seed(7).execution(execution);
            let mut trainer = Trainer::new(2, 3, config).unwrap();
            trainer.train(&dataset, 5).unwrap();
            trainer.into_model()
        };
        let a = run(Execution::Sequential);
        let b = run(Execution::Parallel { partition: 16 });
        for (x, y) in a.means().iter().flatten().zip(b.means().iter().flatten()) {
            assert!((x - y).abs() < 1e-8);
        }
    }

    #[test]
    fn zero_iterations_only_initializes() {
        let dataset = clusters(&[(0., 0.), (4., 4.)], 10, 6);
        let mut trainer = Trainer::new(2, 2, TrainerConfig::default()).unwrap();
        assert_eq!(trainer.phase(), Phase::Uninitialized);
        assert_eq!(
            trainer.train(&dataset, 0).unwrap(),
            Phase::IterationLimitReached(0)
        );
        assert!(trainer.history().is_empty());
    }

    #[test]
    fn single_record_is_degenerate() {
        let dataset = Dataset::new(2, vec![vec![1., 2.]]).unwrap();
        let mut trainer = Trainer::new(2, 2, TrainerConfig::default()).unwrap();
        assert!(matches!(
            trainer.train(&dataset, 5),
            Err(Error::DegenerateComponent { component: 1 })
        ));
        assert_eq!(trainer.phase(), Phase::Uninitialized);
    }

    #[test]
    fn dataset_of_wrong_dimension_is_rejected() {
        let dataset = Dataset::new(3, vec![vec![1., 2., 3.], vec![3., 2., 1.]]).unwrap();
        let mut trainer = Trainer::new(2, 2, TrainerConfig::default()).unwrap();
        let before = trainer.model().clone();
        assert!(matches!(
            trainer.train(&dataset, 5),
            Err(Error::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            })
        ));
        assert_eq!(trainer.model(), &before);
    }

    #[test]
    fn lazy_step_initializes() {
        let dataset = clusters(&[(0., 0.), (4., 4.)], 10, 8);
        let mut trainer = Trainer::new(2, 2, TrainerConfig::default()).unwrap();
        trainer.step(&dataset).unwrap();
        assert_eq!(trainer.phase(), Phase::Iterating(1));
    }
}
