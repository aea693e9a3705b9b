use emgmm_core::*;
use emgmm_mixture::*;

/// Adapter between the numerical core and an external map/combine/reduce
/// job framework.
///
/// Every payload that crosses a task boundary is serialized: model
/// snapshots as parameter text, partial statistics as the binary
/// accumulator layout. Each call is stateless with respect to the others,
/// so the framework is free to partition, retry, nest combines, or reorder
/// them. Only [`Harness::reduce`] produces a new model, and it is meant to
/// run exactly once per iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harness {
    dim: usize,
    components: usize,
    /// Variance floor as a fraction of each dimension's data variance.
    floor: f64,
}

/// Output of the single reducer for one iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    /// Updated model in parameter text form.
    pub parameters: String,
    /// Log-likelihood of the dataset under the prior model.
    pub log_likelihood: Likelihood,
    /// Records contributing to the merge.
    pub records: usize,
}

impl Harness {
    pub fn new(dim: usize, components: usize, floor: f64) -> Result<Self> {
        if dim == 0 || components == 0 {
            return Err(Error::InvalidShape { dim, components });
        }
        Ok(Self {
            dim,
            components,
            floor,
        })
    }
    pub fn dim(&self) -> usize {
        self.dim
    }
    pub fn components(&self) -> usize {
        self.components
    }
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Decodes a model snapshot of this harness's shape.
    pub fn snapshot(&self, parameters: &str) -> Result<Mixture> {
        Mixture::decode(parameters, self.dim, self.components)
    }

    /// Map: statistics of one partition under a fixed snapshot.
    ///
    /// `offset` is the index of the partition's first record in the full
    /// dataset, used only to name failing records.
    pub fn map(&self, parameters: &str, partition: &[Vec<Feature>], offset: usize) -> Result<Vec<u8>> {
        let ref model = self.snapshot(parameters)?;
        SufficientStatistics::sweep_from(model, partition, offset)?.to_bytes()
    }

    /// Combine: merge any number of serialized accumulators into one.
    pub fn combine<'a, I>(&self, parts: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        self.merge(parts)?.to_bytes()
    }

    /// Reduce: global merge followed by the single M-step.
    ///
    /// The data variance behind the floor is recovered from the merge
    /// itself and scaled by this harness's floor factor, so the reducer
    /// needs nothing but the payloads and the prior model.
    pub fn reduce<'a, I>(&self, parts: I, prior: &str) -> Result<Reduction>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let ref stats = self.merge(parts)?;
        let mut model = self.snapshot(prior)?;
        let ref floor = VarianceFloor::from_statistics(stats, self.floor)?;
        model.update(stats, stats.records(), floor)?;
        Ok(Reduction {
            parameters: model.encode(),
            log_likelihood: stats.log_likelihood(),
            records: stats.records(),
        })
    }

    fn merge<'a, I>(&self, parts: I) -> Result<SufficientStatistics>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        parts.into_iter().try_fold(
            SufficientStatistics::new(self.components, self.dim),
            |mut total, bytes| {
                total
                    .merge(&SufficientStatistics::from_bytes(bytes)?)
                    .map(|_| total)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn records() -> Vec<Vec<Feature>> {
        let ref mut rng = SmallRng::seed_from_u64(11);
        (0..120)
            .map(|t| {
                let c = if t % 2 == 0 { -3. } else { 3. };
                vec![c + rng.random_range(-1. ..1.), c + rng.random_range(-1. ..1.)]
            })
            .collect()
    }

    fn prior() -> Mixture {
        let mut model = Mixture::new(2, 2).unwrap();
        model
            .initialize_from_data(&records(), 5, VARIANCE_FLOOR_FACTOR)
            .unwrap();
        Mixture::decode(&model.encode(), 2, 2).unwrap()
    }

    #[test]
    fn reduce_matches_sequential_update() {
        let data = records();
        let harness = Harness::new(2, 2, VARIANCE_FLOOR_FACTOR).unwrap();
        let ref snapshot = prior().encode();
        let maps = [(0, 17), (17, 64), (64, 120)]
            .iter()
            .map(|&(a, b)| harness.map(snapshot, &data[a..b], a).unwrap())
            .collect::<Vec<Vec<u8>>>();
        // combine the first two locally, leave the third for the reducer
        let local = harness
            .combine(maps[..2].iter().map(Vec::as_slice))
            .unwrap();
        let reduced = harness
            .reduce([local.as_slice(), maps[2].as_slice()], snapshot)
            .unwrap();

        let mut expected = harness.snapshot(snapshot).unwrap();
        let stats = SufficientStatistics::sweep(&expected, &data).unwrap();
        let floor = VarianceFloor::from_records(&data, 2).unwrap();
        expected.update(&stats, data.len(), &floor).unwrap();

        let actual = harness.snapshot(&reduced.parameters).unwrap();
        assert_eq!(reduced.records, data.len());
        assert!((reduced.log_likelihood - stats.log_likelihood()).abs() < 1e-8);
        for (a, b) in actual
            .means()
            .iter()
            .flatten()
            .zip(expected.means().iter().flatten())
        {
            assert!((a - b).abs() <= 2. * PARAMETER_TOLERANCE);
        }
        for (a, b) in actual.weights().iter().zip(expected.weights()) {
            assert!((a - b).abs() <= 2. * PARAMETER_TOLERANCE);
        }
    }

    #[test]
    fn reduce_applies_its_own_floor_factor() {
        let data = records();
        let harness = Harness::new(2, 2, 2.).unwrap();
        let ref snapshot = prior().encode();
        let payload = harness.map(snapshot, &data, 0).unwrap();
        let reduced = harness.reduce([payload.as_slice()], snapshot).unwrap();
        let model = harness.snapshot(&reduced.parameters).unwrap();
        let moments = Moments::from_records(&data, 2).unwrap();
        for row in model.variances() {
            for (j, v) in row.iter().enumerate() {
                // no weighted spread can exceed twice the data variance
                assert!((v - 2. * moments.variance()[j]).abs() <= 2. * PARAMETER_TOLERANCE);
            }
        }
    }

    #[test]
    fn combine_order_is_irrelevant() {
        let data = records();
        let harness = Harness::new(2, 2, VARIANCE_FLOOR_FACTOR).unwrap();
        let ref snapshot = prior().encode();
        let maps = data
            .chunks(25)
            .enumerate()
            .map(|(c, chunk)| harness.map(snapshot, chunk, c * 25).unwrap())
            .collect::<Vec<Vec<u8>>>();
        let forward = harness.combine(maps.iter().map(Vec::as_slice)).unwrap();
        let backward = harness
            .combine(maps.iter().rev().map(Vec::as_slice))
            .unwrap();
        let a = SufficientStatistics::from_bytes(&forward).unwrap();
        let b = SufficientStatistics::from_bytes(&backward).unwrap();
        assert_eq!(a.records(), b.records());
        for (x, y) in a.ss1().iter().flatten().zip(b.ss1().iter().flatten()) {
            assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn map_rejects_snapshot_of_wrong_shape() {
        let harness = Harness::new(3, 2, VARIANCE_FLOOR_FACTOR).unwrap();
        let ref snapshot = prior().encode();
        assert!(matches!(
            harness.map(snapshot, &records(), 0),
            Err(Error::MalformedParameterFile { .. })
        ));
    }

    #[test]
    fn reduce_rejects_foreign_payload() {
        let harness = Harness::new(2, 2, VARIANCE_FLOOR_FACTOR).unwrap();
        let foreign = SufficientStatistics::new(3, 2).to_bytes().unwrap();
        let ref snapshot = prior().encode();
        assert!(matches!(
            harness.reduce([foreign.as_slice()], snapshot),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
