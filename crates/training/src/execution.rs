use emgmm_core::*;
use emgmm_mixture::*;

/// How one E-step sweep is scheduled.
///
/// Both strategies run the same per-record [`SufficientStatistics::accumulate`]
/// against the same read-only model snapshot; they only differ in how the
/// partial accumulators are formed and merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Execution {
    /// One accumulator, records in order.
    Sequential,
    /// Rayon fan-out over contiguous partitions of at most `partition`
    /// records, merged pairwise in whatever order the pool finishes.
    Parallel { partition: usize },
}

impl Default for Execution {
    fn default() -> Self {
        Self::Parallel {
            partition: DEFAULT_PARTITION_SIZE,
        }
    }
}

impl Execution {
    /// Sufficient statistics of `records` under `model`.
    ///
    /// The model is borrowed immutably for the whole sweep, so it cannot be
    /// revised until every partition has been merged.
    pub fn sweep(&self, model: &Mixture, records: &[Vec<Feature>]) -> Result<SufficientStatistics> {
        match *self {
            Self::Sequential => SufficientStatistics::sweep(model, records),
            Self::Parallel { partition } => {
                use rayon::iter::IndexedParallelIterator;
                use rayon::iter::ParallelIterator;
                use rayon::slice::ParallelSlice;
                let size = partition.max(1);
                records
                    .par_chunks(size)
                    .enumerate()
                    .map(|(c, chunk)| SufficientStatistics::sweep_from(model, chunk, c * size))
                    .try_reduce(
                        || SufficientStatistics::from(model),
                        |mut a, b| a.merge(&b).map(|_| a),
                    )
            }
        }
    }
}
