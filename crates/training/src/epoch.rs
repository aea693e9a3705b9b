use super::*;
use emgmm_mixture::*;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use rayon::slice::ParallelSlice;

/// One externally triggered iteration of distributed EM, run in-process.
///
/// Reloads the persisted snapshot (or a seeded random model when none
/// exists yet), maps every partition through the [`Harness`] in parallel,
/// combines neighbouring payloads locally, reduces once, and persists the
/// result. Nothing is written unless the whole iteration succeeds, so a
/// failed epoch can simply be re-run.
pub struct Epoch {
    harness: Harness,
    snapshot: Snapshot,
    seed: u64,
    partitions: usize,
}

impl Epoch {
    /// `partitions == 0` uses one partition per logical CPU. `floor` is the
    /// variance floor as a fraction of each dimension's data variance.
    pub fn new(snapshot: Snapshot, seed: u64, partitions: usize, floor: f64) -> Result<Self> {
        Ok(Self {
            harness: Harness::new(snapshot.dim(), snapshot.components(), floor)?,
            snapshot,
            seed,
            partitions: match partitions {
                0 => num_cpus::get(),
                n => n,
            },
        })
    }

    pub fn run(&self, dataset: &Dataset) -> Result<Reduction> {
        let start = std::time::Instant::now();
        let ref prior = self.snapshot.load_or_random(self.seed)?.encode();
        let payloads = dataset
            .partitions(self.partitions)
            .into_par_iter()
            .map(|(offset, partition)| self.harness.map(prior, partition, offset))
            .collect::<Result<Vec<Vec<u8>>>>()?;
        let combined = payloads
            .par_chunks(2)
            .map(|pair| self.harness.combine(pair.iter().map(Vec::as_slice)))
            .collect::<Result<Vec<Vec<u8>>>>()?;
        let reduction = self
            .harness
            .reduce(combined.iter().map(Vec::as_slice), prior)?;
        self.snapshot.save_text(&reduction.parameters)?;
        log::info!(
            "{:<32}{:<32}{:<32}",
            format!("epoch over {} records", reduction.records),
            format!("LogLikelihood={:.5}", reduction.log_likelihood),
            format!("{:.2?}", start.elapsed()),
        );
        Ok(reduction)
    }
}
