use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub enum Command {
    #[command(
        about = "Train a mixture from data-driven initialization for a fixed number of iterations",
        alias = "t"
    )]
    Train {
        #[arg(required = true)]
        dim: usize,
        #[arg(required = true)]
        components: usize,
        #[arg(required = true)]
        iterations: usize,
        #[arg(required = true)]
        data: PathBuf,
        /// Parameter file to write; the model summary is printed when omitted.
        output: Option<PathBuf>,
        #[arg(long, default_value_t = emgmm_core::DEFAULT_SEED)]
        seed: u64,
        /// First field of each record is an identifier.
        #[arg(long)]
        skip_id: bool,
        /// Stop once the log-likelihood gain falls below this.
        #[arg(long)]
        tolerance: Option<f64>,
        /// Records per parallel partition.
        #[arg(long, default_value_t = emgmm_core::DEFAULT_PARTITION_SIZE)]
        partition_size: usize,
        /// Variance floor as a fraction of each dimension's data variance.
        #[arg(long, default_value_t = emgmm_core::VARIANCE_FLOOR_FACTOR)]
        floor: f64,
        /// Sweep partitions on the rayon pool instead of sequentially.
        #[arg(long)]
        parallel: bool,
    },
    #[command(
        about = "Run one persisted iteration: reload parameters, update, save",
        alias = "s"
    )]
    Step {
        #[arg(required = true)]
        dim: usize,
        #[arg(required = true)]
        components: usize,
        #[arg(required = true)]
        data: PathBuf,
        #[arg(required = true)]
        parameters: PathBuf,
        /// Seed for random initialization when no parameter file exists.
        #[arg(long, default_value_t = emgmm_core::DEFAULT_SEED)]
        seed: u64,
        #[arg(long)]
        skip_id: bool,
        /// Number of map partitions; 0 uses one per CPU.
        #[arg(long, default_value_t = 0)]
        partitions: usize,
        /// Variance floor as a fraction of each dimension's data variance.
        #[arg(long, default_value_t = emgmm_core::VARIANCE_FLOOR_FACTOR)]
        floor: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_takes_partition_size() {
        let args = ["trainer", "train", "2", "3", "10", "data.txt", "--partition-size", "64", "--parallel"];
        match Command::try_parse_from(args).unwrap() {
            Command::Train {
                partition_size,
                parallel,
                floor,
                ..
            } => {
                assert_eq!(partition_size, 64);
                assert!(parallel);
                assert_eq!(floor, emgmm_core::VARIANCE_FLOOR_FACTOR);
            }
            _ => panic!("expected train"),
        }
        let args = ["trainer", "train", "2", "3", "10", "data.txt", "--partitions", "64"];
        assert!(Command::try_parse_from(args).is_err());
    }

    #[test]
    fn step_takes_partition_count_and_floor() {
        let args = ["trainer", "step", "2", "3", "data.txt", "params.txt", "--partitions", "8", "--floor", "0.05"];
        match Command::try_parse_from(args).unwrap() {
            Command::Step {
                partitions, floor, ..
            } => {
                assert_eq!(partitions, 8);
                assert_eq!(floor, 0.05);
            }
            _ => panic!("expected step"),
        }
    }
}
