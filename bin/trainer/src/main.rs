//! Trainer Binary
//!
//! Sequential training (`train`) or one distributed-style iteration
//! against a persisted parameter file (`step`).
mod command;

use anyhow::Context;
use clap::Parser;
use command::Command;
use emgmm_training::*;

fn main() -> anyhow::Result<()> {
    emgmm_core::log();
    match Command::parse() {
        Command::Train {
            dim,
            components,
            iterations,
            data,
            output,
            seed,
            skip_id,
            tolerance,
            partition_size,
            floor,
            parallel,
        } => {
            emgmm_core::brb();
            log::info!("press 'Q + ↵' to stop gracefully");
            let ref dataset = Dataset::load(&data, dim, skip_id)
                .with_context(|| format!("reading {}", data.display()))?;
            let execution = match parallel {
                true => Execution::Parallel {
                    partition: partition_size,
                },
                false => Execution::Sequential,
            };
            let config = TrainerConfig::default()
                .seed(seed)
                .floor(floor)
                .execution(execution);
            let config = match tolerance {
                Some(tolerance) => config.tolerance(tolerance),
                None => config,
            };
            let mut trainer = Trainer::new(dim, components, config)?;
            trainer.train(dataset, iterations).context("training failed")?;
            match output {
                Some(path) => Snapshot::new(&path, dim, components)
                    .save(trainer.model())
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{}", trainer.model()),
            }
        }
        Command::Step {
            dim,
            components,
            data,
            parameters,
            seed,
            skip_id,
            partitions,
            floor,
        } => {
            let ref dataset = Dataset::load(&data, dim, skip_id)
                .with_context(|| format!("reading {}", data.display()))?;
            let snapshot = Snapshot::new(&parameters, dim, components);
            let reduction = Epoch::new(snapshot, seed, partitions, floor)?
                .run(dataset)
                .context("iteration failed, parameters left unchanged")?;
            print!("{}", reduction.parameters);
            println!("LogLikelihood={}", reduction.log_likelihood);
        }
    }
    Ok(())
}
