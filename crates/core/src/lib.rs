//! Core type aliases, constants, and runtime utilities for emgmm.
//!
//! This crate provides the numeric vocabulary and tuning parameters
//! shared by the mixture model, the training loop, and the binaries.

// ============================================================================
// TYPE ALIASES
// ============================================================================
/// A single coordinate of a feature vector.
pub type Feature = f64;
/// Mixture weights and per-record responsibilities.
pub type Probability = f64;
/// Log-domain densities and accumulated log-likelihoods.
pub type Likelihood = f64;

// ============================================================================
// INITIALIZATION
// ============================================================================
/// Variance floor as a fraction of each dimension's data variance.
pub const VARIANCE_FLOOR_FACTOR: f64 = 0.01;
/// Variance assigned to every component by seeded random initialization.
/// Wide enough that records a few units from [-1, 1] keep nonzero density.
pub const RANDOM_INIT_VARIANCE: f64 = 5.0;
/// Random means are drawn uniformly from [-RANDOM_INIT_SPREAD, RANDOM_INIT_SPREAD].
pub const RANDOM_INIT_SPREAD: f64 = 1.0;
/// Seed used when the caller does not supply one.
pub const DEFAULT_SEED: u64 = 0;

// ============================================================================
// TRAINING
// ============================================================================
/// Records per partition for the in-process parallel sweep.
pub const DEFAULT_PARTITION_SIZE: usize = 4096;

// ============================================================================
// PERSISTENCE
// ============================================================================
/// Decimal places written by the parameter codec.
pub const PARAMETER_DECIMALS: usize = 5;
/// Largest absolute error a parameter round trip may introduce.
pub const PARAMETER_TOLERANCE: f64 = 0.5e-5;
/// Wire format version for serialized sufficient statistics.
pub const STATISTICS_VERSION: u16 = 1;

// ============================================================================
// RUNTIME UTILITIES
// ============================================================================
/// Initialize dual logging (terminal + file) with timestamped log files.
/// Creates `logs/` directory and writes DEBUG level to file, INFO to terminal.
#[cfg(feature = "server")]
pub fn log() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// Global interrupt flag for graceful shutdown coordination.
static INTERRUPTED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);
/// Optional training deadline from TRAIN_DURATION env var.
static DEADLINE: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

/// Check if graceful shutdown was requested (via stdin "Q") or deadline reached.
pub fn interrupted() -> bool {
    INTERRUPTED.load(std::sync::atomic::Ordering::Relaxed)
        || DEADLINE
            .get()
            .map_or(false, |d| std::time::Instant::now() >= *d)
}

/// Request a graceful stop after the current iteration.
pub fn interrupt() {
    INTERRUPTED.store(true, std::sync::atomic::Ordering::Relaxed);
}

/// Register graceful interrupt handler. Type "Q" + Enter to stop after current iteration.
/// Optionally set TRAIN_DURATION env var (e.g., "2h", "30m") for timed runs.
pub fn brb() {
    if let Ok(duration) = std::env::var("TRAIN_DURATION") {
        if let Some(deadline) = parse_duration(&duration) {
            let _ = DEADLINE.set(std::time::Instant::now() + deadline);
            log::info!("training will stop after {}", duration);
        }
    }
    std::thread::spawn(|| {
        loop {
            let ref mut buffer = String::new();
            match std::io::stdin().read_line(buffer) {
                Ok(0) | Err(_) => break,
                Ok(_) if buffer.trim().to_uppercase() == "Q" => {
                    log::warn!("graceful interrupt requested, finishing current iteration...");
                    interrupt();
                    break;
                }
                Ok(_) => continue,
            }
        }
    });
}

/// Parse duration string like "30s", "5m", "2h", "1d" into Duration.
fn parse_duration(s: &str) -> Option<std::time::Duration> {
    let s = s.trim();
    let (num, unit) = s.split_at(s.len().saturating_sub(1));
    let value: u64 = num.parse().ok()?;
    match unit {
        "s" => Some(std::time::Duration::from_secs(value)),
        "m" => Some(std::time::Duration::from_secs(value * 60)),
        "h" => Some(std::time::Duration::from_secs(value * 3600)),
        "d" => Some(std::time::Duration::from_secs(value * 86400)),
        _ => None,
    }
}
