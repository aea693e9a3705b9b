use emgmm::core::*;
use emgmm::mixture::*;
use emgmm::training::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

criterion::criterion_main!(benches);
criterion::criterion_group! {
    name = benches;
    config = criterion::Criterion::default()
        .without_plots()
        .noise_threshold(3.0)
        .significance_level(0.01)
        .sample_size(10)
        .measurement_time(std::time::Duration::from_secs(1));
    targets =
        accumulating_one_record,
        merging_statistics,
        sweeping_sequential,
        sweeping_parallel,
        encoding_statistics,
}

const DIM: usize = 16;
const COMPONENTS: usize = 8;

fn records(n: usize) -> Vec<Vec<Feature>> {
    let ref mut rng = SmallRng::seed_from_u64(0);
    (0..n)
        .map(|_| (0..DIM).map(|_| rng.random_range(-4. ..4.)).collect())
        .collect()
}

fn model(records: &[Vec<Feature>]) -> Mixture {
    let mut model = Mixture::new(DIM, COMPONENTS).expect("valid shape");
    model
        .initialize_from_data(records, DEFAULT_SEED, VARIANCE_FLOOR_FACTOR)
        .expect("enough records");
    model
}

fn accumulating_one_record(c: &mut criterion::Criterion) {
    let ref data = records(64);
    let ref model = model(data);
    c.bench_function("accumulate one 16-d record over 8 components", |b| {
        let mut stats = SufficientStatistics::from(model);
        b.iter(|| stats.accumulate(&data[0], model))
    });
}

fn merging_statistics(c: &mut criterion::Criterion) {
    let ref data = records(64);
    let ref model = model(data);
    let other = SufficientStatistics::sweep(model, data).expect("sweep");
    c.bench_function("merge two 8x16 accumulators", |b| {
        let mut stats = SufficientStatistics::from(model);
        b.iter(|| stats.merge(&other))
    });
}

fn sweeping_sequential(c: &mut criterion::Criterion) {
    let ref data = records(10_000);
    let ref model = model(data);
    c.bench_function("sweep 10k records sequentially", |b| {
        b.iter(|| Execution::Sequential.sweep(model, data))
    });
}

fn sweeping_parallel(c: &mut criterion::Criterion) {
    let ref data = records(10_000);
    let ref model = model(data);
    c.bench_function("sweep 10k records across rayon partitions", |b| {
        b.iter(|| Execution::Parallel { partition: 512 }.sweep(model, data))
    });
}

fn encoding_statistics(c: &mut criterion::Criterion) {
    let ref data = records(64);
    let ref model = model(data);
    let stats = SufficientStatistics::sweep(model, data).expect("sweep");
    c.bench_function("serialize and parse an 8x16 accumulator", |b| {
        b.iter(|| SufficientStatistics::from_bytes(&stats.to_bytes().expect("encode")))
    });
}
