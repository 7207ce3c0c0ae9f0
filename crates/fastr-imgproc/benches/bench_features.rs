use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use fastr_image::Image;
use fastr_imgproc::color::{gray_normalized, ChannelOrder};
use fastr_imgproc::features::{
    CornerDetector, DetectorConfig, FastConfig, FastScanner, HarrisResponse,
};
use fastr_imgproc::parallel::ExecutionStrategy;

fn bench_corner_detect(c: &mut Criterion) {
    let mut group = c.benchmark_group("CornerDetect");

    for (width, height) in [(256, 224), (640, 480), (1920, 1080)] {
        let mut rng = StdRng::seed_from_u64(0);
        let image = Image::<u8, 3>::from_size_fn([width, height].into(), |_, _| {
            [rng.random(), rng.random(), rng.random()]
        })
        .unwrap();
        let gray = gray_normalized(&image, ChannelOrder::Rgb).unwrap();

        let parameter_string = format!("{width}x{height}");

        group.bench_with_input(
            BenchmarkId::new("fast_scan", &parameter_string),
            &gray,
            |b, i| {
                let scanner = FastScanner::new(&FastConfig::default());
                b.iter(|| black_box(scanner.scan(i)).unwrap())
            },
        );

        group.bench_with_input(
            BenchmarkId::new("harris_response", &parameter_string),
            &gray,
            |b, i| {
                let harris = HarrisResponse::default();
                b.iter(|| black_box(harris.compute_normalized(i)).unwrap())
            },
        );

        for (name, strategy) in [
            ("detect_parallel", ExecutionStrategy::Parallel),
            ("detect_serial", ExecutionStrategy::Serial),
        ] {
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &image,
                |b, i| {
                    let config = DetectorConfig::default().with_strategy(strategy);
                    let detector = CornerDetector::new(config).unwrap();
                    b.iter(|| black_box(detector.detect(i)).unwrap())
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_corner_detect);
criterion_main!(benches);
