use fastr_image::Image;
use fastr_imgproc::{
    color::{gray_normalized, ChannelOrder},
    features::{
        CornerDetector, DetectorConfig, DetectorError, DetectorMode, FastConfig, HarrisResponse,
        Keypoint,
    },
    padding::PaddingMode,
    parallel::ExecutionStrategy,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn noise_image(seed: u64, width: usize, height: usize) -> Result<Image<u8, 1>, DetectorError> {
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(Image::from_size_fn([width, height].into(), |_, _| {
        [rng.random::<u8>()]
    })?)
}

/// A dark 64x64 image with a single bright pixel at each of `dots`.
fn dots_image(dots: &[(usize, usize)]) -> Result<Image<f32, 1>, DetectorError> {
    Ok(Image::from_size_fn([64, 64].into(), |x, y| {
        if dots.contains(&(x, y)) {
            [0.9]
        } else {
            [0.1]
        }
    })?)
}

#[test]
fn constant_image_has_no_keypoints() -> Result<(), DetectorError> {
    init_logger();
    let image = Image::<u8, 3>::from_size_val([40, 32].into(), 128)?;

    let gray = gray_normalized(&image, ChannelOrder::Rgb)?;
    let (response, degenerate) = HarrisResponse::default().compute_normalized(&gray)?;
    assert!(degenerate);
    assert!(response.as_slice().iter().all(|&v| v == 0.0));

    for gate in [0.0, 0.35, 0.9] {
        let detector = CornerDetector::new(DetectorConfig::default().with_gate_threshold(gate))?;
        assert!(detector.detect(&image)?.is_empty());
    }
    Ok(())
}

#[test]
fn isolated_dots_give_one_keypoint_each() -> Result<(), DetectorError> {
    init_logger();
    let dots = [(16, 16), (47, 16), (40, 40), (16, 45)];
    let image = dots_image(&dots)?;

    let detector = CornerDetector::new(DetectorConfig::default())?;
    let (keypoints, report) = detector.detect_with_report(&image)?;

    // raster order: (16, 16), (47, 16), (40, 40), (16, 45)
    let expected = dots
        .iter()
        .map(|&(x, y)| Keypoint::new(x as f32, y as f32))
        .collect::<Vec<_>>();
    assert_eq!(keypoints, expected);
    assert_eq!(report.candidates, 4);
    assert!(!report.degenerate_response);
    Ok(())
}

#[test]
fn dark_dots_on_bright_background() -> Result<(), DetectorError> {
    let dots = [(20, 12), (33, 50)];
    let image = Image::<u8, 1>::from_size_fn([64, 64].into(), |x, y| {
        if dots.contains(&(x, y)) {
            [50]
        } else {
            [200]
        }
    })?;

    let keypoints = CornerDetector::new(DetectorConfig::default())?.detect(&image)?;
    let positions = keypoints
        .iter()
        .map(|kp| (kp.x as usize, kp.y as usize))
        .collect::<Vec<_>>();
    assert_eq!(positions, dots);
    Ok(())
}

#[test]
fn large_square_corners_fail_the_arc_test() -> Result<(), DetectorError> {
    // a corner of a crisp square sees at most 11 contiguous darker samples
    let image = Image::<f32, 1>::from_size_fn([64, 64].into(), |x, y| {
        if (20..40).contains(&x) && (20..40).contains(&y) {
            [0.9]
        } else {
            [0.1]
        }
    })?;

    let detector = CornerDetector::new(DetectorConfig::default())?;
    let (keypoints, report) = detector.detect_with_report(&image)?;
    assert!(keypoints.is_empty());
    assert_eq!(report.candidates, 0);
    Ok(())
}

#[test]
fn small_square_is_gated_in() -> Result<(), DetectorError> {
    let image = Image::<f32, 1>::from_size_fn([64, 64].into(), |x, y| {
        if (20..24).contains(&x) && (20..24).contains(&y) {
            [0.9]
        } else {
            [0.1]
        }
    })?;

    let detector = CornerDetector::new(DetectorConfig::default())?;
    let (keypoints, report) = detector.detect_with_report(&image)?;

    assert_eq!(report.candidates, 12);
    assert_eq!(keypoints.len(), 12);
    for kp in &keypoints {
        assert!((20.0..24.0).contains(&kp.x) && (20.0..24.0).contains(&kp.y), "{kp:?}");
    }
    Ok(())
}

#[test]
fn detection_is_deterministic_across_strategies() -> Result<(), DetectorError> {
    init_logger();
    let image = noise_image(42, 96, 72)?;

    let reference = CornerDetector::new(DetectorConfig::default())?.detect(&image)?;
    assert!(!reference.is_empty());

    for strategy in [
        ExecutionStrategy::Parallel,
        ExecutionStrategy::Serial,
        ExecutionStrategy::Fixed(3),
    ] {
        let detector = CornerDetector::new(DetectorConfig::default().with_strategy(strategy))?;
        assert_eq!(detector.detect(&image)?, reference, "{strategy:?}");
        assert_eq!(detector.detect(&image)?, reference, "{strategy:?}");
    }
    Ok(())
}

#[test]
fn raising_the_gate_never_adds_keypoints() -> Result<(), DetectorError> {
    let image = noise_image(5, 80, 60)?;

    let mut previous: Option<Vec<Keypoint>> = None;
    for gate in [0.0, 0.1, 0.2, 0.35, 0.5, 0.75, 0.99] {
        let detector = CornerDetector::new(DetectorConfig::default().with_gate_threshold(gate))?;
        let keypoints = detector.detect(&image)?;

        if let Some(previous) = &previous {
            assert!(keypoints.len() <= previous.len(), "gate {gate}");
            assert!(keypoints.iter().all(|kp| previous.contains(kp)), "gate {gate}");
        }
        previous = Some(keypoints);
    }
    Ok(())
}

#[test]
fn hybrid_is_a_subset_of_fast() -> Result<(), DetectorError> {
    let image = noise_image(9, 64, 64)?;

    let fast = CornerDetector::new(DetectorConfig::default().with_mode(DetectorMode::Fast))?
        .detect(&image)?;
    let hybrid = CornerDetector::new(DetectorConfig::default())?.detect(&image)?;

    assert!(hybrid.len() <= fast.len());
    assert!(hybrid.iter().all(|kp| fast.contains(kp)));
    Ok(())
}

#[test]
fn bgr_input_matches_rgb_input() -> Result<(), DetectorError> {
    let mut rng = StdRng::seed_from_u64(21);
    let rgb = Image::<u8, 3>::from_size_fn([48, 40].into(), |_, _| {
        [rng.random(), rng.random(), rng.random()]
    })?;
    let bgr = Image::<u8, 3>::new(
        rgb.size(),
        rgb.as_slice()
            .chunks_exact(3)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
    )?;

    let rgb_keypoints = CornerDetector::new(DetectorConfig::default())?.detect(&rgb)?;
    let bgr_keypoints = CornerDetector::new(
        DetectorConfig::default().with_channel_order(ChannelOrder::Bgr),
    )?
    .detect(&bgr)?;

    assert_eq!(rgb_keypoints, bgr_keypoints);
    Ok(())
}

#[test]
fn keypoint_size_follows_the_config() -> Result<(), DetectorError> {
    let image = dots_image(&[(30, 30)])?;

    let config = DetectorConfig::default().with_fast(FastConfig::default().with_keypoint_size(3.5));
    let keypoints = CornerDetector::new(config)?.detect(&image)?;
    assert_eq!(keypoints, vec![Keypoint::new(30.0, 30.0).with_size(3.5)]);
    Ok(())
}

#[test]
fn config_from_partial_json() -> Result<(), Box<dyn std::error::Error>> {
    let config: DetectorConfig = serde_json::from_str(
        r#"{
            "mode": "Fast",
            "gate_threshold": 0.5,
            "fast": { "threshold": 0.2 },
            "border_mode": "Replicate",
            "strategy": { "Fixed": 2 }
        }"#,
    )?;

    assert_eq!(config.mode, DetectorMode::Fast);
    assert_eq!(config.gate_threshold, 0.5);
    assert_eq!(config.fast.threshold, 0.2);
    assert_eq!(config.fast.keypoint_size, 7.0);
    assert_eq!(config.harris, DetectorConfig::default().harris);
    assert_eq!(config.border_mode, PaddingMode::Replicate);
    assert_eq!(config.strategy, ExecutionStrategy::Fixed(2));

    let json = serde_json::to_string(&config)?;
    let parsed: DetectorConfig = serde_json::from_str(&json)?;
    assert_eq!(parsed, config);

    let empty: DetectorConfig = serde_json::from_str("{}")?;
    assert_eq!(empty, DetectorConfig::default());
    Ok(())
}
