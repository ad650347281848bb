//! # AD-Census pipeline tests
//!
//! Runs the whole matcher on synthetic stereo pairs.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use adcensus_disparity::prelude::*;
use image::{Rgb, RgbImage};
use imageproc::noise::gaussian_noise;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const WIDTH: usize = 40;
const HEIGHT: usize = 30;
const SHIFT: usize = 4;

// -----------------------------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------------------------

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn texture(x: usize, y: usize) -> u8 {
    let mut h = (x as u32).wrapping_mul(374_761_393) ^ (y as u32).wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    (h ^ (h >> 16)) as u8
}

/// Stereo frame where the right view is the left view moved `shift` pixels to the left.
fn shifted_frame(width: usize, height: usize, shift: usize) -> StereoFrame {
    let left = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = texture(x as usize, y as usize);
        Rgb([v, v, v])
    });
    let right = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = texture(x as usize + shift, y as usize);
        Rgb([v, v, v])
    });

    StereoFrame { left, right }
}

fn params() -> Params {
    Params::with_disparity(0, 16)
}

/// Share of interior pixels whose disparity is within `tol` of `expected`.
fn share_near(disp: &[f32], expected: f32, tol: f32) -> f32 {
    let mut total = 0;
    let mut near = 0;
    for y in 4..HEIGHT - 4 {
        for x in 16..WIDTH - 3 {
            total += 1;
            if (disp[y * WIDTH + x] - expected).abs() <= tol {
                near += 1;
            }
        }
    }

    near as f32 / total as f32
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[test]
fn recovers_constant_shift() -> Result<()> {
    init_logger();

    let frame = shifted_frame(WIDTH, HEIGHT, SHIFT);
    let mut matcher = AdCensus::with_size(WIDTH, HEIGHT, params())?;

    let mut disp = vec![0.0; WIDTH * HEIGHT];
    matcher.match_images(frame.left.as_raw(), frame.right.as_raw(), &mut disp)?;

    let share = share_near(&disp, SHIFT as f32, 0.5);
    assert!(share >= 0.9, "only {} of interior pixels near the true shift", share);

    Ok(())
}

#[test]
fn tolerates_sensor_noise() -> Result<()> {
    init_logger();

    let frame = shifted_frame(WIDTH, HEIGHT, SHIFT);
    let noisy = StereoFrame {
        left: gaussian_noise(&frame.left, 0.0, 2.0, 7),
        right: gaussian_noise(&frame.right, 0.0, 2.0, 11)
    };

    let mut matcher = AdCensus::with_size(WIDTH, HEIGHT, params())?;
    let disp_map = matcher.compute(&noisy)?;

    let share = share_near(disp_map.as_slice(), SHIFT as f32, 1.0);
    assert!(share >= 0.7, "only {} of interior pixels near the true shift", share);

    Ok(())
}

#[test]
fn matching_is_deterministic() -> Result<()> {
    let frame = shifted_frame(WIDTH, HEIGHT, SHIFT);
    let mut matcher = AdCensus::with_size(WIDTH, HEIGHT, params())?;

    let mut first = vec![0.0; WIDTH * HEIGHT];
    matcher.match_images(frame.left.as_raw(), frame.right.as_raw(), &mut first)?;

    matcher.reset(WIDTH, HEIGHT, params())?;
    let mut second = vec![0.0; WIDTH * HEIGHT];
    matcher.match_images(frame.left.as_raw(), frame.right.as_raw(), &mut second)?;

    // Reused buffers must not leak state between runs either
    let mut third = vec![0.0; WIDTH * HEIGHT];
    matcher.match_images(frame.left.as_raw(), frame.right.as_raw(), &mut third)?;

    let bits = |v: &[f32]| v.iter().map(|d| d.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&second));
    assert_eq!(bits(&second), bits(&third));

    Ok(())
}

#[test]
fn uniform_pair_stays_invalid() -> Result<()> {
    let left = vec![90u8; WIDTH * HEIGHT * 3];
    let right = left.clone();

    let mut matcher = AdCensus::with_size(WIDTH, HEIGHT, params())?;
    let mut disp = vec![0.0; WIDTH * HEIGHT];
    matcher.match_images(&left, &right, &mut disp)?;

    // Every candidate costs the same, so no pixel has an interior minimum
    assert!(disp.iter().all(|d| d.is_infinite()));

    let map = DisparityMap::from_raw(WIDTH, HEIGHT, disp)?;
    assert_eq!(map.valid_range(), None);
    assert_eq!(map.get(3, 3), None);

    Ok(())
}

#[test]
fn refinement_can_be_disabled() -> Result<()> {
    let frame = shifted_frame(WIDTH, HEIGHT, SHIFT);
    let raw_params = Params {
        do_lr_check: false,
        do_region_voting: false,
        do_interpolation: false,
        ..params()
    };

    let mut matcher = AdCensus::with_size(WIDTH, HEIGHT, raw_params)?;
    let mut disp = vec![0.0; WIDTH * HEIGHT];
    matcher.match_images(frame.left.as_raw(), frame.right.as_raw(), &mut disp)?;

    let share = share_near(&disp, SHIFT as f32, 0.5);
    assert!(share >= 0.9, "only {} of interior pixels near the true shift", share);

    Ok(())
}

#[test]
fn algorithm_resizes_to_frame() -> Result<()> {
    let mut matcher = AdCensus::new();
    let frame = shifted_frame(24, 16, 2);

    match matcher.compute(&frame) {
        Err(Error::NotInitialized) => (),
        other => panic!("unexpected {:?}", other.map(|m| m.width()))
    }

    matcher.initialize(8, 8, Params::with_disparity(0, 6))?;
    let map = matcher.compute(&frame)?;

    assert_eq!((map.width(), map.height()), (24, 16));
    assert_eq!(matcher.width(), Some(24));
    assert_eq!(matcher.params().map(|p| p.max_disparity), Some(6));

    Ok(())
}

#[test]
fn mismatched_frame_is_rejected() {
    let mut matcher = AdCensus::with_size(16, 16, Params::with_disparity(0, 4)).unwrap();
    let frame = StereoFrame {
        left: RgbImage::new(16, 16),
        right: RgbImage::new(16, 15)
    };

    match matcher.compute(&frame) {
        Err(Error::BufferSize { name, .. }) => assert_eq!(name, "right image"),
        other => panic!("unexpected {:?}", other.map(|m| m.width()))
    }
}

#[test]
fn invalid_lambdas_are_rejected() {
    let mut matcher = AdCensus::new();
    let bad = Params {
        lambda_census: 0,
        ..params()
    };

    match matcher.initialize(WIDTH, HEIGHT, bad) {
        Err(Error::InvalidParam { name, .. }) => assert_eq!(name, "lambda_census"),
        other => panic!("unexpected {:?}", other)
    }
    assert!(!matcher.is_initialized());
}

#[test]
fn params_load_from_file() -> Result<()> {
    let path = std::env::temp_dir().join("adcensus_pipeline_params.json");
    std::fs::write(&path, r#"{
        "min_disparity": 0,
        "max_disparity": 16,
        "lambda_ad": 10,
        "lambda_census": 30,
        "cross_l1": 34,
        "cross_l2": 17,
        "cross_t1": 20,
        "cross_t2": 6,
        "so_p1": 1.0,
        "so_p2": 3.0,
        "so_tso": 15,
        "irv_ts": 20,
        "irv_th": 0.4,
        "lrcheck_thres": 1.0,
        "do_lr_check": true,
        "do_region_voting": true,
        "do_interpolation": true,
        "do_discontinuity_adjustment": true,
        "interpolation": "eight"
    }"#)?;

    let loaded = Params::from_file(&path)?;
    std::fs::remove_file(&path)?;

    assert_eq!(loaded.interpolation, InterpolationRays::Eight);
    assert!(loaded.do_discontinuity_adjustment);

    let frame = shifted_frame(WIDTH, HEIGHT, SHIFT);
    let mut matcher = AdCensus::with_size(WIDTH, HEIGHT, loaded)?;
    let map = matcher.compute(&frame)?;

    let share = share_near(map.as_slice(), SHIFT as f32, 0.5);
    assert!(share >= 0.8, "only {} of interior pixels near the true shift", share);

    Ok(())
}

#[test]
fn missing_params_file_is_io_error() {
    match Params::from_file("this/file/does/not/exist.json") {
        Err(Error::Io(_)) => (),
        other => panic!("unexpected {:?}", other)
    }
}
