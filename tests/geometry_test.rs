//! Randomized checks for coordinate conversions.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use relayout::model::geometry::{
    approx_eq, from_percent, percent_to_pixel, pixel_to_percent, to_normalized, to_percent,
    to_pixel,
};
use relayout::model::{NormalizedBox, PixelBox};

fn random_box(rng: &mut StdRng) -> NormalizedBox {
    let left = rng.gen_range(0.0..0.9);
    let top = rng.gen_range(0.0..0.9);
    let right = rng.gen_range(left..1.0);
    let bottom = rng.gen_range(top..1.0);
    NormalizedBox::new(left, top, right, bottom)
}

fn assert_box_eq(a: &NormalizedBox, b: &NormalizedBox) {
    assert!(approx_eq(a.left, b.left), "{:?} vs {:?}", a, b);
    assert!(approx_eq(a.top, b.top), "{:?} vs {:?}", a, b);
    assert!(approx_eq(a.right, b.right), "{:?} vs {:?}", a, b);
    assert!(approx_eq(a.bottom, b.bottom), "{:?} vs {:?}", a, b);
}

#[test]
fn test_pixel_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let b = random_box(&mut rng);
        let width = rng.gen_range(100.0..5000.0);
        let height = rng.gen_range(100.0..5000.0);
        let back = to_normalized(&to_pixel(&b, width, height), width, height);
        assert_box_eq(&b, &back);
    }
}

#[test]
fn test_percent_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..1000 {
        let b = random_box(&mut rng);
        assert_box_eq(&b, &from_percent(&to_percent(&b)));
    }
}

#[test]
fn test_pixel_percent_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..1000 {
        let b = random_box(&mut rng);
        let (width, height) = (1700.0, 2200.0);
        let pixels = to_pixel(&b, width, height);
        let back = percent_to_pixel(&pixel_to_percent(&pixels, width, height), width, height);
        assert!(approx_eq(pixels.left, back.left));
        assert!(approx_eq(pixels.top, back.top));
        assert!(approx_eq(pixels.right, back.right));
        assert!(approx_eq(pixels.bottom, back.bottom));
    }
}

#[test]
fn test_normalized_always_in_unit_square() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..1000 {
        let pixels = PixelBox::new(
            rng.gen_range(-50.0..1050.0),
            rng.gen_range(-50.0..1050.0),
            rng.gen_range(-50.0..1050.0),
            rng.gen_range(-50.0..1050.0),
        );
        let b = to_normalized(&pixels, 1000.0, 1000.0);
        for v in [b.left, b.top, b.right, b.bottom] {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
