//! Integration tests: curve invariants under long edit sequences.

use curved_core::{Curve, MIN_POINT_COUNT, MIN_POINT_X_DISTANCE, Point, Vec2, find_points};
use std::time::Instant;

/// Small deterministic generator so sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn next_index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len - 1)
    }
}

fn assert_well_formed(curve: &Curve) {
    assert!(curve.len() >= MIN_POINT_COUNT);
    let points = curve.points();
    assert_eq!(points.first().map(|p| p.x), Some(0.0));
    assert_eq!(points.last().map(|p| p.x), Some(1.0));
    for pair in points.windows(2) {
        assert!(
            pair[1].x - pair[0].x >= MIN_POINT_X_DISTANCE - 1e-12,
            "spacing violated: {pair:?}"
        );
    }
}

#[test]
fn random_edits_preserve_order_and_spacing() {
    let mut rng = Lcg(7);
    let mut curve = Curve::linear(0.0, 1.0);

    for _ in 0..2_000 {
        let roll = rng.next_f64();
        curve = if roll < 0.5 {
            // wide enough to hit the domain clamp now and then
            let x = rng.next_f64() * 1.2 - 0.1;
            curve.insert_point(x, rng.next_f64())
        } else if roll < 0.8 {
            let index = rng.next_index(curve.len());
            curve
                .set_position(index, rng.next_f64() * 1.2 - 0.1, rng.next_f64())
                .unwrap()
        } else {
            let index = rng.next_index(curve.len());
            curve.remove_point(index).unwrap()
        };
        assert_well_formed(&curve);
    }
}

#[test]
fn insert_next_to_existing_point_is_rejected() {
    let mut curve = Curve::constant(0.5);
    for i in 1..50 {
        curve = curve.insert_point(i as f64 * 0.02, 0.5);
    }
    assert_eq!(curve.len(), 51);
    assert_well_formed(&curve);

    assert_eq!(curve.insert_point(0.505, 0.0), curve);
    assert_eq!(curve.insert_point(0.995, 0.0), curve);
}

#[test]
fn evaluation_is_continuous_across_points() {
    let curve = Curve::linear(0.0, 1.0)
        .insert_point(0.3, 0.8)
        .insert_point(0.6, 0.1);
    for p in curve.points() {
        let left = curve.evaluate(p.x - 1e-9);
        let right = curve.evaluate(p.x + 1e-9);
        assert!((left - p.y).abs() < 1e-6, "jump before x = {}", p.x);
        assert!((right - p.y).abs() < 1e-6, "jump after x = {}", p.x);
    }
}

#[test]
#[ignore] // Run manually with `cargo test --test curve_invariants -- --nocapture --ignored`
fn benchmark_point_scan() {
    let mut curves = Vec::new();
    for c in 0..100 {
        let mut curve = Curve::constant(c as f64 / 100.0);
        for i in 1..50 {
            curve = curve.insert_point(i as f64 / 50.0, (c + i) as f64 / 150.0);
        }
        curves.push(curve);
    }

    let start = Instant::now();
    let mut hits = 0;
    for i in 0..1_000 {
        let center = Point::new(i as f64 / 1_000.0, 0.5);
        let extents = Vec2::new(0.05, 0.05);
        hits += find_points(&curves, center - extents, center + extents).len();
    }
    let duration = start.elapsed();

    println!("Scanned 5,000 points 1,000 times ({hits} hits) in {duration:?}");
}
