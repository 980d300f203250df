use rand::Rng;
use rand::seq::SliceRandom;
use std::convert::TryFrom;
use trackroll_engine::{ItemFind, Mulberry32, roll_die, roll_item, roll_session};

const SAMPLE_SIZE: usize = 60_000;
const TOLERANCE: f64 = 0.01;

fn rate(count: usize) -> f64 {
    let count = u32::try_from(count).expect("count fits u32");
    let total = u32::try_from(SAMPLE_SIZE).expect("sample size fits u32");
    f64::from(count) / f64::from(total)
}

#[test]
fn die_faces_are_uniform() {
    let mut rng = Mulberry32::new(0x5EED);
    let mut counts = [0usize; 6];
    for _ in 0..SAMPLE_SIZE {
        let face = roll_die(&mut rng);
        assert!((1..=6).contains(&face));
        counts[usize::try_from(face - 1).expect("face fits")] += 1;
    }
    for (face, &count) in counts.iter().enumerate() {
        let observed = rate(count);
        assert!(
            (observed - 1.0 / 6.0).abs() <= TOLERANCE,
            "face {} drifted: observed {observed:.4}",
            face + 1
        );
    }
}

#[test]
fn explosion_chains_have_geometric_tail() {
    let mut rng = Mulberry32::new(1234);
    let mut past_one = 0usize;
    let mut past_two = 0usize;
    for _ in 0..SAMPLE_SIZE {
        let total = roll_session(&mut rng, 1, true);
        assert!(total >= 1);
        assert_ne!(total % 6, 0, "an exploding chain cannot end on a six");
        if total > 6 {
            past_one += 1;
        }
        if total > 12 {
            past_two += 1;
        }
    }
    assert!(
        (rate(past_one) - 1.0 / 6.0).abs() <= TOLERANCE,
        "one explosion rate drifted: {:.4}",
        rate(past_one)
    );
    assert!(
        (rate(past_two) - 1.0 / 36.0).abs() <= TOLERANCE,
        "two explosion rate drifted: {:.4}",
        rate(past_two)
    );
}

#[test]
fn item_finds_track_base_rate_and_split() {
    let mut rng = Mulberry32::new(99);
    let mut boxes = 0usize;
    let mut coins = 0usize;
    for _ in 0..SAMPLE_SIZE {
        match roll_item(&mut rng) {
            Some(ItemFind::MysteryBox) => boxes += 1,
            Some(ItemFind::GoldCoin) => coins += 1,
            None => {}
        }
    }
    let found = boxes + coins;
    assert!((rate(found) - 0.05).abs() <= TOLERANCE);
    let split = f64::from(u32::try_from(boxes).expect("fits"))
        / f64::from(u32::try_from(found).expect("fits"));
    assert!((split - 0.5).abs() <= 0.05, "item split drifted: {split:.4}");
}

#[test]
fn generator_plugs_into_rand_helpers() {
    let mut a = Mulberry32::new(77);
    let mut b = Mulberry32::new(77);
    let mut left: Vec<u32> = (0..32).collect();
    let mut right = left.clone();
    left.shuffle(&mut a);
    right.shuffle(&mut b);
    assert_eq!(left, right);

    let mut rng = Mulberry32::new(5);
    let mut below = 0usize;
    for _ in 0..SAMPLE_SIZE {
        if rng.gen_bool(0.3) {
            below += 1;
        }
    }
    assert!((rate(below) - 0.3).abs() <= TOLERANCE);
}
