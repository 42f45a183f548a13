//! Dice used by the weighted dispatch in the generators.

use rand::seq::IndexedRandom;
use rand::Rng;

pub(crate) fn d6<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=6)
}

pub(crate) fn d9<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=9)
}

pub(crate) fn d20<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=20)
}

pub(crate) fn d42<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(1..=42)
}

pub(crate) fn coin<R: Rng + ?Sized>(rng: &mut R) -> bool {
    rng.random_bool(0.5)
}

/// True with probability `1/n`.
pub(crate) fn one_in<R: Rng + ?Sized>(n: u32, rng: &mut R) -> bool {
    rng.random_ratio(1, n.max(1))
}

/// Uniform choice; `None` on an empty slice.
pub(crate) fn pick<'a, T, R: Rng + ?Sized>(choices: &'a [T], rng: &mut R) -> Option<&'a T> {
    choices.choose(rng)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn dice_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1000 {
            assert!((1..=6).contains(&d6(&mut rng)));
            assert!((1..=9).contains(&d9(&mut rng)));
            assert!((1..=20).contains(&d20(&mut rng)));
            assert!((1..=42).contains(&d42(&mut rng)));
        }
    }

    #[test]
    fn one_in_one_always_hits() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert!((0..100).all(|_| one_in(1, &mut rng)));
        let hits = (0..10_000).filter(|_| one_in(10, &mut rng)).count();
        assert!((700..1300).contains(&hits), "{hits}");
    }

    #[test]
    fn pick_from_empty_is_none() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let empty: [u8; 0] = [];
        assert!(pick(&empty, &mut rng).is_none());
        assert_eq!(pick(&[3], &mut rng), Some(&3));
    }
}
