use crate::common::{NonZeroUInt, UInt};
use rand::{
    distributions::{Distribution, Uniform},
    Rng,
};

/// A source of die faces.
///
/// Every [`rand::Rng`] is a `Roller`. The trait is object safe so a command can
/// pick its random source at runtime and hand out a `Box<dyn Roller>`.
pub trait Roller {
    /// Rolls one die, returning a face in `1..=sides`.
    fn roll(&mut self, sides: NonZeroUInt) -> UInt;

    fn roll_n(&mut self, num: usize, sides: NonZeroUInt) -> Vec<UInt> {
        (0..num).map(|_| self.roll(sides)).collect()
    }
}

impl<R: Rng> Roller for R {
    fn roll(&mut self, sides: NonZeroUInt) -> UInt {
        self.gen_range(1..=sides.get())
    }

    fn roll_n(&mut self, num: usize, sides: NonZeroUInt) -> Vec<UInt> {
        Uniform::new_inclusive(1, sides.get())
            .sample_iter(self)
            .take(num)
            .collect()
    }
}

#[cfg(test)]
pub(crate) use step::StepRoller;


#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_rng_rolls_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let d6 = NonZeroUInt::new(6).unwrap();
        let rolls = rng.roll_n(500, d6);
        assert_eq!(rolls.len(), 500);
        assert!(rolls.iter().all(|x| (1..=6).contains(x)));

        let d1 = NonZeroUInt::new(1).unwrap();
        assert_eq!(Roller::roll(&mut rng, d1), 1);
    }
}
