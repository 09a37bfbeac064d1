use oxiec::params::{ParameterDatabase, ParameterPath};
use oxiec::rng::ThreadRandom;
use oxiec::{EcError, Result};

use std::fmt;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const P_MIN_GENE: &str = "min-gene";
pub const P_MAX_GENE: &str = "max-gene";

/// Upper limit on the steps of a single random walk.
pub const MAX_WALK_STEPS: usize = 1 << 16;

/// Closed interval integer genes are kept in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneBounds {
    pub min: i64,
    pub max: i64,
}

impl GeneBounds {
    /// Returns bounds covering `min..=max`.
    ///
    /// # Errors
    /// Returns a range violation on `max-gene` if `max < min`.
    pub fn new(min: i64, max: i64) -> Result<GeneBounds> {
        if max < min {
            return Err(EcError::range(
                &ParameterPath::new(P_MAX_GENE),
                format!("max-gene ({}) is below min-gene ({})", max, min),
            ));
        }
        Ok(GeneBounds { min, max })
    }

    /// Reads `min-gene` and `max-gene` under `base`, falling back to
    /// the same keys under `species`. Both default to the bit range.
    ///
    /// # Examples
    /// ```
    /// use oxiec::{ParameterDatabase, ParameterPath};
    /// use oxiec_vec::genomics::GeneBounds;
    ///
    /// let params = ParameterDatabase::from_source("vector.max-gene = 9\nop.min-gene = -3\n");
    /// let (op, vector) = (ParameterPath::new("op"), ParameterPath::new("vector"));
    /// let bounds = GeneBounds::setup(&params, &op, &vector).unwrap();
    /// assert_eq!(bounds, GeneBounds { min: -3, max: 9 });
    /// ```
    pub fn setup(
        params: &ParameterDatabase,
        base: &ParameterPath,
        species: &ParameterPath,
    ) -> Result<GeneBounds> {
        let min = params.get_long_with_default(
            &base.push(P_MIN_GENE),
            Some(&species.push(P_MIN_GENE)),
            0,
        );
        let max_path = base.push(P_MAX_GENE);
        let max = params.get_long_with_default(&max_path, Some(&species.push(P_MAX_GENE)), 1);
        if max < min {
            return Err(EcError::range(
                &max_path,
                format!("max-gene ({}) is below min-gene ({})", max, min),
            ));
        }
        Ok(GeneBounds { min, max })
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for GeneBounds {
    fn default() -> Self {
        GeneBounds { min: 0, max: 1 }
    }
}

/// A single position of a vector genome.
pub trait Gene:
    Copy + PartialEq + Send + Sync + fmt::Debug + Serialize + DeserializeOwned + 'static
{
    /// A uniformly random gene.
    fn random(bounds: &GeneBounds, random: &mut ThreadRandom) -> Self;

    /// The result of a reset mutation.
    fn reset(self, bounds: &GeneBounds, random: &mut ThreadRandom) -> Self;

    /// The result of a random walk that keeps going with
    /// probability `persistence` after each step, for at most
    /// [`MAX_WALK_STEPS`] steps.
    fn walk(self, bounds: &GeneBounds, persistence: f64, random: &mut ThreadRandom) -> Self;

    /// Numeric value, as summed by fitness functions.
    fn value(self) -> f64;
}

/// Bits. Every mutation flips.
impl Gene for bool {
    fn random(_: &GeneBounds, random: &mut ThreadRandom) -> Self {
        random.next_bool(0.5)
    }

    fn reset(self, _: &GeneBounds, _: &mut ThreadRandom) -> Self {
        !self
    }

    fn walk(self, _: &GeneBounds, _: f64, _: &mut ThreadRandom) -> Self {
        !self
    }

    fn value(self) -> f64 {
        if self {
            1.0
        } else {
            0.0
        }
    }
}

impl Gene for i64 {
    fn random(bounds: &GeneBounds, random: &mut ThreadRandom) -> Self {
        random.gen_range(bounds.min..=bounds.max)
    }

    fn reset(self, bounds: &GeneBounds, random: &mut ThreadRandom) -> Self {
        Self::random(bounds, random)
    }

    /// Steps of ±1, bouncing off the bounds.
    fn walk(self, bounds: &GeneBounds, persistence: f64, random: &mut ThreadRandom) -> Self {
        let mut gene = self;
        for _ in 0..MAX_WALK_STEPS {
            let step = if random.next_bool(0.5) { 1 } else { -1 };
            if (step == 1 && gene < bounds.max) || (step == -1 && gene > bounds.min) {
                gene += step;
            } else if (step == -1 && gene < bounds.max) || (step == 1 && gene > bounds.min) {
                gene -= step;
            }
            if !random.next_bool(persistence) {
                break;
            }
        }
        gene
    }

    fn value(self) -> f64 {
        self as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_validation() {
        assert!(GeneBounds::new(3, 2).is_err());
        assert_eq!(GeneBounds::new(-1, -1).unwrap(), GeneBounds { min: -1, max: -1 });

        let params = ParameterDatabase::from_source("vector.min-gene = 5\nvector.max-gene = 4\n");
        let vector = ParameterPath::new("vector");
        assert!(matches!(
            GeneBounds::setup(&params, &vector, &vector),
            Err(EcError::RangeViolation { path, .. })
                if path == ParameterPath::new("vector.max-gene")
        ));
        let empty = ParameterDatabase::new();
        assert_eq!(
            GeneBounds::setup(&empty, &vector, &vector).unwrap(),
            GeneBounds::default()
        );
    }

    #[test]
    fn integer_genes_stay_in_bounds() {
        let bounds = GeneBounds::new(-2, 3).unwrap();
        let mut random = ThreadRandom::seeded(11, 0);
        for _ in 0..500 {
            let gene = i64::random(&bounds, &mut random);
            assert!(bounds.contains(gene));
            assert!(bounds.contains(gene.reset(&bounds, &mut random)));
            assert!(bounds.contains(gene.walk(&bounds, 0.9, &mut random)));
        }
    }

    #[test]
    fn single_step_walk() {
        let bounds = GeneBounds::new(0, 10).unwrap();
        let mut random = ThreadRandom::seeded(3, 0);
        for _ in 0..100 {
            let gene = 5_i64.walk(&bounds, 0.0, &mut random);
            assert!(gene == 4 || gene == 6);
        }
        // Pinned at a bound, a step can only go inward.
        let pinned = GeneBounds::new(0, 1).unwrap();
        for _ in 0..100 {
            assert_eq!(0_i64.walk(&pinned, 0.0, &mut random), 1);
        }
    }

    #[test]
    fn certain_persistence_still_ends() {
        let bounds = GeneBounds::new(0, 3).unwrap();
        let mut random = ThreadRandom::seeded(6, 0);
        assert!(bounds.contains(1_i64.walk(&bounds, 1.0, &mut random)));
    }

    #[test]
    fn bits_flip() {
        let mut random = ThreadRandom::seeded(0, 0);
        let bounds = GeneBounds::default();
        assert!(false.reset(&bounds, &mut random));
        assert!(!true.walk(&bounds, 0.7, &mut random));
        assert_eq!(true.value(), 1.0);
    }
}
