use rand::rngs::StdRng;
use rand::{Error, Rng, RngCore, SeedableRng};

/// A worker thread's private random generator.
///
/// Every breeding thread owns exactly one, seeded from the run
/// seed and the thread number, so no random state is ever shared.
/// It also implements [`RngCore`], so it can be handed to anything
/// taking a `rand` generator.
#[derive(Clone, Debug)]
pub struct ThreadRandom(StdRng);

impl ThreadRandom {
    /// Returns the generator for `thread` in a run seeded with `seed`.
    ///
    /// # Examples
    /// ```
    /// use oxiec::rng::ThreadRandom;
    ///
    /// let mut a = ThreadRandom::seeded(7, 0);
    /// let mut b = ThreadRandom::seeded(7, 0);
    /// assert_eq!(a.next_index(1000), b.next_index(1000));
    /// ```
    pub fn seeded(seed: u64, thread: usize) -> ThreadRandom {
        ThreadRandom(StdRng::seed_from_u64(seed.wrapping_add(thread as u64)))
    }

    /// True with probability `chance`.
    pub fn next_bool(&mut self, chance: f64) -> bool {
        self.0.gen::<f64>() < chance
    }

    /// A uniform index in `0..n`. `n` must be positive.
    pub fn next_index(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }

    /// A uniform value in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.0.gen()
    }
}

impl RngCore for ThreadRandom {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.0.try_fill_bytes(dest)
    }
}
