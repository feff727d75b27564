use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Independent random streams derived from one iteration, so that e.g. pacing jitter never
/// shifts identity draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RngStream {
    Identity = 1,
    Spoof = 2,
    Pacing = 3,
}

/// One executed request attempt of one virtual user.
///
/// Every random choice of an iteration is drawn from [`IterationContext::rng`], which makes it a
/// pure function of `(seed, vu, iteration)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IterationContext {
    pub vu: u64,
    pub iteration: u64,
    seed: u64,
}

impl IterationContext {
    pub fn new(vu: u64, iteration: u64, seed: u64) -> Self {
        Self {
            vu,
            iteration,
            seed,
        }
    }

    pub fn rng(&self, stream: RngStream) -> SmallRng {
        let mixed = splitmix64(self.seed ^ stream as u64);
        let mixed = splitmix64(mixed ^ self.vu);
        SmallRng::seed_from_u64(splitmix64(mixed ^ self.iteration))
    }
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
