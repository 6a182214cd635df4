//! Seeded, platform-independent pseudo-randomness.
//!
//! Input ordering and change-address choice must be reproducible from a
//! session seed, so this uses the Park–Miller minimal standard generator
//! rather than an OS-backed RNG.

/// Modulus of the generator, `2^31 - 1`.
const MODULUS: u64 = 2_147_483_647;

const MULTIPLIER: u64 = 16_807;

/// Park–Miller Lehmer generator.
#[derive(Debug, Clone)]
pub struct PseudoRandom {
    state: u64,
}

impl PseudoRandom {
    pub fn new(seed: u32) -> Self {
        let mut state = u64::from(seed) % MODULUS;
        if state == 0 {
            state = MODULUS - 1;
        }
        Self { state }
    }

    /// Next value in `1..2^31 - 1`.
    pub fn next_int(&mut self) -> u32 {
        self.state = self.state * MULTIPLIER % MODULUS;
        // state < 2^31, always fits
        self.state as u32
    }

    /// Uniform-ish index in `0..bound`. `bound` must be non-zero.
    fn next_index(&mut self, bound: usize) -> usize {
        self.next_int() as usize % bound
    }
}

/// Fisher–Yates shuffle driven by `rng`, from the last index down to 1.
pub fn shuffle<T>(items: &mut [T], rng: &mut PseudoRandom) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Pick one candidate. `None` when there are no candidates.
pub fn pick<'a, T>(candidates: &'a [T], rng: &mut PseudoRandom) -> Option<&'a T> {
    if candidates.is_empty() {
        return None;
    }
    candidates.get(rng.next_index(candidates.len()))
}
