use super::GenerationConfig;

/// The alphabet, filler and repetition policy of one call, plus the RNG
/// stream seeded from it. One per generation; never shared.
pub struct Universe<'a> {
    config: &'a GenerationConfig,
    rng: fastrand::Rng,
}

impl<'a> Universe<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        Universe { config, rng: fastrand::Rng::with_seed(config.seed) }
    }

    pub fn alphabet(&self) -> &'a [char] {
        &self.config.alphabet
    }

    pub fn boundary_char(&self) -> char {
        self.config.boundary_char
    }

    pub fn repetition_cap(&self) -> usize {
        self.config.repetition_cap
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    /// Uniform draw; `None` only when `choices` is empty.
    pub fn pick(&mut self, choices: &[char]) -> Option<char> {
        if choices.is_empty() {
            return None;
        }
        Some(choices[self.rng.usize(..choices.len())])
    }

    /// Append `count` independent draws from `choices`. `None`, with
    /// nothing written, when `choices` is empty.
    pub fn fill(&mut self, out: &mut String, choices: &[char], count: usize) -> Option<()> {
        if choices.is_empty() {
            return None;
        }
        out.extend((0..count).map(|_| choices[self.rng.usize(..choices.len())]));
        Some(())
    }
}
