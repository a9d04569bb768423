use serde::{Deserialize, Serialize};

pub mod universe;
pub use universe::Universe;

/// Printable characters used to fill free choices when no alphabet is given.
/// CR and LF are left out so generated strings stay on one line.
pub const DEFAULT_ALPHABET: &str =
    "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_ \\";

pub const DEFAULT_BOUNDARY: char = ' ';

pub const DEFAULT_REPETITION_CAP: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("invalid config {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Settings for one generation call. Borrowed, never mutated, by the interpreter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Ordered sampling domain for free choices. Duplicates are dropped.
    #[serde(with = "alphabet_text")]
    pub alphabet: Vec<char>,
    pub seed: u64,
    /// Upper bound on the optional part of any bounded repetition.
    pub repetition_cap: usize,
    /// Written wherever a `\b` assertion sits.
    pub boundary_char: char,
    /// Trace each executed instruction to stderr.
    pub debug: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            alphabet: DEFAULT_ALPHABET.chars().collect(),
            seed: 0,
            repetition_cap: DEFAULT_REPETITION_CAP,
            boundary_char: DEFAULT_BOUNDARY,
            debug: false,
        }
    }
}

impl GenerationConfig {
    pub fn new(seed: u64) -> Self {
        GenerationConfig { seed, ..Self::default() }
    }

    pub fn with_alphabet(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.alphabet = dedup(chars);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_repetition_cap(mut self, cap: usize) -> Self {
        self.repetition_cap = cap;
        self
    }

    pub fn with_boundary_char(mut self, c: char) -> Self {
        self.boundary_char = c;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_string(), source })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_string(), source })
    }
}

fn dedup(chars: impl IntoIterator<Item = char>) -> Vec<char> {
    let mut out: Vec<char> = Vec::new();
    for c in chars {
        if !out.contains(&c) {
            out.push(c);
        }
    }
    out
}

/// The alphabet travels as a plain string in config files.
mod alphabet_text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(alphabet: &[char], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&alphabet.iter().collect::<String>())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<char>, D::Error> {
        let text = String::deserialize(d)?;
        Ok(super::dedup(text.chars()))
    }
}

/// Flags that change how a pattern is read. The generator itself never looks
/// at them; they shape compilation and the verifying matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternOptions {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
}

impl PatternOptions {
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    pub fn multi_line(mut self, enabled: bool) -> Self {
        self.multi_line = enabled;
        self
    }

    pub fn dot_matches_new_line(mut self, enabled: bool) -> Self {
        self.dot_matches_new_line = enabled;
        self
    }
}
