use proptest::prelude::*;
use regexgen::{Error, GenerationConfig, GenerationError, Generator, PatternOptions};

const DEFAULT_PROPTEST_CASES: u32 = 64;

fn proptest_cases() -> u32 {
    std::env::var("REGEXGEN_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PROPTEST_CASES)
}

/// Patterns whose every generated string must match, whatever the seed.
const ALWAYS_SATISFIABLE: &[&str] = &[
    "test",
    "^(a){5}(b){1}(c)?$",
    "^(3C|C0)$",
    "[a-z]{1,3}[0-9]+",
    r"(a(a))\1",
    r"^\d{3}-\d{4}$",
    "^foo(?!x)",
    r"\bword\b",
    r"^[A-F0-9]{8}-[A-F0-9]{4}$",
    r"^(?<user>[a-z]{2,6})@(?:example|test)\.com$",
    r"^\w+\s\S+$",
    "^(?:ab|cd){2,3}x*y+?$",
];

fn generator(pattern: &str) -> Generator {
    Generator::new(pattern).unwrap_or_else(|e| panic!("{pattern}: {e}"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        .. ProptestConfig::default()
    })]

    #[test]
    fn satisfiable_patterns_always_match(seed in any::<u64>(), index in 0..ALWAYS_SATISFIABLE.len()) {
        let pattern = ALWAYS_SATISFIABLE[index];
        let result = generator(pattern).generate(&GenerationConfig::new(seed));
        prop_assert!(result.is_ok(), "{pattern} with seed {seed}: {result:?}");
    }

    #[test]
    fn same_seed_same_output(seed in any::<u64>()) {
        let g = generator("[a-z0-9]{4,12}-\\w{3}");
        let config = GenerationConfig::new(seed);
        prop_assert_eq!(g.generate(&config).unwrap(), g.generate(&config).unwrap());
    }

    #[test]
    fn bounded_repeat_length_respects_bounds_and_cap(
        seed in any::<u64>(),
        min in 0u32..5,
        extra in 0u32..10,
        cap in 0usize..6,
    ) {
        let max = min + extra;
        let pattern = format!("^[a-z]{{{min},{max}}}$");
        let config = GenerationConfig::new(seed).with_repetition_cap(cap);
        let out = generator(&pattern).generate(&config).unwrap();
        let len = out.chars().count() as u32;
        prop_assert!(len >= min, "{pattern}: {out:?}");
        prop_assert!(len <= max, "{pattern}: {out:?}");
        prop_assert!(len <= min + cap as u32, "{pattern} cap {cap}: {out:?}");
    }

    #[test]
    fn counted_group_repeats_respect_bounds_and_cap(
        seed in any::<u64>(),
        min in 0u32..4,
        extra in 0u32..8,
        cap in 0usize..5,
        lazy in any::<bool>(),
    ) {
        let max = min + extra;
        let pattern = format!("^(?:ab){{{min},{max}}}{}$", if lazy { "?" } else { "" });
        let config = GenerationConfig::new(seed).with_repetition_cap(cap);
        let out = generator(&pattern).generate(&config).unwrap();
        prop_assert_eq!(out.len() % 2, 0, "{}: {:?}", pattern, out);
        let reps = (out.len() / 2) as u32;
        if lazy {
            prop_assert_eq!(reps, min, "{}: {:?}", pattern, out);
        } else {
            prop_assert_eq!(reps, max.min(min + cap as u32), "{}: {:?}", pattern, out);
        }
    }

    #[test]
    fn literal_patterns_generate_themselves(text in "[a-zA-Z0-9 _]{1,20}") {
        let out = generator(&text).generate(&GenerationConfig::new(0)).unwrap();
        prop_assert_eq!(out, text);
    }

    #[test]
    fn free_choices_stay_in_alphabet(seed in any::<u64>(), alphabet in "[a-z]{1,8}", n in 1usize..16) {
        let pattern = format!("^.{{{n}}}$");
        let config = GenerationConfig::new(seed).with_alphabet(alphabet.chars());
        let out = generator(&pattern).generate(&config).unwrap();
        prop_assert_eq!(out.chars().count(), n);
        prop_assert!(out.chars().all(|c| alphabet.contains(c)), "{out:?} outside {alphabet:?}");
    }
}

#[test]
fn known_outputs() {
    let config = GenerationConfig::new(7);
    assert_eq!(generator("test").generate(&config).unwrap(), "test");
    assert_eq!(generator(r"(a(a))\1").generate(&config).unwrap(), "aaaa");
    assert_eq!(generator("^(3C|C0)$").generate(&config).unwrap(), "3C");
}

#[test]
fn backreference_inside_its_own_group_fails() {
    let err = generator(r"(a\1)").generate(&GenerationConfig::new(0)).unwrap_err();
    assert!(
        matches!(err, Error::Generation(GenerationError::UnresolvedBackreference { group: 1, .. })),
        "{err:?}"
    );
}

#[test]
fn digit_class_with_empty_alphabet_fails() {
    let config = GenerationConfig::new(0).with_alphabet(std::iter::empty());
    let err = generator(r"\d").generate(&config).unwrap_err();
    assert!(matches!(err, Error::Generation(GenerationError::NoAdmissibleCharacter { .. })), "{err:?}");
}

#[test]
fn class_outside_alphabet_uses_its_own_member() {
    let config = GenerationConfig::new(0).with_alphabet(('a'..='z').chain('0'..='9'));
    let out = generator(r"[\x80-\xff]").generate(&config).unwrap();
    assert_eq!(out, "\u{80}");
}

#[test]
fn case_insensitive_pattern_verifies() {
    let g = Generator::with_options("^Hello[A-Z]$", PatternOptions::default().case_insensitive(true)).unwrap();
    for seed in 0..20 {
        let out = g.generate(&GenerationConfig::new(seed)).unwrap();
        assert!(out.starts_with("Hello"), "{out}");
    }
}
