/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one line, for --list-errors
    pub long: &'static str,  // full explanation, for --explain
    pub hint: Option<&'static str>,
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "RGX-L001",
        short: "unrecognized escape or character",
        long: r#"## RGX-L001: unrecognized escape or character

The pattern contains a sequence no token accepts, usually an escape
the generator does not know.

**Example:**

    \p{L}+

Unicode property classes are not supported. Spell the range out:

    [a-zA-Z]+
"#,
        hint: None,
    },
    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "RGX-P001",
        short: "unexpected end of pattern",
        long: r#"## RGX-P001: unexpected end of pattern

The pattern stopped where an atom was expected.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-P002",
        short: "unmatched ')'",
        long: r#"## RGX-P002: unmatched ')'

A closing parenthesis has no opening partner.

**Example:**

    ab)c

Escape it to match a literal parenthesis: `ab\)c`.
"#,
        hint: Some("escape it as \\) to match a literal parenthesis"),
    },
    ErrorEntry {
        code: "RGX-P003",
        short: "unclosed group",
        long: r#"## RGX-P003: unclosed group

A group was opened but the pattern ended before its `)`.

**Example:**

    (ab|cd
"#,
        hint: Some("add the missing ')'"),
    },
    ErrorEntry {
        code: "RGX-P004",
        short: "nested quantifier",
        long: r#"## RGX-P004: nested quantifier

A quantifier follows another quantifier.

**Example:**

    a**

Only a single `?` may follow a quantifier, making it lazy (`a*?`).
Wrap the repeat in a group to repeat it again: `(?:a*)*`.
"#,
        hint: Some("wrap the repeated part in (?:...) before quantifying it again"),
    },
    ErrorEntry {
        code: "RGX-P005",
        short: "quantifier has nothing to repeat",
        long: r#"## RGX-P005: quantifier has nothing to repeat

A quantifier appears at the start of a pattern, group or alternative,
or directly after an assertion such as `^` or `\b`.

**Example:**

    *abc
"#,
        hint: Some("escape the quantifier to match it literally, e.g. \\*"),
    },
    ErrorEntry {
        code: "RGX-P006",
        short: "quantifier range out of order",
        long: r#"## RGX-P006: quantifier range out of order

In `{m,n}` the minimum must not exceed the maximum.

**Example:**

    a{5,2}
"#,
        hint: Some("swap the bounds"),
    },
    ErrorEntry {
        code: "RGX-P007",
        short: "reference to undefined group",
        long: r#"## RGX-P007: reference to undefined group

A backreference names a group number larger than the number of groups
in the pattern, or a group name that has not been defined yet.

**Example:**

    (a)\2
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-P008",
        short: "duplicate group name",
        long: r#"## RGX-P008: duplicate group name

Two named groups share a name.

**Example:**

    (?<x>a)(?<x>b)
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-P009",
        short: "unsupported group syntax",
        long: r#"## RGX-P009: unsupported group syntax

`(?` starts a construct other than `(?:`, `(?=`, `(?!`, `(?<=`, `(?<!`
or a named group. Inline flags such as `(?i)` are not supported; pass
them as options instead (`-i`, `-m`, `--dot-all`).
"#,
        hint: Some("use the -i, -m or --dot-all flags instead of inline flags"),
    },
    ErrorEntry {
        code: "RGX-P010",
        short: "unclosed character class",
        long: r#"## RGX-P010: unclosed character class

A `[` has no closing `]`.

**Example:**

    [a-z
"#,
        hint: Some("add the missing ']'"),
    },
    ErrorEntry {
        code: "RGX-P011",
        short: "escape not allowed in a character class",
        long: r#"## RGX-P011: escape not allowed in a character class

Backreferences and assertions other than `\b` (backspace) have no
meaning inside `[...]`.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-P012",
        short: "invalid class range",
        long: r#"## RGX-P012: invalid class range

A range inside a class ends before it starts, or uses a shorthand
class such as `\d` as an endpoint.

**Example:**

    [z-a]
"#,
        hint: Some("put a literal '-' first or last in the class"),
    },
    ErrorEntry {
        code: "RGX-P013",
        short: "unsupported class syntax",
        long: r#"## RGX-P013: unsupported class syntax

A character class holds a nested class, a POSIX class such as
`[:alpha:]`, or a set operator (`&&`, `--`, `~~`). The matcher gives
these a meaning the generator does not share.

**Example:**

    [[:alpha:]]

Spell the members out (`[a-zA-Z]`), or escape the characters to
match them literally: `[a\&\&b]`.
"#,
        hint: Some("spell the class out as ranges, or escape '[', '&', '-' and '~'"),
    },
    // ── Program ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "RGX-C001",
        short: "unknown opcode",
        long: r#"## RGX-C001: unknown opcode

A code word's low six bits do not name any of the 43 opcodes.
Only seen with hand-written or corrupted `--program` input.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-C002",
        short: "truncated instruction",
        long: r#"## RGX-C002: truncated instruction

The code stream ends in the middle of an instruction's operands.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-C003",
        short: "table index out of range",
        long: r#"## RGX-C003: table index out of range

A `Set*` or `Multi` instruction refers to a class or string the
program's tables do not contain.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-C004",
        short: "operand is not a character",
        long: r#"## RGX-C004: operand is not a character

A `One*` or `Notone*` operand is negative, a surrogate, or above U+10FFFF.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-C005",
        short: "negative repeat count",
        long: r#"## RGX-C005: negative repeat count

A `*rep`, `*loop` or `*lazy` instruction carries a negative count.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-C006",
        short: "invalid jump target",
        long: r#"## RGX-C006: invalid jump target

A jump lands outside the program or in the middle of an instruction,
or a `Goto` or `Lazybranch` does not move forward. Only loop branches
(`Branchcount`, `Branchmark` and their lazy forms) may jump back.
"#,
        hint: None,
    },
    // ── Generation ───────────────────────────────────────────────────────────
    ErrorEntry {
        code: "RGX-G001",
        short: "no admissible character",
        long: r#"## RGX-G001: no admissible character

A character instruction needs at least one character, but no alphabet
character belongs to its class and the class has no fallback member
of its own. Classes built from `\d`, `\w` or `\s` have no fallback.

**Example:**

    regexgen --alphabet abc '\d'

Widen the alphabet so it overlaps the class.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-G002",
        short: "unresolved backreference",
        long: r#"## RGX-G002: unresolved backreference

A backreference was reached before its group closed, so there is no
captured text to copy.

**Example:**

    (a\1)
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-G003",
        short: "empty loop count stack",
        long: r#"## RGX-G003: empty loop count stack

A `Branchcount` or `Lazybranchcount` ran with no loop count pushed by
a matching `Nullcount` or `Setcount`. The program is malformed.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-G004",
        short: "empty mark stack",
        long: r#"## RGX-G004: empty mark stack

A `Capturemark`, `Getmark` or `*branchmark` closed a group that was
never opened. The program is malformed.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-G005",
        short: "unterminated lookaround",
        long: r#"## RGX-G005: unterminated lookaround

A `Setjump` has no matching `Forejump`. The program is malformed.
"#,
        hint: None,
    },
    // ── Verification ─────────────────────────────────────────────────────────
    ErrorEntry {
        code: "RGX-V001",
        short: "pattern rejected by the matcher",
        long: r#"## RGX-V001: pattern rejected by the matcher

The verifying matcher could not compile the pattern, so nothing was
generated.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-V002",
        short: "generated string does not match",
        long: r#"## RGX-V002: generated string does not match

Every choice is made once, without backtracking: the first alternative,
the minimum of unbounded repeats, the text of positive lookaround. Some
patterns cannot be satisfied that way.

**Example:**

    ^a(?=b)c

Another seed may help when the failure comes from a random draw; try
`--attempts`.
"#,
        hint: None,
    },
    ErrorEntry {
        code: "RGX-V003",
        short: "matcher runtime failure",
        long: r#"## RGX-V003: matcher runtime failure

The verifying matcher gave up while matching, usually on its
backtracking limit.
"#,
        hint: None,
    },
];

/// Look up an error entry by code (e.g. `"RGX-G001"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code == code)
}
