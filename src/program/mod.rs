use std::fmt;

use serde::{Deserialize, Serialize};

pub mod class;
pub use class::{Category, CharClass, ClassRange};

/// Repeat count meaning "no upper bound" (`*`, `+`, `{m,}`).
pub const UNBOUNDED: i32 = i32::MAX;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("unknown opcode {code} at offset {offset}")]
    UnknownOpcode { offset: usize, code: i32 },
    #[error("{opcode} at offset {offset} is missing operands")]
    Truncated { offset: usize, opcode: Opcode },
    #[error("{opcode} at offset {offset} refers to class {index}, but the program has {len}")]
    InvalidClassIndex { offset: usize, opcode: Opcode, index: i32, len: usize },
    #[error("{opcode} at offset {offset} refers to string {index}, but the program has {len}")]
    InvalidStringIndex { offset: usize, opcode: Opcode, index: i32, len: usize },
    #[error("{opcode} at offset {offset} carries {value}, which is not a character")]
    InvalidCharacter { offset: usize, opcode: Opcode, value: i32 },
    #[error("{opcode} at offset {offset} has negative repeat count {count}")]
    NegativeCount { offset: usize, opcode: Opcode, count: i32 },
    #[error("{opcode} at offset {offset} cannot jump to {target}")]
    InvalidJumpTarget { offset: usize, opcode: Opcode, target: i32 },
}

// ── Opcodes ──────────────────────────────────────────────────────────
//
// Numbering matches the .NET / regexp2 RegexCode layout so listings line up
// with what a backtracking matcher would execute.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Opcode {
    Onerep = 0,
    Notonerep = 1,
    Setrep = 2,
    Oneloop = 3,
    Notoneloop = 4,
    Setloop = 5,
    Onelazy = 6,
    Notonelazy = 7,
    Setlazy = 8,
    One = 9,
    Notone = 10,
    Set = 11,
    Multi = 12,
    Ref = 13,
    Bol = 14,
    Eol = 15,
    Boundary = 16,
    Nonboundary = 17,
    Beginning = 18,
    Start = 19,
    EndZ = 20,
    End = 21,
    Nothing = 22,
    Lazybranch = 23,
    Branchmark = 24,
    Lazybranchmark = 25,
    Nullcount = 26,
    Setcount = 27,
    Branchcount = 28,
    Lazybranchcount = 29,
    Nullmark = 30,
    Setmark = 31,
    Capturemark = 32,
    Getmark = 33,
    Setjump = 34,
    Backjump = 35,
    Forejump = 36,
    Testref = 37,
    Goto = 38,
    Prune = 39,
    Stop = 40,
    ECMABoundary = 41,
    NonECMABoundary = 42,
}

const ALL_OPCODES: [Opcode; 43] = [
    Opcode::Onerep,
    Opcode::Notonerep,
    Opcode::Setrep,
    Opcode::Oneloop,
    Opcode::Notoneloop,
    Opcode::Setloop,
    Opcode::Onelazy,
    Opcode::Notonelazy,
    Opcode::Setlazy,
    Opcode::One,
    Opcode::Notone,
    Opcode::Set,
    Opcode::Multi,
    Opcode::Ref,
    Opcode::Bol,
    Opcode::Eol,
    Opcode::Boundary,
    Opcode::Nonboundary,
    Opcode::Beginning,
    Opcode::Start,
    Opcode::EndZ,
    Opcode::End,
    Opcode::Nothing,
    Opcode::Lazybranch,
    Opcode::Branchmark,
    Opcode::Lazybranchmark,
    Opcode::Nullcount,
    Opcode::Setcount,
    Opcode::Branchcount,
    Opcode::Lazybranchcount,
    Opcode::Nullmark,
    Opcode::Setmark,
    Opcode::Capturemark,
    Opcode::Getmark,
    Opcode::Setjump,
    Opcode::Backjump,
    Opcode::Forejump,
    Opcode::Testref,
    Opcode::Goto,
    Opcode::Prune,
    Opcode::Stop,
    Opcode::ECMABoundary,
    Opcode::NonECMABoundary,
];

/// How many characters a character-producing opcode asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Not a character opcode.
    None,
    /// `One`, `Notone`, `Set`: exactly one character.
    Single,
    /// `*rep`: the mandatory count in operand 1.
    Exact,
    /// `*loop`: the optional count in operand 1, possibly `UNBOUNDED`.
    Loop,
    /// `*lazy`: contributes its minimum, which the preceding `*rep` already wrote.
    Lazy,
}

impl Opcode {
    pub const MASK: i32 = 63;

    /// Operands following the opcode word.
    pub fn operand_count(self) -> usize {
        use Opcode::*;
        match self {
            Nothing | Bol | Eol | Boundary | Nonboundary | ECMABoundary | NonECMABoundary
            | Beginning | Start | EndZ | End | Nullmark | Setmark | Getmark | Setjump
            | Backjump | Forejump | Stop => 0,

            One | Notone | Multi | Ref | Testref | Goto | Nullcount | Setcount | Lazybranch
            | Branchmark | Lazybranchmark | Prune | Set => 1,

            Capturemark | Branchcount | Lazybranchcount | Onerep | Notonerep | Oneloop
            | Notoneloop | Onelazy | Notonelazy | Setlazy | Setrep | Setloop => 2,
        }
    }

    /// Total instruction width in code words.
    pub fn width(self) -> usize {
        1 + self.operand_count()
    }

    pub fn repetition(self) -> Repetition {
        use Opcode::*;
        match self {
            One | Notone | Set => Repetition::Single,
            Onerep | Notonerep | Setrep => Repetition::Exact,
            Oneloop | Notoneloop | Setloop => Repetition::Loop,
            Onelazy | Notonelazy | Setlazy => Repetition::Lazy,
            _ => Repetition::None,
        }
    }

    /// Whether operand 0 is an absolute jump target.
    pub fn is_jump(self) -> bool {
        use Opcode::*;
        matches!(
            self,
            Lazybranch | Branchmark | Lazybranchmark | Branchcount | Lazybranchcount | Goto
        )
    }

    pub fn name(self) -> &'static str {
        use Opcode::*;
        match self {
            Onerep => "Onerep",
            Notonerep => "Notonerep",
            Setrep => "Setrep",
            Oneloop => "Oneloop",
            Notoneloop => "Notoneloop",
            Setloop => "Setloop",
            Onelazy => "Onelazy",
            Notonelazy => "Notonelazy",
            Setlazy => "Setlazy",
            One => "One",
            Notone => "Notone",
            Set => "Set",
            Multi => "Multi",
            Ref => "Ref",
            Bol => "Bol",
            Eol => "Eol",
            Boundary => "Boundary",
            Nonboundary => "Nonboundary",
            Beginning => "Beginning",
            Start => "Start",
            EndZ => "EndZ",
            End => "End",
            Nothing => "Nothing",
            Lazybranch => "Lazybranch",
            Branchmark => "Branchmark",
            Lazybranchmark => "Lazybranchmark",
            Nullcount => "Nullcount",
            Setcount => "Setcount",
            Branchcount => "Branchcount",
            Lazybranchcount => "Lazybranchcount",
            Nullmark => "Nullmark",
            Setmark => "Setmark",
            Capturemark => "Capturemark",
            Getmark => "Getmark",
            Setjump => "Setjump",
            Backjump => "Backjump",
            Forejump => "Forejump",
            Testref => "Testref",
            Goto => "Goto",
            Prune => "Prune",
            Stop => "Stop",
            ECMABoundary => "ECMABoundary",
            NonECMABoundary => "NonECMABoundary",
        }
    }
}

impl TryFrom<i32> for Opcode {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, i32> {
        usize::try_from(code)
            .ok()
            .and_then(|i| ALL_OPCODES.get(i).copied())
            .ok_or(code)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Modifiers ────────────────────────────────────────────────────────

/// Flag bits OR-ed into an opcode word above `Opcode::MASK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers(i32);

impl Modifiers {
    pub const RTL: i32 = 64;
    pub const CI: i32 = 512;

    pub fn from_bits(bits: i32) -> Self {
        Modifiers(bits & !Opcode::MASK)
    }

    pub fn rtl(self) -> bool {
        self.0 & Self::RTL != 0
    }

    pub fn ci(self) -> bool {
        self.0 & Self::CI != 0
    }
}

/// Split a code word into its opcode and modifier bits.
pub fn decode(code: i32) -> Option<(Opcode, Modifiers)> {
    let op = Opcode::try_from(code & Opcode::MASK).ok()?;
    Some((op, Modifiers::from_bits(code)))
}

// ── Instruction ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: Opcode,
    pub modifiers: Modifiers,
    operands: [i32; 2],
}

impl Instruction {
    pub fn width(&self) -> usize {
        self.opcode.width()
    }

    pub fn operands(&self) -> &[i32] {
        &self.operands[..self.opcode.operand_count()]
    }

    /// Operand `i`, or 0 when the opcode has fewer operands.
    pub fn operand(&self, i: usize) -> i32 {
        self.operands().get(i).copied().unwrap_or(0)
    }

    pub fn char_operand(&self) -> Result<char, ProgramError> {
        let value = self.operand(0);
        u32::try_from(value)
            .ok()
            .and_then(char::from_u32)
            .ok_or(ProgramError::InvalidCharacter { offset: self.offset, opcode: self.opcode, value })
    }
}

// ── Program ──────────────────────────────────────────────────────────

/// A compiled pattern: a flat code stream plus the class and string tables
/// its operands index into. Validated on construction, immutable after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProgram", into = "RawProgram")]
pub struct Program {
    codes: Vec<i32>,
    classes: Vec<CharClass>,
    strings: Vec<String>,
    starts: Vec<usize>,
}

#[derive(Serialize, Deserialize)]
struct RawProgram {
    codes: Vec<i32>,
    #[serde(default)]
    classes: Vec<CharClass>,
    #[serde(default)]
    strings: Vec<String>,
}

impl TryFrom<RawProgram> for Program {
    type Error = ProgramError;

    fn try_from(raw: RawProgram) -> Result<Self, ProgramError> {
        Program::new(raw.codes, raw.classes, raw.strings)
    }
}

impl From<Program> for RawProgram {
    fn from(p: Program) -> Self {
        RawProgram { codes: p.codes, classes: p.classes, strings: p.strings }
    }
}

impl Program {
    pub fn new(codes: Vec<i32>, classes: Vec<CharClass>, strings: Vec<String>) -> Result<Self, ProgramError> {
        let mut starts = Vec::new();
        let mut offset = 0;
        while offset < codes.len() {
            let code = codes[offset];
            let (opcode, _) = decode(code).ok_or(ProgramError::UnknownOpcode { offset, code })?;
            if offset + opcode.width() > codes.len() {
                return Err(ProgramError::Truncated { offset, opcode });
            }
            starts.push(offset);
            offset += opcode.width();
        }

        let program = Program { codes, classes, strings, starts };
        for &offset in &program.starts {
            program.validate_operands(offset)?;
        }
        Ok(program)
    }

    fn validate_operands(&self, offset: usize) -> Result<(), ProgramError> {
        let inst = self.instruction_at(offset)?;
        let opcode = inst.opcode;

        match opcode {
            Opcode::Set | Opcode::Setrep | Opcode::Setloop | Opcode::Setlazy => {
                self.class(inst.operand(0)).ok_or(ProgramError::InvalidClassIndex {
                    offset,
                    opcode,
                    index: inst.operand(0),
                    len: self.classes.len(),
                })?;
            }
            Opcode::Multi => {
                self.string(inst.operand(0)).ok_or(ProgramError::InvalidStringIndex {
                    offset,
                    opcode,
                    index: inst.operand(0),
                    len: self.strings.len(),
                })?;
            }
            _ if opcode.repetition() != Repetition::None => {
                inst.char_operand()?;
            }
            _ => {}
        }

        if matches!(opcode.repetition(), Repetition::Exact | Repetition::Loop | Repetition::Lazy)
            && inst.operand(1) < 0
        {
            return Err(ProgramError::NegativeCount { offset, opcode, count: inst.operand(1) });
        }

        if opcode.is_jump() {
            let target = inst.operand(0);
            // loop branches may jump back; every other jump must move forward
            let backward_ok = matches!(
                opcode,
                Opcode::Branchcount | Opcode::Lazybranchcount | Opcode::Branchmark | Opcode::Lazybranchmark
            );
            let valid = usize::try_from(target)
                .map(|t| self.starts.binary_search(&t).is_ok() && (backward_ok || t > offset))
                .unwrap_or(false);
            if !valid {
                return Err(ProgramError::InvalidJumpTarget { offset, opcode, target });
            }
        }
        Ok(())
    }

    /// Length of the code stream in words; offsets range over `0..len()`.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    pub fn classes(&self) -> &[CharClass] {
        &self.classes
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn class(&self, index: i32) -> Option<&CharClass> {
        usize::try_from(index).ok().and_then(|i| self.classes.get(i))
    }

    pub fn string(&self, index: i32) -> Option<&str> {
        usize::try_from(index).ok().and_then(|i| self.strings.get(i)).map(String::as_str)
    }

    /// Decode the instruction starting at `offset`.
    pub fn instruction_at(&self, offset: usize) -> Result<Instruction, ProgramError> {
        let code = self.codes.get(offset).copied().unwrap_or(-1);
        let (opcode, modifiers) = decode(code).ok_or(ProgramError::UnknownOpcode { offset, code })?;
        let words = self
            .codes
            .get(offset + 1..offset + opcode.width())
            .ok_or(ProgramError::Truncated { offset, opcode })?;
        let mut operands = [0; 2];
        operands[..words.len()].copy_from_slice(words);
        Ok(Instruction { offset, opcode, modifiers, operands })
    }

    pub fn instructions(&self) -> impl Iterator<Item = Instruction> + '_ {
        self.starts.iter().filter_map(|&offset| self.instruction_at(offset).ok())
    }

    /// One-line rendering of an instruction, used by traces and `--debug`.
    pub fn describe(&self, inst: &Instruction) -> String {
        let mut out = format!("{:04} ", inst.offset);
        if inst.modifiers.rtl() {
            out.push('<');
        } else {
            out.push(' ');
        }
        if inst.modifiers.ci() {
            out.push_str("ci ");
        } else {
            out.push_str("   ");
        }
        out.push_str(&format!("{:<16}", inst.opcode.name()));

        let op = inst.opcode;
        let detail = match op {
            _ if op.repetition() != Repetition::None && !matches!(op, Opcode::Set | Opcode::Setrep | Opcode::Setloop | Opcode::Setlazy) => {
                let ch = inst.char_operand().map(|c| format!("{c:?}")).unwrap_or_else(|_| "?".into());
                match op.operand_count() {
                    1 => format!("Ch = {ch}"),
                    _ => format!("Ch = {ch}, Rep = {}", rep_text(inst.operand(1))),
                }
            }
            Opcode::Set | Opcode::Setrep | Opcode::Setloop | Opcode::Setlazy => {
                let set = self.class(inst.operand(0)).map(|c| c.to_string()).unwrap_or_else(|| "?".into());
                match op.operand_count() {
                    1 => format!("Set = {set}"),
                    _ => format!("Set = {set}, Rep = {}", rep_text(inst.operand(1))),
                }
            }
            Opcode::Multi => format!("String = {:?}", self.string(inst.operand(0)).unwrap_or("?")),
            Opcode::Ref | Opcode::Testref => format!("Index = {}", inst.operand(0)),
            Opcode::Capturemark => format!("Index = {}, Unindex = {}", inst.operand(0), inst.operand(1)),
            Opcode::Nullcount | Opcode::Setcount => format!("Value = {}", inst.operand(0)),
            Opcode::Branchcount | Opcode::Lazybranchcount => {
                format!("Addr = {}, Limit = {}", inst.operand(0), rep_text(inst.operand(1)))
            }
            _ if op.is_jump() => format!("Addr = {}", inst.operand(0)),
            _ => String::new(),
        };
        out.push_str(&detail);
        out.trim_end().to_string()
    }

    /// Full program listing, one instruction per line.
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for inst in self.instructions() {
            out.push_str(&self.describe(&inst));
            out.push('\n');
        }
        out
    }
}

fn rep_text(n: i32) -> String {
    if n == UNBOUNDED { "inf".to_string() } else { n.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(o: Opcode) -> i32 {
        o as i32
    }

    #[test]
    fn opcode_table_matches_discriminants() {
        for (i, o) in ALL_OPCODES.iter().enumerate() {
            assert_eq!(*o as i32, i as i32, "{o} is out of place");
            assert_eq!(Opcode::try_from(i as i32), Ok(*o));
        }
        assert_eq!(Opcode::try_from(43), Err(43));
        assert_eq!(Opcode::try_from(-1), Err(-1));
    }

    #[test]
    fn widths() {
        assert_eq!(Opcode::Stop.width(), 1);
        assert_eq!(Opcode::Setjump.width(), 1);
        assert_eq!(Opcode::One.width(), 2);
        assert_eq!(Opcode::Goto.width(), 2);
        assert_eq!(Opcode::Capturemark.width(), 3);
        assert_eq!(Opcode::Setloop.width(), 3);
        assert_eq!(Opcode::Branchcount.width(), 3);
    }

    #[test]
    fn decode_strips_modifiers() {
        let (o, m) = decode(op(Opcode::One) | Modifiers::CI | Modifiers::RTL).unwrap();
        assert_eq!(o, Opcode::One);
        assert!(m.ci());
        assert!(m.rtl());
        assert!(decode(63).is_none());
    }

    #[test]
    fn instruction_operands() {
        let p = Program::new(
            vec![op(Opcode::Onerep), 'a' as i32, 3, op(Opcode::Stop)],
            vec![],
            vec![],
        )
        .unwrap();
        let inst = p.instruction_at(0).unwrap();
        assert_eq!(inst.operands(), &['a' as i32, 3]);
        assert_eq!(inst.char_operand().unwrap(), 'a');
        assert_eq!(p.instruction_at(3).unwrap().operands(), &[] as &[i32]);
        assert_eq!(p.instructions().count(), 2);
    }

    #[test]
    fn rejects_unknown_opcode() {
        let err = Program::new(vec![op(Opcode::Nothing), 50], vec![], vec![]).unwrap_err();
        assert_eq!(err, ProgramError::UnknownOpcode { offset: 1, code: 50 });
    }

    #[test]
    fn rejects_truncated_instruction() {
        let err = Program::new(vec![op(Opcode::Onerep), 'a' as i32], vec![], vec![]).unwrap_err();
        assert_eq!(err, ProgramError::Truncated { offset: 0, opcode: Opcode::Onerep });
    }

    #[test]
    fn rejects_bad_table_indices() {
        let err = Program::new(vec![op(Opcode::Set), 0], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ProgramError::InvalidClassIndex { index: 0, len: 0, .. }));

        let err = Program::new(vec![op(Opcode::Multi), 2], vec![], vec!["ab".into()]).unwrap_err();
        assert!(matches!(err, ProgramError::InvalidStringIndex { index: 2, len: 1, .. }));
    }

    #[test]
    fn rejects_jump_into_operand() {
        // offset 3 is the operand of One, not an instruction start
        let err = Program::new(
            vec![op(Opcode::Goto), 3, op(Opcode::One), 'x' as i32],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ProgramError::InvalidJumpTarget { target: 3, .. }));
    }

    #[test]
    fn rejects_goto_that_does_not_move_forward() {
        let back = Program::new(vec![op(Opcode::One), 'a' as i32, op(Opcode::Goto), 0], vec![], vec![]).unwrap_err();
        assert!(matches!(back, ProgramError::InvalidJumpTarget { offset: 2, target: 0, .. }));

        let own = Program::new(vec![op(Opcode::Goto), 0], vec![], vec![]).unwrap_err();
        assert!(matches!(own, ProgramError::InvalidJumpTarget { offset: 0, target: 0, .. }));

        let lazy = Program::new(
            vec![op(Opcode::Nothing), op(Opcode::Lazybranch), 0, op(Opcode::Stop)],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(lazy, ProgramError::InvalidJumpTarget { offset: 1, .. }));
    }

    #[test]
    fn accepts_loop_back_edges() {
        let p = Program::new(
            vec![
                op(Opcode::Setcount), 0,
                op(Opcode::One), 'a' as i32,
                op(Opcode::Branchcount), 2, 3,
                op(Opcode::Setmark),
                op(Opcode::One), 'b' as i32,
                op(Opcode::Branchmark), 8,
                op(Opcode::Stop),
            ],
            vec![],
            vec![],
        );
        assert!(p.is_ok(), "{p:?}");
    }

    #[test]
    fn rejects_negative_count_and_bad_char() {
        let err = Program::new(vec![op(Opcode::Oneloop), 'a' as i32, -2], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ProgramError::NegativeCount { count: -2, .. }));

        let err = Program::new(vec![op(Opcode::One), 0xD800], vec![], vec![]).unwrap_err();
        assert!(matches!(err, ProgramError::InvalidCharacter { value: 0xD800, .. }));
    }

    #[test]
    fn listing_describes_operands() {
        let p = Program::new(
            vec![
                op(Opcode::Setrep), 0, 2,
                op(Opcode::Oneloop), 'b' as i32, UNBOUNDED,
                op(Opcode::Multi), 0,
                op(Opcode::Stop),
            ],
            vec![CharClass::range('a', 'z')],
            vec!["test".into()],
        )
        .unwrap();
        let text = p.listing();
        assert!(text.contains("Setrep"), "{text}");
        assert!(text.contains("Set = [a-z], Rep = 2"), "{text}");
        assert!(text.contains("Rep = inf"), "{text}");
        assert!(text.contains("String = \"test\""), "{text}");
    }

    #[test]
    fn json_roundtrip_validates() {
        let p = Program::new(vec![op(Opcode::One), 'q' as i32, op(Opcode::Stop)], vec![], vec![]).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        let back: Program = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);

        let bad = r#"{"codes":[12,0]}"#;
        assert!(serde_json::from_str::<Program>(bad).is_err());
    }
}
