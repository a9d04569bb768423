//! Runs a compiled program in "generate" mode.
//!
//! A matcher walks the program and consumes input; this walks the same
//! program and produces input. Every choice is made locally and greedily:
//! alternations take their first arm, optional parts take the configured
//! count, unbounded parts take their minimum, lazy parts take nothing beyond
//! their minimum and negative lookaround is skipped. There is no backtracking;
//! a program shape the local choices cannot satisfy yields an error or a
//! string the caller's matcher rejects.

use std::fmt;

use crate::config::{GenerationConfig, Universe};
use crate::program::{CharClass, Instruction, Opcode, Program, ProgramError, Repetition, UNBOUNDED};

mod marks;
mod resolve;

pub use marks::{EmptyMarks, MarkStack};
pub use resolve::resolve;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no admissible character for {opcode} at offset {offset}")]
    NoAdmissibleCharacter { offset: usize, opcode: Opcode },
    #[error("backreference to group {group} at offset {offset} has nothing captured")]
    UnresolvedBackreference { offset: usize, group: i32 },
    #[error("{opcode} at offset {offset} has no open loop count")]
    EmptyLoopCountStack { offset: usize, opcode: Opcode },
    #[error("{opcode} at offset {offset} closes a group that was never opened")]
    EmptyMarkStack { offset: usize, opcode: Opcode },
    #[error("lookaround opened at offset {offset} has no closing Forejump")]
    UnterminatedLookaround { offset: usize },
    #[error(transparent)]
    Program(#[from] ProgramError),
}

type GenResult<T> = Result<T, GenerationError>;

/// Where the instruction pointer goes after a step.
enum Flow {
    Next,
    Jump(usize),
}

/// Everything one call mutates. Created per call, dropped on return.
pub struct ExecutionState<'a> {
    pub ip: usize,
    pub marks: MarkStack,
    pub counts: Vec<i32>,
    universe: Universe<'a>,
}

impl<'a> ExecutionState<'a> {
    pub fn new(config: &'a GenerationConfig) -> Self {
        ExecutionState { ip: 0, marks: MarkStack::new(), counts: Vec::new(), universe: Universe::new(config) }
    }

    fn trace(&self, args: fmt::Arguments) {
        if self.universe.debug() {
            eprintln!("{args}");
        }
    }
}

/// Produce a string the program should accept.
pub fn generate(program: &Program, config: &GenerationConfig) -> GenResult<String> {
    let mut state = ExecutionState::new(config);
    if config.debug {
        eprint!("{}", program.listing());
    }

    while state.ip < program.len() {
        let inst = program.instruction_at(state.ip)?;
        state.trace(format_args!("{}", program.describe(&inst)));
        state.ip = match step(program, &mut state, &inst)? {
            Flow::Next => state.ip + inst.width(),
            Flow::Jump(target) => target,
        };
    }

    let output = state.marks.finish();
    if config.debug {
        eprintln!("=> {output:?}");
    }
    Ok(output)
}

fn step(program: &Program, state: &mut ExecutionState, inst: &Instruction) -> GenResult<Flow> {
    use Opcode::*;

    let offset = inst.offset;
    let opcode = inst.opcode;

    match opcode {
        Onelazy | Notonelazy | Setlazy => {}

        One | Onerep | Oneloop => {
            let c = inst.char_operand()?;
            for _ in 0..repeat_count(inst, state.universe.repetition_cap()) {
                state.marks.push_char(c);
            }
        }

        Notone | Notonerep | Notoneloop => {
            let class = CharClass::not_char(inst.char_operand()?);
            draw(state, inst, &class)?;
        }

        Set | Setrep | Setloop => {
            let index = inst.operand(0);
            let class = program.class(index).ok_or(ProgramError::InvalidClassIndex {
                offset,
                opcode,
                index,
                len: program.classes().len(),
            })?;
            draw(state, inst, class)?;
        }

        Multi => {
            let index = inst.operand(0);
            let text = program.string(index).ok_or(ProgramError::InvalidStringIndex {
                offset,
                opcode,
                index,
                len: program.strings().len(),
            })?;
            state.marks.push_str(text);
        }

        Ref => {
            let group = inst.operand(0);
            let text = state
                .marks
                .capture(group)
                .ok_or(GenerationError::UnresolvedBackreference { offset, group })?
                .to_owned();
            state.marks.push_str(&text);
        }

        Boundary | ECMABoundary => {
            let c = state.universe.boundary_char();
            state.marks.push_char(c);
        }

        // Any alphabet character; boundary-adjacent ones are not excluded.
        Nonboundary | NonECMABoundary => {
            let alphabet = state.universe.alphabet();
            let c = state
                .universe
                .pick(alphabet)
                .ok_or(GenerationError::NoAdmissibleCharacter { offset, opcode })?;
            state.marks.push_char(c);
        }

        // Assertions the output satisfies by construction, or does not; the
        // caller's matcher decides.
        Bol | Eol | Beginning | Start | EndZ | End => {}
        Nothing | Testref | Prune | Stop | Forejump | Backjump => {}

        // Take the first alternative.
        Lazybranch => {}

        Setmark | Nullmark => state.marks.push(),

        Capturemark => {
            state
                .marks
                .pop(Some(inst.operand(0)))
                .map_err(|EmptyMarks| GenerationError::EmptyMarkStack { offset, opcode })?;
        }

        Getmark | Branchmark | Lazybranchmark => {
            state
                .marks
                .pop(None)
                .map_err(|EmptyMarks| GenerationError::EmptyMarkStack { offset, opcode })?;
        }

        Nullcount | Setcount => state.counts.push(inst.operand(0)),

        Branchcount | Lazybranchcount => {
            let limit = match (opcode, inst.operand(1)) {
                (Lazybranchcount, _) | (_, UNBOUNDED) => 0,
                (_, n) => n.min(i32::try_from(state.universe.repetition_cap()).unwrap_or(i32::MAX)),
            };
            let count = state
                .counts
                .last_mut()
                .ok_or(GenerationError::EmptyLoopCountStack { offset, opcode })?;
            if *count >= limit {
                state.counts.pop();
            } else {
                *count += 1;
                return Ok(Flow::Jump(jump_target(inst)?));
            }
        }

        Goto => return Ok(Flow::Jump(jump_target(inst)?)),

        Setjump => {
            let (end, negative) = lookaround_extent(program, offset)?;
            if negative {
                state.trace(format_args!("     skip negative lookaround {offset}..{end}"));
                return Ok(Flow::Jump(end));
            }
        }
    }

    Ok(Flow::Next)
}

/// Characters a character opcode writes.
///
/// Unbounded loops write nothing: an unbounded quantifier contributes only
/// its minimum, which the paired `*rep` already wrote.
fn repeat_count(inst: &Instruction, cap: usize) -> usize {
    match inst.opcode.repetition() {
        Repetition::Single => 1,
        Repetition::Exact => usize::try_from(inst.operand(1)).unwrap_or(0),
        Repetition::Loop => match inst.operand(1) {
            UNBOUNDED => 0,
            n => usize::try_from(n).unwrap_or(0).min(cap),
        },
        Repetition::Lazy | Repetition::None => 0,
    }
}

fn draw(state: &mut ExecutionState, inst: &Instruction, class: &CharClass) -> GenResult<()> {
    let count = repeat_count(inst, state.universe.repetition_cap());
    if count == 0 {
        return Ok(());
    }
    let alphabet = state.universe.alphabet();
    resolve(class, alphabet)
        .and_then(|choices| state.universe.fill(state.marks.buffer(), &choices, count))
        .ok_or(GenerationError::NoAdmissibleCharacter { offset: inst.offset, opcode: inst.opcode })
}

fn jump_target(inst: &Instruction) -> GenResult<usize> {
    let target = inst.operand(0);
    usize::try_from(target).map_err(|_| {
        GenerationError::Program(ProgramError::InvalidJumpTarget { offset: inst.offset, opcode: inst.opcode, target })
    })
}

/// Scan from a `Setjump` to its matching `Forejump`. Returns the offset just
/// past the bracket and whether it is negative (holds a `Backjump` of its own).
fn lookaround_extent(program: &Program, start: usize) -> GenResult<(usize, bool)> {
    let mut depth = 0usize;
    let mut negative = false;
    let mut at = start + Opcode::Setjump.width();
    while at < program.len() {
        let inst = program.instruction_at(at)?;
        match inst.opcode {
            Opcode::Setjump => depth += 1,
            Opcode::Backjump if depth == 0 => negative = true,
            Opcode::Forejump if depth == 0 => return Ok((at + inst.width(), negative)),
            Opcode::Forejump => depth -= 1,
            _ => {}
        }
        at += inst.width();
    }
    Err(GenerationError::UnterminatedLookaround { offset: start })
}
