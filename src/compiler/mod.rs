//! Pattern text to program: lex, parse, then lay the tree out as a flat
//! code stream in the backtracking-matcher layout the interpreter expects.

use crate::ast::{Anchor, Node, Pattern};
use crate::config::PatternOptions;
use crate::lexer::{lex, LexError};
use crate::parser::{ParseError, Parser};
use crate::program::{CharClass, Modifiers, Opcode, Program, ProgramError, Repetition, UNBOUNDED};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Program(#[from] ProgramError),
}

pub fn compile_pattern(source: &str, options: PatternOptions) -> Result<Program, CompileError> {
    let tokens = lex(source)?;
    let pattern = Parser::new(source, tokens).parse_pattern()?;
    Ok(compile(&pattern, options)?)
}

/// Lay out a parsed pattern. The whole match is capture group 0, wrapped
/// in the usual `Lazybranch`/`Setmark` ... `Capturemark 0`/`Stop` frame.
pub fn compile(pattern: &Pattern, options: PatternOptions) -> Result<Program, ProgramError> {
    let mut w = Writer { codes: Vec::new(), classes: Vec::new(), strings: Vec::new(), options };
    let entry = w.emit(Opcode::Lazybranch, false, &[0]);
    w.emit(Opcode::Setmark, false, &[]);
    w.node(&pattern.root, false);
    w.emit(Opcode::Capturemark, false, &[0, -1]);
    let stop = w.emit(Opcode::Stop, false, &[]);
    w.patch(entry, stop);
    Program::new(w.codes, w.classes, w.strings)
}

struct Writer {
    codes: Vec<i32>,
    classes: Vec<CharClass>,
    strings: Vec<String>,
    options: PatternOptions,
}

/// What a single-character node reads.
enum Single {
    One(char),
    Notone(char),
    Set(i32),
}

impl Writer {
    fn here(&self) -> usize {
        self.codes.len()
    }

    /// Append an instruction, returning its offset.
    fn emit(&mut self, op: Opcode, rtl: bool, operands: &[i32]) -> usize {
        let at = self.here();
        let mut code = op as i32;
        if rtl {
            code |= Modifiers::RTL;
        }
        let reads_text = op.repetition() != Repetition::None || matches!(op, Opcode::Multi | Opcode::Ref);
        if self.options.case_insensitive && reads_text {
            code |= Modifiers::CI;
        }
        self.codes.push(code);
        self.codes.extend_from_slice(operands);
        at
    }

    /// Point the jump at `at` to `target`.
    fn patch(&mut self, at: usize, target: usize) {
        self.codes[at + 1] = target as i32;
    }

    fn class(&mut self, class: CharClass) -> i32 {
        let index = match self.classes.iter().position(|c| *c == class) {
            Some(i) => i,
            None => {
                self.classes.push(class);
                self.classes.len() - 1
            }
        };
        index as i32
    }

    fn string(&mut self, s: String) -> i32 {
        let index = match self.strings.iter().position(|t| *t == s) {
            Some(i) => i,
            None => {
                self.strings.push(s);
                self.strings.len() - 1
            }
        };
        index as i32
    }

    fn single(&mut self, node: &Node) -> Option<Single> {
        if let Some(c) = node.as_char() {
            return Some(Single::One(c));
        }
        match node {
            Node::Any if self.options.dot_matches_new_line => Some(Single::Set(self.class(CharClass::any()))),
            Node::Any => Some(Single::Notone('\n')),
            Node::Class(class) => Some(Single::Set(self.class(class.clone()))),
            Node::Group(inner) => self.single(inner),
            _ => None,
        }
    }

    fn node(&mut self, node: &Node, rtl: bool) {
        match node {
            Node::Empty => {}
            Node::Char(_) | Node::Any | Node::Class(_) => {
                if let Some(single) = self.single(node) {
                    self.single_repeat(single, 1, Some(1), false, rtl);
                }
            }
            Node::Concat(items) => self.concat(items, rtl),
            Node::Alternate(arms) => self.alternate(arms, rtl),
            Node::Group(inner) => self.node(inner, rtl),
            Node::Capture { index, node } => {
                self.emit(Opcode::Setmark, rtl, &[]);
                self.node(node, rtl);
                self.emit(Opcode::Capturemark, rtl, &[*index as i32, -1]);
            }
            Node::Repeat { node: inner, min, max, lazy } => {
                match self.single(inner) {
                    Some(single) => self.single_repeat(single, *min, *max, *lazy, rtl),
                    None => self.general_repeat(inner, *min, *max, *lazy, rtl),
                }
            }
            Node::Backref(index) => {
                self.emit(Opcode::Ref, rtl, &[*index as i32]);
            }
            Node::Assert(anchor) => {
                let op = self.anchor(*anchor);
                self.emit(op, rtl, &[]);
            }
            Node::LookAround { node, negative, behind } => self.lookaround(node, *negative, *behind),
        }
    }

    fn anchor(&self, anchor: Anchor) -> Opcode {
        let multi_line = self.options.multi_line;
        match anchor {
            Anchor::LineStart if multi_line => Opcode::Bol,
            Anchor::LineStart => Opcode::Beginning,
            Anchor::LineEnd if multi_line => Opcode::Eol,
            Anchor::LineEnd => Opcode::EndZ,
            Anchor::TextStart => Opcode::Beginning,
            Anchor::TextEnd => Opcode::End,
            Anchor::TextEndNewline => Opcode::EndZ,
            Anchor::Continue => Opcode::Start,
            Anchor::WordBoundary => Opcode::Boundary,
            Anchor::NotWordBoundary => Opcode::Nonboundary,
        }
    }

    /// Runs of two or more literal characters become one `Multi`.
    fn concat(&mut self, items: &[Node], rtl: bool) {
        let mut run = String::new();
        for item in items {
            if let Node::Char(c) = item {
                run.push(*c);
                continue;
            }
            self.flush_run(&mut run, rtl);
            self.node(item, rtl);
        }
        self.flush_run(&mut run, rtl);
    }

    fn flush_run(&mut self, run: &mut String, rtl: bool) {
        let mut chars = run.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {}
            (Some(c), None) => {
                self.emit(Opcode::One, rtl, &[c as i32]);
            }
            _ => {
                let index = self.string(std::mem::take(run));
                self.emit(Opcode::Multi, rtl, &[index]);
            }
        }
        run.clear();
    }

    /// `Lazybranch next; arm; Goto exit` for every arm but the last.
    fn alternate(&mut self, arms: &[Node], rtl: bool) {
        let mut exits = Vec::new();
        let Some((last, rest)) = arms.split_last() else { return };
        for arm in rest {
            let branch = self.emit(Opcode::Lazybranch, rtl, &[0]);
            self.node(arm, rtl);
            exits.push(self.emit(Opcode::Goto, rtl, &[0]));
            let next = self.here();
            self.patch(branch, next);
        }
        self.node(last, rtl);
        let exit = self.here();
        for at in exits {
            self.patch(at, exit);
        }
    }

    fn single_repeat(&mut self, single: Single, min: u32, max: Option<u32>, lazy: bool, rtl: bool) {
        let (one, rep, optional, operand) = match single {
            Single::One(c) => (Opcode::One, Opcode::Onerep, if lazy { Opcode::Onelazy } else { Opcode::Oneloop }, c as i32),
            Single::Notone(c) => {
                (Opcode::Notone, Opcode::Notonerep, if lazy { Opcode::Notonelazy } else { Opcode::Notoneloop }, c as i32)
            }
            Single::Set(i) => (Opcode::Set, Opcode::Setrep, if lazy { Opcode::Setlazy } else { Opcode::Setloop }, i),
        };
        if min == 1 && max == Some(1) {
            self.emit(one, rtl, &[operand]);
            return;
        }
        if min > 0 {
            self.emit(rep, rtl, &[operand, count(min)]);
        }
        match max {
            Some(max) if max == min => {}
            Some(max) => {
                self.emit(optional, rtl, &[operand, count(max - min)]);
            }
            None => {
                self.emit(optional, rtl, &[operand, UNBOUNDED]);
            }
        }
    }

    /// Repeats of anything wider than one character. A bounded repeat, or
    /// one with a minimum above one, keeps a loop count; `*` and `+` only
    /// need a mark.
    fn general_repeat(&mut self, node: &Node, min: u32, max: Option<u32>, lazy: bool, rtl: bool) {
        let counted = max.is_some() || min > 1;
        match (counted, min) {
            (true, 0) => self.emit(Opcode::Nullcount, rtl, &[0]),
            (true, _) => self.emit(Opcode::Setcount, rtl, &[1 - count(min)]),
            (false, 0) => self.emit(Opcode::Nullmark, rtl, &[]),
            (false, _) => self.emit(Opcode::Setmark, rtl, &[]),
        };
        let skip = (min == 0).then(|| self.emit(Opcode::Goto, rtl, &[0]));

        let body = self.here();
        self.node(node, rtl);
        let branch = self.here();
        let body = body as i32;

        if counted {
            let op = if lazy { Opcode::Lazybranchcount } else { Opcode::Branchcount };
            let limit = max.map_or(UNBOUNDED, |max| count(max - min));
            self.emit(op, rtl, &[body, limit]);
        } else {
            let op = if lazy { Opcode::Lazybranchmark } else { Opcode::Branchmark };
            self.emit(op, rtl, &[body]);
        }
        if let Some(at) = skip {
            self.patch(at, branch);
        }
    }

    fn lookaround(&mut self, node: &Node, negative: bool, behind: bool) {
        self.emit(Opcode::Setjump, false, &[]);
        if negative {
            let branch = self.emit(Opcode::Lazybranch, false, &[0]);
            self.node(node, behind);
            self.emit(Opcode::Backjump, false, &[]);
            let fore = self.emit(Opcode::Forejump, false, &[]);
            self.patch(branch, fore);
        } else {
            self.emit(Opcode::Setmark, false, &[]);
            self.node(node, behind);
            self.emit(Opcode::Getmark, false, &[]);
            self.emit(Opcode::Forejump, false, &[]);
        }
    }
}

/// Repeat counts above `i32::MAX` saturate into "unbounded".
fn count(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(UNBOUNDED)
}
