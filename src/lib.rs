pub mod ast;
pub mod compiler;
pub mod config;
pub mod diagnostic;
pub mod generator;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod verify;

pub use compiler::{compile_pattern, CompileError};
pub use config::{GenerationConfig, PatternOptions};
pub use generator::{Error, Generator};
pub use interpreter::{generate, GenerationError};
pub use program::{CharClass, Opcode, Program, ProgramError};
