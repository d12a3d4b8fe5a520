//! Octa Language Compiler Library
//!
//! Lexer, parser, code generator and link driver for Octa, a language of
//! single-block programs that declare, assign and print 32-bit integers.

pub mod ast;
pub mod codegen;
pub mod compiler;
pub mod driver;
pub mod error;
pub mod lexer;
pub mod linker;
pub mod parser;

// Re-export commonly used types
pub use ast::{Expression, Function, Statement};
pub use codegen::{CodeGenerator, IrBuilder, LlvmModule, RecordingModule};
pub use compiler::{compile_str, CompilationPipeline, CompilationState, CompileOptions};
pub use driver::{Driver, DriverOptions, EmitKind, Mode, Outcome};
pub use error::{OctaError, OctaResult};
pub use lexer::{tokenize, Lexer, Token, TokenKind};
pub use parser::{parse, ParseError, ParseResult, Parser, StrayTokenPolicy};
