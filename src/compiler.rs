//! Compilation pipeline for one source file.
//!
//! `tokenize → parse → generate`, failing fast at the first error. Errors
//! are reported against the file through codespan-reporting.

use crate::ast::Function;
use crate::codegen::{self, IrBuilder};
use crate::error::{OctaError, OctaResult};
use crate::lexer::{self, Token};
use crate::parser::{Parser, StrayTokenPolicy};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use colored::Colorize;
use std::fs;
use std::path::Path;

/// Per-file front end options
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    pub stray_tokens: StrayTokenPolicy,
    pub dump_tokens: bool,
    pub dump_ast: bool,
}

/// One source file and its diagnostic file database
pub struct CompilationState {
    pub source_file: String,
    pub source: String,
    pub files: SimpleFiles<String, String>,
    pub file_id: usize,
}

impl CompilationState {
    pub fn new<P: AsRef<Path>>(source_file: P) -> OctaResult<Self> {
        let path = source_file.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            OctaError::Io(format!("failed to read source file {:?}: {}", path, e))
        })?;
        Ok(Self::new_from_string(&path.display().to_string(), source))
    }

    /// State over an in-memory source (tests, stdin)
    pub fn new_from_string(filename: &str, source: String) -> Self {
        let mut files = SimpleFiles::new();
        let file_id = files.add(filename.to_string(), source.clone());
        Self {
            source_file: filename.to_string(),
            source,
            files,
            file_id,
        }
    }

    /// Print `error` to stderr, pointing into this file where possible.
    pub fn report(&self, error: &OctaError) -> OctaResult<()> {
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();
        let diagnostic = error.to_diagnostic(self.file_id);
        let mut lock = writer.lock();
        codespan_reporting::term::emit(&mut lock, &config, &self.files, &diagnostic)
            .map_err(|e| OctaError::Io(format!("failed to emit diagnostic: {}", e)))
    }
}

/// A fully generated file
#[derive(Debug)]
pub struct CompiledUnit<B> {
    pub function: Function,
    pub module: B,
}

pub struct CompilationPipeline<'s> {
    state: &'s CompilationState,
    options: CompileOptions,
}

impl<'s> CompilationPipeline<'s> {
    pub fn new(state: &'s CompilationState, options: CompileOptions) -> Self {
        Self { state, options }
    }

    pub fn state(&self) -> &CompilationState {
        self.state
    }

    pub fn tokenize(&self) -> OctaResult<Vec<Token>> {
        log::debug!("{}: lexical analysis", self.state.source_file);
        let tokens = lexer::tokenize(&self.state.source)?;
        if self.options.dump_tokens {
            println!("{}", "=== Tokens ===".blue().bold());
            println!("{}", lexer::format_tokens(&tokens));
            println!();
        }
        Ok(tokens)
    }

    pub fn parse(&self, tokens: Vec<Token>) -> OctaResult<Function> {
        log::debug!("{}: parsing", self.state.source_file);
        let function = Parser::new(tokens)
            .with_policy(self.options.stray_tokens)
            .parse()?;
        if self.options.dump_ast {
            let json = serde_json::to_string_pretty(&function)
                .map_err(|e| OctaError::Other(format!("failed to serialize AST: {}", e)))?;
            println!("{}", "=== AST ===".blue().bold());
            println!("{}", json);
            println!();
        }
        Ok(function)
    }

    pub fn generate<B: IrBuilder>(&self, function: &Function, backend: B) -> OctaResult<B> {
        log::debug!("{}: code generation", self.state.source_file);
        Ok(codegen::generate(function, backend)?)
    }

    /// Run every stage
    pub fn run<B: IrBuilder>(&self, backend: B) -> OctaResult<CompiledUnit<B>> {
        let tokens = self.tokenize()?;
        let function = self.parse(tokens)?;
        let module = self.generate(&function, backend)?;
        Ok(CompiledUnit { function, module })
    }
}

/// Compile an in-memory source with default options.
pub fn compile_str<B: IrBuilder>(source: &str, backend: B) -> OctaResult<CompiledUnit<B>> {
    let state = CompilationState::new_from_string("<input>", source.to_string());
    CompilationPipeline::new(&state, CompileOptions::default()).run(backend)
}
