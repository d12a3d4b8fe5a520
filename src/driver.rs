//! Batch driver behind the `octa` binary.
//!
//! Every input is compiled on its own: a fresh backend module, a fresh
//! symbol table. A failing file is reported and the batch moves on, but
//! nothing is linked unless every file compiled.

use crate::codegen::{LlvmModule, RecordingModule};
use crate::compiler::{CompilationPipeline, CompilationState, CompileOptions};
use crate::error::{OctaError, OctaResult};
use crate::linker::{Linker, DEFAULT_ENTRY, DEFAULT_LINKER};
use clap::ValueEnum;
use colored::Colorize;
use inkwell::context::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Artifact produced for each input in compile-only mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EmitKind {
    /// Native object file (.o)
    #[default]
    #[value(name = "obj")]
    Obj,
    /// LLVM bitcode (.bc)
    #[value(name = "bitcode")]
    Bitcode,
    /// Textual LLVM IR (.ll)
    #[value(name = "llvm-ir")]
    LlvmIr,
    /// Recorded instruction listing, no LLVM involved (.trace)
    #[value(name = "trace")]
    Trace,
}

impl EmitKind {
    pub fn extension(self) -> &'static str {
        match self {
            EmitKind::Obj => "o",
            EmitKind::Bitcode => "bc",
            EmitKind::LlvmIr => "ll",
            EmitKind::Trace => "trace",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// `-c`
    CompileOnly,
    /// `-l`: inputs are object files
    LinkOnly,
    #[default]
    CompileAndLink,
}

impl Mode {
    /// `-c` and `-l` together mean the full pipeline.
    pub fn from_flags(compile_only: bool, link_only: bool) -> Self {
        match (compile_only, link_only) {
            (true, false) => Mode::CompileOnly,
            (false, true) => Mode::LinkOnly,
            _ => Mode::CompileAndLink,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub mode: Mode,
    pub emit: EmitKind,
    pub output: Option<PathBuf>,
    pub entry: Option<String>,
    pub linker: String,
    pub keep_temps: bool,
    /// Parent of the scratch directory; the system temp dir when unset
    pub scratch_root: Option<PathBuf>,
    pub compile: CompileOptions,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            emit: EmitKind::default(),
            output: None,
            entry: None,
            linker: DEFAULT_LINKER.to_string(),
            keep_temps: false,
            scratch_root: None,
            compile: CompileOptions::default(),
        }
    }
}

/// What a successful run left on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub artifacts: Vec<PathBuf>,
    pub executable: Option<PathBuf>,
    /// Scratch directory preserved by `--keep-temps`
    pub temps: Option<PathBuf>,
}

pub struct Driver {
    options: DriverOptions,
}

impl Driver {
    pub fn new(options: DriverOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn run(&self, inputs: &[PathBuf]) -> OctaResult<Outcome> {
        if inputs.is_empty() {
            return Err(OctaError::Usage("no input files".to_string()));
        }
        match self.options.mode {
            Mode::CompileOnly => self.compile_only(inputs),
            Mode::LinkOnly => self.link_only(inputs),
            Mode::CompileAndLink => self.compile_and_link(inputs),
        }
    }

    fn compile_only(&self, inputs: &[PathBuf]) -> OctaResult<Outcome> {
        if self.options.output.is_some() && inputs.len() > 1 {
            return Err(OctaError::Usage(
                "-o cannot be used with -c and more than one input".to_string(),
            ));
        }
        let emit = self.options.emit;
        let artifacts: Vec<PathBuf> = inputs
            .iter()
            .map(|input| match &self.options.output {
                Some(output) => output.clone(),
                None => input.with_extension(emit.extension()),
            })
            .collect();
        for artifact in &artifacts {
            ensure_not_an_input(artifact, inputs)?;
        }

        let mut outcome = Outcome::default();
        let mut failed = 0;
        for (input, artifact) in inputs.iter().zip(artifacts) {
            match self.compile_input(input, emit, &artifact) {
                Ok(_) => outcome.artifacts.push(artifact),
                Err(_) => failed += 1,
            }
        }

        batch_result(failed, inputs.len())?;
        Ok(outcome)
    }

    fn link_only(&self, objects: &[PathBuf]) -> OctaResult<Outcome> {
        let entry = self
            .options
            .entry
            .clone()
            .unwrap_or_else(|| DEFAULT_ENTRY.to_string());
        let executable = self.executable_path(&objects[0]);
        ensure_not_an_input(&executable, objects)?;
        let mut outcome = Outcome::default();
        let scratch = self.scratch_dir()?;
        self.link(objects, &entry, &executable, scratch.path())?;
        outcome.executable = Some(executable);
        outcome.temps = self.finish_scratch(scratch);
        Ok(outcome)
    }

    fn compile_and_link(&self, inputs: &[PathBuf]) -> OctaResult<Outcome> {
        if self.options.emit != EmitKind::Obj {
            log::warn!(
                "--emit {:?} only applies with -c; linking needs object files",
                self.options.emit
            );
        }
        let executable = self.executable_path(&inputs[0]);
        ensure_not_an_input(&executable, inputs)?;
        let scratch = self.scratch_dir()?;
        let mut objects = Vec::with_capacity(inputs.len());
        let mut first_block = None;
        let mut failed = 0;

        for (index, input) in inputs.iter().enumerate() {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            let object = scratch.path().join(format!("{}-{}.o", index, stem));
            match self.compile_input(input, EmitKind::Obj, &object) {
                Ok(block) => {
                    if index == 0 {
                        first_block = Some(block);
                    }
                    objects.push(object);
                }
                Err(_) => failed += 1,
            }
        }

        if let Err(e) = batch_result(failed, inputs.len()) {
            self.finish_scratch(scratch);
            return Err(e);
        }

        let entry = self
            .options
            .entry
            .clone()
            .or(first_block)
            .unwrap_or_else(|| DEFAULT_ENTRY.to_string());
        let linked = self.link(&objects, &entry, &executable, scratch.path());
        let temps = self.finish_scratch(scratch);
        linked?;

        Ok(Outcome {
            artifacts: Vec::new(),
            executable: Some(executable),
            temps,
        })
    }

    /// Compile one file to `artifact`, returning its block name.
    ///
    /// Failures are reported here, against the file, and any partially
    /// written artifact is removed.
    fn compile_input(&self, input: &Path, emit: EmitKind, artifact: &Path) -> OctaResult<String> {
        log::debug!("compiling {:?} -> {:?}", input, artifact);
        let state = match CompilationState::new(input) {
            Ok(state) => state,
            Err(e) => {
                eprintln!("{}: {}", "error".red().bold(), e);
                return Err(e);
            }
        };

        let pipeline = CompilationPipeline::new(&state, self.options.compile);
        match emit_artifact(&pipeline, emit, artifact) {
            Ok(block) => {
                log::info!("wrote {}", artifact.display());
                Ok(block)
            }
            Err(e) => {
                if artifact.exists() {
                    fs::remove_file(artifact).ok();
                }
                if state.report(&e).is_err() {
                    eprintln!("{}: {}: {}", "error".red().bold(), state.source_file, e);
                }
                Err(e)
            }
        }
    }

    fn link(&self, objects: &[PathBuf], entry: &str, executable: &Path, scratch: &Path) -> OctaResult<()> {
        let linker = Linker::new(self.options.linker.as_str(), entry);
        log::debug!(
            "linking {} object(s) with `{}`, entry `{}`",
            objects.len(),
            linker.tool(),
            linker.entry()
        );
        linker.link(objects, executable, scratch)?;
        log::info!("linked {}", executable.display());
        Ok(())
    }

    fn executable_path(&self, first_input: &Path) -> PathBuf {
        self.options
            .output
            .clone()
            .unwrap_or_else(|| first_input.with_extension(""))
    }

    fn scratch_dir(&self) -> OctaResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("octa-");
        let dir = match &self.options.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| OctaError::Io(format!("failed to create temporary directory: {}", e)))
    }

    /// Drop the scratch directory, or keep it and return its path.
    fn finish_scratch(&self, scratch: TempDir) -> Option<PathBuf> {
        if self.options.keep_temps {
            let path = scratch.into_path();
            log::info!("intermediate files kept in {}", path.display());
            Some(path)
        } else {
            None
        }
    }
}

/// An output must never land on one of the inputs.
fn ensure_not_an_input(output: &Path, inputs: &[PathBuf]) -> OctaResult<()> {
    let same = |input: &PathBuf| {
        input.as_path() == output
            || matches!(
                (fs::canonicalize(input), fs::canonicalize(output)),
                (Ok(a), Ok(b)) if a == b
            )
    };
    match inputs.iter().find(|&input| same(input)) {
        Some(input) => Err(OctaError::Usage(format!(
            "output {} would overwrite input {}",
            output.display(),
            input.display()
        ))),
        None => Ok(()),
    }
}

fn batch_result(failed: usize, total: usize) -> OctaResult<()> {
    if failed == 0 {
        Ok(())
    } else {
        Err(OctaError::Failed { failed, total })
    }
}

fn emit_artifact(
    pipeline: &CompilationPipeline<'_>,
    emit: EmitKind,
    artifact: &Path,
) -> OctaResult<String> {
    let module_name = pipeline.state().source_file.clone();

    if emit == EmitKind::Trace {
        let unit = pipeline.run(RecordingModule::new(module_name))?;
        fs::write(artifact, unit.module.to_string())?;
        return Ok(unit.function.name);
    }

    let context = Context::create();
    let unit = pipeline.run(LlvmModule::new(&context, &module_name))?;
    unit.module.verify()?;
    match emit {
        EmitKind::Bitcode => unit.module.write_bitcode(artifact)?,
        EmitKind::LlvmIr => unit.module.write_llvm_ir(artifact)?,
        EmitKind::Obj | EmitKind::Trace => unit.module.write_object_file(artifact)?,
    }
    Ok(unit.function.name)
}
