use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use octalang::compiler::CompileOptions;
use octalang::driver::{Driver, DriverOptions, EmitKind, Mode};
use octalang::linker::DEFAULT_LINKER;
use octalang::parser::StrayTokenPolicy;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "octa")]
#[command(author, version, about = "The Octa language compiler", long_about = None)]
struct Cli {
    /// Source files (or object files with -l)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Compile only; write one artifact per input
    #[arg(short = 'c')]
    compile_only: bool,

    /// Link only; inputs are object files
    #[arg(short = 'l')]
    link_only: bool,

    /// Output file (artifact with -c, executable otherwise)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// What to emit with -c
    #[arg(long = "emit", value_enum, default_value = "obj")]
    emit: EmitKind,

    /// Block called by the generated `main` (default: first input's block)
    #[arg(long)]
    entry: Option<String>,

    /// C compiler used to build the wrapper and link
    #[arg(long, default_value = DEFAULT_LINKER)]
    linker: String,

    /// Reject tokens that cannot start a statement instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Keep intermediate files
    #[arg(long)]
    keep_temps: bool,

    /// Dump tokens to stdout
    #[arg(long)]
    dump_tokens: bool,

    /// Dump the AST to stdout
    #[arg(long)]
    dump_ast: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            mode: Mode::from_flags(self.compile_only, self.link_only),
            emit: self.emit,
            output: self.output.clone(),
            entry: self.entry.clone(),
            linker: self.linker.clone(),
            keep_temps: self.keep_temps,
            scratch_root: None,
            compile: CompileOptions {
                stray_tokens: if self.strict {
                    StrayTokenPolicy::Reject
                } else {
                    StrayTokenPolicy::Skip
                },
                dump_tokens: self.dump_tokens,
                dump_ast: self.dump_ast,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins over -v
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let driver = Driver::new(cli.driver_options());
    match driver.run(&cli.inputs) {
        Ok(outcome) => {
            if let Some(executable) = outcome.executable {
                println!(
                    "{}: Created executable {:?}",
                    "success".green().bold(),
                    executable
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}
