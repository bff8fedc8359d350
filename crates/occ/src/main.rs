//! Main entry point for the Overcast compiler.
//!
//! # Compilation Pipeline
//!
//! 1. **Lexing and parsing**: source text to AST via `overcast_parser`
//! 2. **Binding**: scope-aware name resolution and type checking
//! 3. **Code generation**: lowering into the selected IR backend, then the
//!    fixed optimization pass pipeline
//! 4. **Output**: the textual module written next to the source (or `-o`)
//!
//! # Usage
//!
//! ```bash
//! occ main.oc
//! occ main.oc -o build/main.ll --no-opt
//! occ main.oc --backend llvm --print-ir
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use colored::Colorize;

use occ::{BackendKind, CompileOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Parser)]
#[command(name = "occ", about = "Overcast compiler", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Source file to compile
    src_file: PathBuf,

    /// Write the module to this file instead of `<stem>.ll`
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory for `<stem>.ll`
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Name of the emitted module (defaults to the source file stem)
    #[arg(long = "module-name", value_name = "NAME")]
    module_name: Option<String>,

    /// Skip the optimizer and the module pass pipeline
    #[arg(long = "no-opt")]
    no_opt: bool,

    /// IR backend to lower into [default: llvm when built with the `llvm` feature, else ssa]
    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Also print the finished module to stdout
    #[arg(long = "print-ir")]
    print_ir: bool,

    /// Log stage timings and pass execution to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Suppress the summary line
    #[arg(short, long)]
    quiet: bool,

    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            if !atty::is(atty::Stream::Stderr) {
                colored::control::set_override(false);
            }
        }
    }
    occ::logging::init(occ::logging::level_from_env(cli.verbose));

    let mut options = CompileOptions::new(&cli.src_file);
    options.apply_env_overrides()?;
    if cli.output.is_some() {
        options.output = cli.output;
    }
    if cli.out_dir.is_some() {
        options.out_dir = cli.out_dir;
    }
    options.module_name = cli.module_name;
    if cli.no_opt {
        options.optimize = false;
    }
    if let Some(backend) = cli.backend {
        options.backend = backend;
    }

    let outcome = match occ::compile(&options) {
        Ok(outcome) => outcome,
        Err(err) => {
            // Pipeline errors were already reported with source context.
            let reported = matches!(
                err.downcast_ref::<occ::CompileError>(),
                Some(e) if !matches!(e, occ::CompileError::Io { .. })
            );
            if reported {
                std::process::exit(1);
            }
            return Err(err);
        }
    };

    if cli.print_ir {
        print!("{}", outcome.ir);
    }
    if !cli.quiet {
        eprintln!(
            "{} {} -> {} in {:.2} ms",
            "Compiled".green().bold(),
            cli.src_file.display(),
            outcome.output.display(),
            outcome.timings.total().as_secs_f64() * 1000.0
        );
    }
    Ok(())
}
