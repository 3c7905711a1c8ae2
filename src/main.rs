//! Stack VM runner.
//!
//! Runs an assembly source or a prebuilt binary in one step.
//!
//! # Usage
//! ```text
//! pal <file.palsm>|<file.bin>
//! ```
//!
//! A `.palsm` argument is assembled first: the word stream is written to a
//! sibling `.bin` file, executed, and the `.bin` is removed after a clean
//! HALT. Any other extension is treated as a prebuilt binary and executed
//! directly.
//!
//! Exits 0 when the program halts; 1 on any assembler diagnostic or VM
//! fatal error, with a one-line `ERROR:` message on stderr.

use pal::assembler::{self, SOURCE_EXTENSION};
use pal::errors::VmError;
use pal::program::Program;
use pal::utils::log;
use pal::vm::{Outcome, Vm};
use pal::{info, warn};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() == 2 { 0 } else { 1 });
    }

    log::init_from_env();

    if let Err(e) = run(Path::new(&args[1])) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }
}

fn run(path: &Path) -> Result<(), VmError> {
    let is_source = path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION);

    let (program, temp_bin) = if is_source {
        let assembled = assembler::assemble_file(path)?;
        let bin_path = path.with_extension("bin");
        assembled.write_file(&bin_path)?;
        info!(
            "assembled {} words to {}",
            assembled.len(),
            bin_path.display()
        );
        (Program::read_file(&bin_path)?, Some(bin_path))
    } else {
        (Program::read_file(path)?, None)
    };

    let mut vm = Vm::new(program);
    let outcome = vm.run()?;

    // The temporary binary only outlives the run when HALT never fired.
    if let Some(bin_path) = temp_bin {
        if outcome == Outcome::Halted {
            fs::remove_file(&bin_path).map_err(|e| VmError::IoError {
                path: bin_path.display().to_string(),
                reason: e.to_string(),
            })?;
            info!("removed temporary binary {}", bin_path.display());
        } else {
            warn!(
                "program ran off the end of the stream; keeping {}",
                bin_path.display()
            );
        }
    }
    Ok(())
}

const USAGE: &str = "\
Stack VM Runner

USAGE:
    {program} <file.palsm>|<file.bin>

ARGS:
    <file.palsm>    Assembly source: assembled to a sibling .bin, executed,
                    and the .bin removed after a clean halt
    <file.bin>      Prebuilt binary word stream, executed directly

OPTIONS:
    -h, --help      Print this help message

ENVIRONMENT:
    PAL_LOG    Log level: info, warn or error (default: warn)

EXAMPLES:
    # Assemble and run in one step
    {program} program.palsm

    # Run a prebuilt binary
    {program} program.bin
";

fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
