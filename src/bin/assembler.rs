//! Assembly to word-stream compiler CLI.
//!
//! Reads a `.palsm` source file and compiles it to an executable binary
//! without running it.
//!
//! # Usage
//! ```text
//! assembler <input.palsm> [OPTIONS]
//! ```
//!
//! # Options
//! - `-o, --output <file>`: Output file path (defaults to `<input>.bin`)

use pal::assembler::assemble_file;
use pal::info;
use pal::utils::log;
use std::env;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    log::init_from_env();

    let input_path = &args[1];
    let mut output_path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--output" | "-o") => {
                i += 1;
                if i >= args.len() {
                    eprintln!("{k} requires an argument");
                    process::exit(1);
                }
                output_path = Some(args[i].clone());
                i += 1;
            }
            other => {
                eprintln!("Unexpected argument: {other}\n");
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let output_path = output_path
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(input_path).with_extension("bin"));

    let program = match assemble_file(input_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(1);
        }
    };
    info!("assembled {} words", program.len());

    if let Err(e) = program.write_file(&output_path) {
        eprintln!("ERROR: {e}");
        process::exit(1);
    }

    println!(
        "Compiled {} -> {} ({} words)",
        input_path,
        output_path.display(),
        program.len()
    );
}

const USAGE: &str = "\
Assembly Compiler

USAGE:
    {program} <input.palsm> [OPTIONS]

ARGS:
    <input.palsm>    Assembly source file to compile

OPTIONS:
    -o, --output <file>    Output file path (defaults to <input>.bin)
    -h, --help             Print this help message

ENVIRONMENT:
    PAL_LOG    Log level: info, warn or error (default: warn)

EXAMPLES:
    # Compile to default output name
    {program} program.palsm

    # Compile with explicit output
    {program} program.palsm -o output.bin
";

fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
