//! VM benchmark binary.
//!
//! Measures assembly and execution time for representative programs.
//! Run with: `cargo run --release --bin bench`

use pal::assembler::assemble_source;
use pal::program::Program;
use pal::vm::Vm;
use std::io;
use std::time::{Duration, Instant};

struct BenchResult {
    name: &'static str,
    iterations: u64,
    total: Duration,
    /// Estimated number of opcodes executed per run (None to omit column).
    est_opcodes: Option<u64>,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let ns_per_op = self.avg().as_nanos();
        let ns_per_instr = self
            .est_opcodes
            .filter(|&n| n > 0)
            .map(|n| format!("{:>8.1}", ns_per_op as f64 / n as f64))
            .unwrap_or_else(|| "       -".to_string());
        println!(
            "  {:<24} {:>8} iters {:>10.3} us/iter  {} ns/op",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            ns_per_instr,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: &'static str, min_duration: Duration, est_opcodes: Option<u64>, mut f: F) -> BenchResult
where
    F: FnMut(),
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        f();
        iterations += 1;
    }

    BenchResult {
        name,
        iterations,
        total: start.elapsed(),
        est_opcodes,
    }
}

fn run_silent(program: &Program) {
    let mut vm = Vm::with_output(program.clone(), io::sink());
    vm.run().expect("run failed");
}

const TIGHT_LOOP_ASM: &str = "
    MOV R1 100000
    loop: SUB R1 1
    GT R1 0
    JMPF loop
    HALT
";

const ARITHMETIC_MIX_ASM: &str = "
    MOV R1 10000
    MOV R2 1
    MOV R3 2
    loop:
        ADD R2 3
        MUL R3 1
        SUB R2 1
        DIV R2 1
        SUB R1 1
        GT R1 0
        JMPF loop
    HALT
";

const STACK_CHURN_ASM: &str = "
    MOV R1 20000
    loop:
        PUSH 1 PUSH 2 ADD POP R2
        SUB R1 1
        GT R1 0
        JMPF loop
    HALT
";

// tight_loop: MOV + 100K*(SUB+GT+JMPF) + HALT
const TIGHT_LOOP_OPS: u64 = 2 + 100_000 * 3;
// arithmetic_mix: 3 MOV + 10K*(7 ops) + HALT
const ARITH_MIX_OPS: u64 = 4 + 10_000 * 7;
// stack_churn: MOV + 20K*(2 PUSH + ADD + POP + SUB + GT + JMPF) + HALT
const STACK_CHURN_OPS: u64 = 2 + 20_000 * 7;

fn main() {
    let min = Duration::from_secs(2);

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<24} {:>8}       {:>14}  {:>10}",
        "benchmark", "iters", "avg time", "ns/op"
    );
    println!("  {}", "-".repeat(66));

    // Pre-assemble programs so execution benchmarks exclude assembly cost
    let tight_prog = assemble_source(TIGHT_LOOP_ASM).expect("asm");
    let arith_prog = assemble_source(ARITHMETIC_MIX_ASM).expect("asm");
    let churn_prog = assemble_source(STACK_CHURN_ASM).expect("asm");

    bench("tight_loop(100K)", min, Some(TIGHT_LOOP_OPS), || {
        run_silent(&tight_prog)
    })
    .print();

    bench("arithmetic_mix(10K)", min, Some(ARITH_MIX_OPS), || {
        run_silent(&arith_prog)
    })
    .print();

    bench("stack_churn(20K)", min, Some(STACK_CHURN_OPS), || {
        run_silent(&churn_prog)
    })
    .print();

    bench("assemble(tight_loop)", min, None, || {
        assemble_source(TIGHT_LOOP_ASM).expect("asm");
    })
    .print();

    println!();
}
