//! Prints a human-readable summary of a finished run.

use bytesize::ByteSize;
use yansi::Paint;

use crate::stresstest::{BackendRun, RunResult};

/// Prints the run totals and one section per backend to stdout.
pub fn print_summary(result: &RunResult) {
    println!();
    println!(
        "{} ({} actors, {:.2}s)",
        "## Stresstest".bold(),
        result.actor_count.bold(),
        result.elapsed_seconds
    );
    println!(
        "  {} writes expected per backend",
        result.total_writes_expected.bold()
    );

    let actors = &result.actors;
    print!("  {} actors completed", actors.completed.bold().green());
    if actors.aborted > 0 {
        print!(", {}", format!("{} ABORTED", actors.aborted).bold().yellow());
    }
    if actors.failed > 0 {
        print!(", {}", format!("{} FAILED", actors.failed).bold().red());
    }
    println!();

    for backend in &result.backends {
        println!();
        print_backend(backend);
    }
}

fn print_backend(backend: &BackendRun) {
    println!("{} {}", "## Backend".bold(), backend.name.bold().blue());

    match backend.series.last() {
        Some(last) => {
            let size = ByteSize::b(last.size_bytes);
            print!(
                "  final size: {}; {} samples",
                size.bold(),
                backend.series.len()
            );
            if last.elapsed_seconds > 0.0 {
                let rate = ByteSize::b((last.size_bytes as f64 / last.elapsed_seconds) as u64);
                print!("; {rate:.2}/s");
            }
            println!();
        }
        None => println!("  {}", "no samples recorded".yellow()),
    }

    if backend.write_failures > 0 {
        println!(
            "  {}",
            format!("{} WRITE FAILURES", backend.write_failures)
                .bold()
                .red()
        );
    }
    if backend.sample_failures > 0 {
        println!(
            "  {}",
            format!("{} SAMPLE FAILURES", backend.sample_failures).yellow()
        );
    }
    if !backend.flushed {
        println!("  {}", "FLUSH FAILED".bold().red());
    }
}
