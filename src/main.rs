//! # Diag Bundle - Entry Point
//! src/main.rs
//!
//! Punto de entrada del recolector.

use anyhow::Context;
use clap::CommandFactory;
use diag_bundle::config::{Action, Config};
use diag_bundle::gather::gather;
use diag_bundle::jobs::RunSummary;
use diag_bundle::logging;
use diag_bundle::runner::ShellRunner;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::new();
    logging::init(config.verbose);

    // Errores de uso: nada se ejecuta y no se crea el bundle
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        eprintln!();
        eprintln!("{}", Config::command().render_usage());
        return ExitCode::from(1);
    }

    if config.verbose {
        config.print_summary();
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "run aborted");
            eprintln!("💥 Error fatal: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(config: &Config) -> anyhow::Result<()> {
    let runner = ShellRunner::new(config.shell.clone());

    match &config.action {
        Action::Gather(args) => {
            let output = args.output_path()?;

            let summary = gather(args.target_file(), output, &runner)
                .with_context(|| format!("gather into {}", output.display()))?;

            print_summary(&summary, output);
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary, output: &Path) {
    println!("📦 Bundle: {}", output.display());
    println!("   Jobs ejecutados:   {}", summary.jobs_executed);
    println!("   Entradas escritas: {}", summary.entries_written);
    println!("   Jobs emitidos:     {}", summary.children_enqueued);
    if summary.contained_failures > 0 {
        println!("   ⚠️  Fallos registrados en el bundle: {}", summary.contained_failures);
    }
}
