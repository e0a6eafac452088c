//! mcubatch - Main entry point
//!
//! Dispatches the CLI subcommands: run a batch through the sequence
//! interpreter, validate a batch file, expand a test plan, or generate
//! availability fixtures.

use log::info;

use mcubatch::availability;
use mcubatch::batch::Batch;
use mcubatch::bridge::SimBridge;
use mcubatch::cli::{Cli, Commands};
use mcubatch::plan::{self, IarSupport, Plan};
use mcubatch::runner::{RunOptions, run_batch};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            batch,
            workspace,
            error_log,
            family,
        } => {
            let batch = Batch::load_from_file(&batch)?;
            let mut bridge = SimBridge::new(&workspace);
            let options = RunOptions {
                family,
                ..RunOptions::default()
            };

            let report = run_batch(&mut bridge, &batch, &options);
            report.write_log(&error_log)?;
            if !report.is_clean() {
                eprintln!(
                    "{} error(s) recorded; see {}",
                    report.errors().len(),
                    error_log.display()
                );
            }
            std::process::exit(report.exit_code());
        }

        Commands::Validate { batch } => {
            match Batch::load_from_file(&batch).and_then(|b| b.validate().map(|_| b)) {
                Ok(loaded) => {
                    println!("✓ Batch file is valid: {} project(s)", loaded.projects.len());
                }
                Err(e) => {
                    eprintln!("✗ Batch validation failed: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Plan {
            plan,
            output,
            tagged,
            iar_dir,
        } => {
            let plan = Plan::load_from_file(&plan)?;
            let iar = iar_dir.map(|dir| IarSupport::scan(&dir)).transpose()?;
            let batch = plan::expand(&plan, tagged, iar.as_ref())?;
            batch.save_to_file(&output)?;
            info!(
                "Wrote {} project(s) to {}",
                batch.projects.len(),
                output.display()
            );
        }

        Commands::Availability {
            input,
            mdf_dir,
            mcu,
            output,
        } => {
            let summary = availability::generate(&input, &mdf_dir, mcu.as_deref(), &output)?;
            info!("Wrote {} fixture(s)", summary.written.len());
            if !summary.not_checked.is_empty() {
                println!("These IDs were not tested.");
                for id in &summary.not_checked {
                    println!(" -{}", id);
                }
            }
        }
    }

    Ok(())
}
