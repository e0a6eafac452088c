use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mcubatch - batch project generation and build verification for MCU IDE
/// configurations
#[derive(Parser)]
#[command(name = "mcubatch")]
#[command(about = "Generate, configure, and build-verify MCU IDE projects from declarative batches")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a batch of project specs against the built-in simulated
    /// bridge
    Run {
        /// Batch file (JSON array of project specs)
        batch: PathBuf,

        /// Workspace directory for generated projects
        #[arg(short, long, default_value = "workspace")]
        workspace: PathBuf,

        /// Error log path; the file is only created when errors occur
        #[arg(long, default_value = "logs/errors.log")]
        error_log: PathBuf,

        /// MCU family used for catalog queries
        #[arg(long, default_value = "ra")]
        family: String,
    },

    /// Validate a batch file without executing it
    Validate {
        /// Batch file to validate
        batch: PathBuf,
    },

    /// Expand a test plan into a batch file
    Plan {
        /// Plan file (YAML)
        plan: PathBuf,

        /// Where to write the expanded batch
        #[arg(short, long)]
        output: PathBuf,

        /// Tagged release: exclude internal boards
        #[arg(long)]
        tagged: bool,

        /// IAR installation to scan for device support; without it, IAR
        /// rows are not filtered
        #[arg(long)]
        iar_dir: Option<PathBuf>,
    },

    /// Generate per-MCU availability fixtures from MDFs and capability
    /// data
    Availability {
        /// Directory with generated MCU capability YAML files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory with module description XML files
        #[arg(short = 'd', long)]
        mdf_dir: PathBuf,

        /// Single MCU to generate (all capability files when omitted)
        #[arg(short, long)]
        mcu: Option<String>,

        /// Output directory for the fixtures
        #[arg(short, long, default_value = "fixtures")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_a_command() {
        let result = Cli::try_parse_from(["mcubatch"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_run_defaults() {
        let result = Cli::try_parse_from(["mcubatch", "run", "projects.json"]);
        assert!(result.is_ok());
        match result.unwrap().command {
            Commands::Run {
                batch,
                workspace,
                error_log,
                family,
            } => {
                assert_eq!(batch.to_str().unwrap(), "projects.json");
                assert_eq!(workspace.to_str().unwrap(), "workspace");
                assert_eq!(error_log.to_str().unwrap(), "logs/errors.log");
                assert_eq!(family, "ra");
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_plan_command() {
        let result = Cli::try_parse_from([
            "mcubatch", "plan", "plan.yml", "--output", "batch.json", "--tagged",
        ]);
        assert!(result.is_ok());
        match result.unwrap().command {
            Commands::Plan {
                tagged, iar_dir, ..
            } => {
                assert!(tagged);
                assert!(iar_dir.is_none());
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_cli_availability_command() {
        let result = Cli::try_parse_from([
            "mcubatch",
            "availability",
            "--input",
            "data/generated/device",
            "--mdf-dir",
            "data/.module_descriptions",
            "--mcu",
            "ra6m3",
        ]);
        assert!(result.is_ok());
        match result.unwrap().command {
            Commands::Availability { mcu, output, .. } => {
                assert_eq!(mcu.as_deref(), Some("ra6m3"));
                assert_eq!(output.to_str().unwrap(), "fixtures");
            }
            _ => panic!("Expected Availability command"),
        }
    }
}
