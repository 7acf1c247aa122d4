use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod config;
mod logging;
mod matrix_io;

#[derive(Parser, Debug)]
#[command(name = "sensdesign")]
#[command(about = "Generate design matrices for sensitivity and Monte Carlo studies")]
struct Args {
    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a design matrix from a YAML configuration
    Generate {
        /// Path to the design configuration file
        config: PathBuf,

        /// Output CSV path
        #[arg(short, long, default_value = "designmatrix.csv")]
        output: PathBuf,

        /// Project non-positive-definite correlation matrices to the
        /// nearest valid matrix instead of aborting
        #[arg(long)]
        repair_correlations: bool,
    },
    /// Summarize a previously generated design matrix
    Summary {
        /// Path to the design matrix CSV
        matrix: PathBuf,

        /// Seed column ignored by the scalar/mc classification
        #[arg(long, default_value = "RMS_SEED")]
        seed_param: String,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    logging::init_logging(&args.log_level);

    match args.command {
        Command::Generate {
            config,
            output,
            repair_correlations,
        } => {
            let mut design = config::load_config(&config)?;
            if repair_correlations {
                config::repair_correlations(&mut design)?;
            }
            let matrix = sensdesign_core::generate(&design)?;
            matrix_io::write_matrix(&output, &matrix)?;
            tracing::info!(
                "wrote {} realizations to {}",
                matrix.num_realizations(),
                output.display()
            );
        }
        Command::Summary { matrix, seed_param } => {
            let matrix = matrix_io::read_matrix(&matrix)?;
            let summaries = sensdesign_core::summarize(&matrix, Some(&seed_param))?;
            matrix_io::print_summary(&summaries);
        }
    }

    Ok(())
}
