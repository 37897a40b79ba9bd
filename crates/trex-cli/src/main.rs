//! TREX Command-Line Interface
//!
//! Twirled readout error extinction from the shell: generate readout twirls,
//! invert calibration data, and run full mitigated estimates on the built-in
//! simulator.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::mitigate::MitigateOptions;
use commands::{inverse, mitigate, twirl, version};

/// TREX - twirled readout error mitigation
#[derive(Parser)]
#[command(name = "trex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate readout-mitigated Pauli expectation values on the simulator
    Mitigate {
        /// Circuit file (JSON)
        #[arg(short, long)]
        input: String,

        /// Pauli observable, one label per qubit (repeatable)
        #[arg(short = 'p', long = "observable", required = true)]
        observables: Vec<String>,

        /// Configuration file (YAML); defaults to the user config if present
        #[arg(short, long)]
        config: Option<String>,

        /// Number of random twirls
        #[arg(long)]
        twirls: Option<usize>,

        /// Total shots, split across twirls
        #[arg(short, long)]
        shots: Option<u32>,

        /// Use the second-order inverse
        #[arg(long)]
        second_order: bool,

        /// Seed for twirl sampling and the simulator
        #[arg(long)]
        seed: Option<u64>,

        /// Symmetric readout flip probability of the simulator
        #[arg(long, default_value = "0.0")]
        readout_error: f64,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Generate readout-twirled variants of a circuit or a batch of circuits
    Twirl {
        /// Circuit file (JSON object or array of objects)
        #[arg(short, long)]
        input: String,

        /// Twirls per circuit
        #[arg(short = 'n', long, default_value = "8")]
        samples: usize,

        /// Seed for twirl sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Build the quasi-probability inverse of a calibration distribution
    Inverse {
        /// Calibration counts or probabilities (JSON object of bitstring to weight)
        #[arg(short, long)]
        input: String,

        /// Use the second-order inverse
        #[arg(long)]
        second_order: bool,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Mitigate {
            input,
            observables,
            config,
            twirls,
            shots,
            second_order,
            seed,
            readout_error,
            format,
        } => {
            mitigate::execute(MitigateOptions {
                input,
                observables,
                config,
                twirls,
                shots,
                second_order,
                seed,
                readout_error,
                format,
            })
            .await
        }

        Commands::Twirl {
            input,
            samples,
            seed,
            output,
        } => twirl::execute(&input, samples, seed, output.as_deref()),

        Commands::Inverse {
            input,
            second_order,
            format,
        } => inverse::execute(&input, second_order, &format),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mitigate_with_repeated_observables() {
        let cli = Cli::try_parse_from([
            "trex", "mitigate", "-i", "bell.json", "-p", "ZZ", "-p", "XX", "--twirls", "4",
            "--seed", "7",
        ])
        .unwrap();
        match cli.command {
            Commands::Mitigate {
                observables,
                twirls,
                seed,
                readout_error,
                format,
                ..
            } => {
                assert_eq!(observables, vec!["ZZ", "XX"]);
                assert_eq!(twirls, Some(4));
                assert_eq!(seed, Some(7));
                assert_eq!(readout_error, 0.0);
                assert_eq!(format, "table");
            }
            _ => panic!("expected mitigate"),
        }
    }

    #[test]
    fn test_mitigate_requires_an_observable() {
        assert!(Cli::try_parse_from(["trex", "mitigate", "-i", "bell.json"]).is_err());
    }

    #[test]
    fn test_parse_twirl_defaults() {
        let cli = Cli::try_parse_from(["trex", "twirl", "-i", "c.json"]).unwrap();
        match cli.command {
            Commands::Twirl {
                samples, output, ..
            } => {
                assert_eq!(samples, 8);
                assert!(output.is_none());
            }
            _ => panic!("expected twirl"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["trex", "inverse", "-i", "ref.json", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
