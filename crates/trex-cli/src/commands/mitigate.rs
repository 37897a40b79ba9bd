//! Mitigate command implementation.

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use trex_adapter_sim::{ReadoutNoise, SimulatorBackend};
use trex_mitigation::{MitigationConfig, MitigationReport, ReadoutTwirlRunner};

use super::common::{default_config_path, load_circuit, parse_observables};

/// Arguments of `trex mitigate`.
pub struct MitigateOptions {
    pub input: String,
    pub observables: Vec<String>,
    pub config: Option<String>,
    pub twirls: Option<usize>,
    pub shots: Option<u32>,
    pub second_order: bool,
    pub seed: Option<u64>,
    pub readout_error: f64,
    pub format: String,
}

/// Resolve the run configuration: file, then environment, then flags.
fn resolve_config(opts: &MitigateOptions) -> Result<MitigationConfig> {
    let path = opts.config.as_ref().map(PathBuf::from).or_else(default_config_path);
    let mut config = MitigationConfig::load(path.as_deref())?;

    if let Some(twirls) = opts.twirls {
        config.n_twirls = twirls;
    }
    if let Some(shots) = opts.shots {
        config.shots = shots;
    }
    if opts.second_order {
        config.second_order = true;
    }
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Execute the mitigate command.
pub async fn execute(opts: MitigateOptions) -> Result<()> {
    if !matches!(opts.format.as_str(), "table" | "json") {
        anyhow::bail!("Unknown format: '{}'. Available: table, json", opts.format);
    }

    let circuit = load_circuit(&opts.input)?;
    let observables = parse_observables(&opts.observables, circuit.num_qubits())?;
    let config = resolve_config(&opts)?;

    let mut backend = SimulatorBackend::new().with_readout_noise(ReadoutNoise::uniform(opts.readout_error)?);
    if let Some(seed) = config.seed {
        backend = backend.with_seed(seed);
    }

    let table = opts.format == "table";
    if table {
        println!(
            "{} Mitigating {} observable(s) on {} ({} qubits, {} twirls, {} shots)",
            style("→").cyan().bold(),
            observables.len(),
            style(&opts.input).green(),
            circuit.num_qubits(),
            config.n_twirls,
            config.shots
        );
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Calibrating and measuring twirls...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let mut runner = ReadoutTwirlRunner::new(backend, config)?;
    let report = runner.run(&circuit, &observables).await;
    spinner.finish_and_clear();
    let report = report?;

    if table {
        print_report(&report);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn print_report(report: &MitigationReport) {
    println!(
        "\n{} Results on {}:",
        style("✓").green().bold(),
        style(&report.backend).yellow()
    );
    println!(
        "  {:<12} {:>10} {:>10} {:>10}",
        style("observable").dim(),
        style("raw").dim(),
        style("mitigated").dim(),
        style("overhead").dim()
    );
    for estimate in &report.observables {
        println!(
            "  {:<12} {:>+10.4} {:>+10.4} {:>10.3}",
            style(estimate.pauli.to_string()).cyan(),
            estimate.raw,
            estimate.mitigated,
            estimate.sampling_overhead
        );
    }
}
