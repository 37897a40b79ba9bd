//! Inverse command implementation.

use anyhow::Result;
use console::style;

use trex_mitigation::build_quasi_distribution;

use super::common::{load_distribution, print_distribution};

/// Execute the inverse command.
pub fn execute(input: &str, second_order: bool, format: &str) -> Result<()> {
    let reference = load_distribution(input)?;
    if reference.is_empty() {
        anyhow::bail!("Calibration data in {input} is empty");
    }
    let quasi = build_quasi_distribution(&reference, second_order)?;

    match format {
        "json" => {
            let doc = serde_json::json!({
                "quasi": quasi.quasi(),
                "gammas": quasi.gammas(),
                "sampling_overhead": quasi.sampling_overhead(),
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        "table" => {
            println!(
                "{} {} inverse over {} bits ({} entries)",
                style("✓").green().bold(),
                if second_order { "Second-order" } else { "First-order" },
                quasi.width(),
                quasi.quasi().len()
            );
            print_distribution(quasi.quasi(), 16);
            let gammas: Vec<String> = quasi.gammas().iter().map(|g| format!("{g:.4}")).collect();
            println!("\n  Gammas:            [{}]", gammas.join(", "));
            println!("  Gamma product:     {}", style(format!("{:.4}", quasi.gamma_product())).yellow());
            println!(
                "  Sampling overhead: {}",
                style(format!("{:.4}", quasi.sampling_overhead())).yellow()
            );
        }
        other => anyhow::bail!("Unknown format: '{other}'. Available: table, json"),
    }
    Ok(())
}
