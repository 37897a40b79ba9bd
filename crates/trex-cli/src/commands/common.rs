//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use console::style;
use tracing::debug;

use trex_ir::{Circuit, PauliString};
use trex_mitigation::Distribution;

/// Read a file to a string, with a readable error when it is missing.
pub fn read_input(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Load a circuit from a JSON file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let source = read_input(path)?;
    Circuit::from_json(&source).map_err(|e| anyhow::anyhow!("Invalid circuit in {path}: {e}"))
}

/// Load a JSON document without interpreting it.
pub fn load_json(path: &str) -> Result<serde_json::Value> {
    let source = read_input(path)?;
    serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {path}"))
}

/// Load a bitstring-to-weight map (raw counts or probabilities).
pub fn load_distribution(path: &str) -> Result<Distribution> {
    let source = read_input(path)?;
    serde_json::from_str(&source).with_context(|| format!("Invalid distribution in {path}"))
}

/// Parse observable labels and check they all match the circuit width.
pub fn parse_observables(labels: &[String], width: usize) -> Result<Vec<PauliString>> {
    labels
        .iter()
        .map(|label| {
            let pauli: PauliString = label
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid observable '{label}': {e}"))?;
            if pauli.len() != width {
                anyhow::bail!(
                    "Observable '{label}' has {} labels but the circuit has {width} qubits",
                    pauli.len()
                );
            }
            Ok(pauli)
        })
        .collect()
}

/// The user configuration file (`<config dir>/trex/config.yaml`), if it exists.
pub fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("trex").join("config.yaml");
    debug!(path = %path.display(), exists = path.exists(), "user config lookup");
    path.exists().then_some(path)
}

/// Write `contents` to `output`, or to stdout when no path is given.
pub fn write_output(contents: &str, output: Option<&str>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, contents).with_context(|| format!("Failed to write {path}"))?;
            eprintln!("{} Wrote {}", style("✓").green().bold(), style(path).green());
        }
        None => println!("{contents}"),
    }
    Ok(())
}

/// Print a signed weight map as a table with a bar per entry.
pub fn print_distribution(dist: &Distribution, limit: usize) {
    let mut entries: Vec<_> = dist.iter().collect();
    entries.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then(a.0.cmp(b.0)));

    for (bitstring, weight) in entries.iter().take(limit) {
        let bar: String = "█".repeat((weight.abs() * 40.0).round() as usize);
        let bar = if *weight < 0.0 {
            style(bar).red()
        } else {
            style(bar).green()
        };
        println!("  {}: {:>+10.6} {}", style(bitstring).cyan(), weight, bar);
    }

    if entries.len() > limit {
        println!("  ... and {} more entries", entries.len() - limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let err = read_input("/nonexistent/trex/circuit.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_load_circuit_round_trip() {
        let bell = Circuit::bell().unwrap();
        let file = temp_file(&bell.to_json().unwrap());
        let loaded = load_circuit(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded, bell);
    }

    #[test]
    fn test_load_distribution_from_counts() {
        let file = temp_file(r#"{"00": 900, "10": 100}"#);
        let dist = load_distribution(file.path().to_str().unwrap()).unwrap();
        assert_eq!(dist.width(), 2);
        assert_eq!(dist.get("10"), 100.0);
    }

    #[test]
    fn test_load_distribution_rejects_mixed_widths() {
        let file = temp_file(r#"{"00": 1, "1": 1}"#);
        assert!(load_distribution(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_parse_observables_checks_width() {
        let ok = parse_observables(&["ZZ".to_string(), "XI".to_string()], 2).unwrap();
        assert_eq!(ok.len(), 2);
        assert!(parse_observables(&["ZZZ".to_string()], 2).is_err());
        assert!(parse_observables(&["ZQ".to_string()], 2).is_err());
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_output("[]", Some(path.to_str().unwrap())).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }
}
