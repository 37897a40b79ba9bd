//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - twirled readout error mitigation",
        style("TREX").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  trex-ir           Circuit and Pauli-string representation");
    println!("  trex-hal          Backend abstraction layer");
    println!("  trex-mitigation   Twirling, aggregation and quasi-probability inversion");
    println!("  trex-adapter-sim  Statevector simulator with readout noise");
    println!("  trex-cli          Command-line interface");
    println!();
    println!("License: {}", style("Apache-2.0").dim());
}
