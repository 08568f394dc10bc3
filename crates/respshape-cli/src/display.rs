//! Terminal output outside of the provisioning summary.

use colored::Colorize;

use respshape::UsageError;

/// Prints the tool name and version.
pub fn banner() {
    println!(
        "{} {}",
        "Apigee Response-Shaping Example provisioning tool, version:".bold(),
        env!("CARGO_PKG_VERSION")
    );
}

/// Prints a usage problem; the caller follows up with the help text.
pub fn usage_error(error: &UsageError) {
    eprintln!("{} {error}\n", "error:".bright_red().bold());
}
