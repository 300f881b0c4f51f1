use std::process::Command;

use anyhow::{Context, Result};

/// Feature tiers of `levelset-common` that downstream crates opt into.
const FEATURE_COMBINATIONS: &[&[&str]] = &[
    &[], // default
    &["foundation"],
    &["observability"],
    &["runtime"],
    &["test-utils"],
];

/// Check that every feature tier compiles on its own.
pub fn test_feature_matrix() -> Result<()> {
    println!("Testing {} levelset-common feature combinations...", FEATURE_COMBINATIONS.len());

    for (index, features) in FEATURE_COMBINATIONS.iter().enumerate() {
        let joined = features.join(",");
        let label = if features.is_empty() { "default".to_string() } else { joined.clone() };

        println!(
            "\n[{}/{}] cargo check -p levelset-common --features '{label}'",
            index + 1,
            FEATURE_COMBINATIONS.len(),
        );

        let mut command = Command::new("cargo");
        command.args(["check", "-p", "levelset-common"]);
        if !features.is_empty() {
            command.arg("--features").arg(&joined);
        }

        let status =
            command.status().with_context(|| format!("Failed to run cargo check for '{label}'"))?;
        if !status.success() {
            anyhow::bail!("Feature combination '{label}' failed to compile");
        }

        println!("Features '{label}' compiled");
    }

    println!("\nAll {} feature combinations compile", FEATURE_COMBINATIONS.len());
    Ok(())
}
