//! Path expansion and toolchain checks

use crate::config::ToolConfig;
use crate::error::{NotarizeError, Result};
use std::path::Path;

/// Expand tilde in path, returning error if HOME is not set
///
/// When HOME is unset `shellexpand` leaves the `~` in place, which would
/// otherwise surface later as a confusing "No such file" from a tool.
pub fn expand_tilde_path(path: &str) -> Result<String> {
    let expanded = shellexpand::tilde(path).to_string();

    if path.starts_with('~') && expanded.starts_with('~') {
        return Err(NotarizeError::InvalidConfig(format!(
            "Could not expand ~ in path (HOME environment variable not set): {path}\n\
             Please use absolute path instead."
        )));
    }

    Ok(expanded)
}

/// Check that every tool the pipeline needs is installed.
///
/// Validates that:
/// - `codesign`, `ditto` and `xcrun` resolve to executables
/// - `xcrun` can locate `notarytool` and `stapler`
///
/// Never called by [`super::notarize`]; use it to diagnose a machine
/// before a long submission.
///
/// # Returns
/// * `Ok(())` - All tools are available
/// * `Err(NotarizeError::MissingDependency)` - Names the first missing tool
pub async fn check_toolchain(tools: &ToolConfig) -> Result<()> {
    for tool in [&tools.codesign, &tools.ditto, &tools.xcrun] {
        let resolved = which::which(tool).map_err(|e| {
            NotarizeError::MissingDependency(format!(
                "'{}' not found: {e}\n\
                 Install Xcode Command Line Tools:\n\
                 xcode-select --install",
                tool.display()
            ))
        })?;
        log::debug!("Found {}", resolved.display());
    }

    for subcommand in ["notarytool", "stapler"] {
        ensure_xcrun_finds(&tools.xcrun, subcommand).await?;
    }

    log::info!("Notarization toolchain looks good");
    Ok(())
}

async fn ensure_xcrun_finds(xcrun: &Path, subcommand: &str) -> Result<()> {
    let output = tokio::process::Command::new(xcrun)
        .args(["--find", subcommand])
        .output()
        .await
        .map_err(|e| {
            NotarizeError::MissingDependency(format!("Failed to run {}: {e}", xcrun.display()))
        })?;

    if !output.status.success() {
        return Err(NotarizeError::MissingDependency(format!(
            "xcrun {subcommand} not available: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    log::debug!(
        "Found {}",
        String::from_utf8_lossy(&output.stdout).trim()
    );
    Ok(())
}
