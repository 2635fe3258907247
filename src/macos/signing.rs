//! Deep code signing with entitlements and hardened runtime

use super::process::run_tool;
use crate::error::{Result, Step};
use std::path::Path;
use tokio::process::Command;

/// Build the `codesign` invocation for a notarization-eligible signature.
///
/// Flags, in order:
/// * `--display --verbose --verify` - report and check the result
/// * `--sign <identity> --timestamp` - sign with a secure timestamp
/// * `--options runtime` - hardened runtime (required for notarization)
/// * `--force` - replace any existing signature
/// * `--entitlements <path> --deep` - embed entitlements, sign nested code
pub fn codesign_command(
    codesign: &Path,
    app_path: &Path,
    signing_identity: &str,
    entitlements_path: &Path,
) -> Command {
    let mut cmd = Command::new(codesign);
    cmd.args(["--display", "--verbose", "--verify"])
        .arg("--sign")
        .arg(signing_identity)
        .arg("--timestamp")
        .args(["--options", "runtime"])
        .arg("--force")
        .arg("--entitlements")
        .arg(entitlements_path)
        .arg("--deep")
        .arg(app_path);
    cmd
}

/// Sign `app_path` in place.
///
/// The bundle is not checked beforehand: `codesign` is the authority on
/// whether the path is a signable bundle and reports why it is not.
pub async fn sign_app(
    codesign: &Path,
    app_path: &Path,
    signing_identity: &str,
    entitlements_path: &Path,
) -> Result<()> {
    let cmd = codesign_command(codesign, app_path, signing_identity, entitlements_path);
    run_tool(Step::Sign, cmd, None).await
}
