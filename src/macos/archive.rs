//! Zip archive for upload to the notary service

use super::process::run_tool;
use crate::error::{NotarizeError, Result, Step};
use std::path::Path;
use tokio::process::Command;

/// Archive file name for a bundle: the bundle's base name with everything
/// from its last `.` replaced by `.zip` (`My.App.app` becomes `My.App.zip`).
///
/// A leading dot counts as an extension too, so `.app` becomes `.zip`.
pub fn archive_name(app_path: &Path) -> Result<String> {
    let name = app_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            NotarizeError::InvalidBundle(format!(
                "Cannot derive archive name from {}",
                app_path.display()
            ))
        })?;
    let stem = name.rfind('.').map_or(name, |dot| &name[..dot]);
    Ok(format!("{stem}.zip"))
}

/// Build the `ditto` invocation.
///
/// `-c -k` writes a PKZip archive that keeps extended attributes and
/// resource forks; `--keepParent` makes the bundle itself the single
/// top-level entry.
pub fn ditto_command(ditto: &Path, app_path: &Path, zip_path: &Path) -> Command {
    let mut cmd = Command::new(ditto);
    cmd.args(["-c", "-k", "--keepParent"])
        .arg(app_path)
        .arg(zip_path);
    cmd
}

/// Archive `app_path` into `zip_path`.
pub async fn create_archive(ditto: &Path, app_path: &Path, zip_path: &Path) -> Result<()> {
    run_tool(Step::Archive, ditto_command(ditto, app_path, zip_path), None).await
}
