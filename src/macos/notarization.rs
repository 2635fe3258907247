//! Notarization workflow for macOS apps
//!
//! Signs the bundle, zips it, submits the zip to Apple's notary service,
//! waits for the verdict and staples the issued ticket back onto the bundle.

use super::archive::{archive_name, create_archive};
use super::entitlements::write_entitlements;
use super::process::{ProgressOutput, run_tool};
use super::signing::sign_app;
use crate::config::ToolConfig;
use crate::error::{Result, Step};
use std::fmt;
use std::path::Path;
use tempfile::TempDir;
use tokio::process::Command;
use zeroize::Zeroizing;

/// Credentials, signing identity and progress destination for [`notarize`].
#[derive(Default)]
pub struct NotarizeOptions {
    /// Apple ID email used for submission
    pub email: String,

    /// Signing identity, e.g. `Developer ID Application: Example Corp (ABCDE12345)`
    pub developer_name: String,

    pub team_id: String,

    /// App-specific password, see <https://support.apple.com/en-us/102654>
    pub app_password: Zeroizing<String>,

    /// Receives `notarytool` and `stapler` stdout; discarded when `None`
    pub progress_output: Option<ProgressOutput>,

    pub tools: ToolConfig,
}

impl fmt::Debug for NotarizeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotarizeOptions")
            .field("email", &"<redacted>")
            .field("developer_name", &self.developer_name)
            .field("team_id", &"<redacted>")
            .field("app_password", &"<redacted>")
            .field("progress_output", &self.progress_output.is_some())
            .field("tools", &self.tools)
            .finish()
    }
}

/// Notarize the app bundle at `app_path`.
///
/// # Process
/// 1. Write the entitlements descriptor into a fresh working directory
/// 2. Deep-sign the bundle with hardened runtime via `codesign`
/// 3. Zip the bundle with `ditto` as `<work dir>/<name>.zip`
/// 4. Submit via `xcrun notarytool submit --wait`
/// 5. Staple the ticket via `xcrun stapler staple`
///
/// Each step runs only if the previous one succeeded; nothing is retried.
/// Signing and stapling modify the bundle in place and are not rolled back
/// when a later step fails. Re-running the whole sequence is safe.
///
/// The working directory is removed on every exit path, including panics
/// and the future being dropped.
///
/// # Example
/// ```no_run
/// # async fn example() -> kodegen_bundler_notarize::Result<()> {
/// use kodegen_bundler_notarize::macos::{NotarizeOptions, notarize};
/// use std::path::Path;
///
/// let mut options = NotarizeOptions {
///     email: "dev@example.com".to_string(),
///     developer_name: "Developer ID Application: Example Corp (ABCDE12345)".to_string(),
///     team_id: "ABCDE12345".to_string(),
///     app_password: "abcd-efgh-ijkl-mnop".to_string().into(),
///     progress_output: Some(Box::new(tokio::io::stdout())),
///     ..Default::default()
/// };
/// notarize(Path::new("target/release/bundle/osx/Foo.app"), &mut options).await?;
/// # Ok(())
/// # }
/// ```
pub async fn notarize(app_path: &Path, options: &mut NotarizeOptions) -> Result<()> {
    // Reject unnameable paths before codesign touches the bundle
    let zip_name = archive_name(app_path)?;

    let work_dir = create_work_dir(&options.tools)?;
    log::debug!("Working directory: {}", work_dir.path().display());

    let outcome = run_steps(app_path, work_dir.path(), &zip_name, options).await;

    let work_path = work_dir.path().to_path_buf();
    if let Err(e) = work_dir.close() {
        log::warn!(
            "Failed to remove working directory {}: {e}",
            work_path.display()
        );
    }

    match &outcome {
        Ok(()) => log::info!("Notarized {}", app_path.display()),
        Err(e) => log::error!("Notarization of {} failed: {e}", app_path.display()),
    }

    outcome
}

fn create_work_dir(tools: &ToolConfig) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("notarize-");
    let dir = match &tools.temp_root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    Ok(dir)
}

async fn run_steps(
    app_path: &Path,
    work_dir: &Path,
    zip_name: &str,
    options: &mut NotarizeOptions,
) -> Result<()> {
    let tools = &options.tools;

    let entitlements = write_entitlements(work_dir).await?;
    log::debug!("Entitlements written to {}", entitlements.display());

    log::info!("Signing {}", app_path.display());
    sign_app(&tools.codesign, app_path, &options.developer_name, &entitlements).await?;

    log::info!("Creating archive with ditto");
    let zip_path = work_dir.join(zip_name);
    create_archive(&tools.ditto, app_path, &zip_path).await?;
    log::debug!("Archive created at {}", zip_path.display());

    log::info!("Submitting {} to Apple", zip_path.display());
    let mut submit = Command::new(&tools.xcrun);
    submit
        .args(["notarytool", "submit"])
        .arg(&zip_path)
        .arg("--apple-id")
        .arg(&options.email)
        .arg("--password")
        .arg(options.app_password.as_str())
        .arg("--team-id")
        .arg(&options.team_id)
        .arg("--wait");
    run_tool(Step::Submit, submit, options.progress_output.as_mut()).await?;

    log::info!("Stapling ticket to {}", app_path.display());
    let mut staple = Command::new(&tools.xcrun);
    staple.args(["stapler", "staple"]).arg(app_path);
    run_tool(Step::Staple, staple, options.progress_output.as_mut()).await?;

    Ok(())
}
