//! Entitlements embedded into every signature the pipeline produces

use crate::error::Result;
use std::path::{Path, PathBuf};

/// File name of the entitlements descriptor inside the working directory
pub const ENTITLEMENTS_FILE_NAME: &str = "entitlements.plist";

/// Hardened-runtime exceptions granted to the signed bundle.
///
/// `disable-library-validation` lets the app load dylibs signed by other
/// teams (plugins, embedded interpreters); `allow-dyld-environment-variables`
/// keeps `DYLD_*` overrides working under the hardened runtime.
pub const ENTITLEMENTS_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
  <dict>
    <key>com.apple.security.cs.disable-library-validation</key>
    <true/>
    <key>com.apple.security.cs.allow-dyld-environment-variables</key>
    <true/>
  </dict>
</plist>"#;

/// Write [`ENTITLEMENTS_PLIST`] into `dir` and return its path.
pub async fn write_entitlements(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(ENTITLEMENTS_FILE_NAME);
    tokio::fs::write(&path, ENTITLEMENTS_PLIST).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).await?;
    }

    Ok(path)
}
