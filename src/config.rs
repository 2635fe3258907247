//! Configuration for the external tools the notarization pipeline drives.

use crate::error::{NotarizeError, Result};
use crate::macos::validation::expand_tilde_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default code signing tool
pub const DEFAULT_CODESIGN: &str = "codesign";

/// Default archiving tool
pub const DEFAULT_DITTO: &str = "ditto";

/// Default developer tool launcher (hosts `notarytool` and `stapler`)
pub const DEFAULT_XCRUN: &str = "xcrun";

/// Executables invoked by [`crate::macos::notarize`] and where its scratch
/// directory lives.
///
/// Every field has a default, so an empty TOML document is valid:
///
/// ```toml
/// codesign = "/usr/bin/codesign"
/// xcrun = "~/Xcode-beta.app/Contents/Developer/usr/bin/xcrun"
/// temp_root = "~/Library/Caches/notarize"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_codesign")]
    pub codesign: PathBuf,

    #[serde(default = "default_ditto")]
    pub ditto: PathBuf,

    #[serde(default = "default_xcrun")]
    pub xcrun: PathBuf,

    /// Parent of the per-run working directory (system temp dir if unset)
    #[serde(default)]
    pub temp_root: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            codesign: default_codesign(),
            ditto: default_ditto(),
            xcrun: default_xcrun(),
            temp_root: None,
        }
    }
}

impl ToolConfig {
    /// Parse from TOML text, expanding `~` in every path.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.expanded()
    }

    /// Read and parse a TOML config file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            NotarizeError::InvalidConfig(format!(
                "Cannot read config file: {}\n   Error: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    fn expanded(self) -> Result<Self> {
        Ok(Self {
            codesign: expand(&self.codesign)?,
            ditto: expand(&self.ditto)?,
            xcrun: expand(&self.xcrun)?,
            temp_root: self.temp_root.as_deref().map(expand).transpose()?,
        })
    }
}

fn expand(path: &Path) -> Result<PathBuf> {
    let raw = path.to_str().ok_or_else(|| {
        NotarizeError::InvalidConfig(format!("Path is not valid UTF-8: {}", path.display()))
    })?;
    expand_tilde_path(raw).map(PathBuf::from)
}

fn default_codesign() -> PathBuf {
    PathBuf::from(DEFAULT_CODESIGN)
}

fn default_ditto() -> PathBuf {
    PathBuf::from(DEFAULT_DITTO)
}

fn default_xcrun() -> PathBuf {
    PathBuf::from(DEFAULT_XCRUN)
}
