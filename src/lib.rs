//! Apple notarization for app bundles
//!
//! Drives `codesign`, `ditto`, `xcrun notarytool` and `xcrun stapler` in
//! sequence so a `.app` bundle passes Gatekeeper without warnings.

pub mod config;
pub mod error;
pub mod macos;

// Re-export common types
pub use config::ToolConfig;
pub use error::{NotarizeError, Result, Step};
pub use macos::{NotarizeOptions, ProgressOutput, notarize};
