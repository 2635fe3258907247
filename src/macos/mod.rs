//! macOS notarization for kodegen bundles
//!
//! # Module Organization
//!
//! - `entitlements` - Fixed entitlements descriptor written for every run
//! - `process` - Running an external tool with captured stderr
//! - `signing` - `codesign` invocation
//! - `archive` - `ditto` invocation and archive naming
//! - `notarization` - The sign, archive, submit, staple sequence
//! - `validation` - Path expansion and toolchain checks
//!
//! # Error Handling Strategy
//!
//! Every step's failure is propagated with `?` and aborts the sequence:
//!   • Setup: creating the working directory, writing entitlements
//!   • External tools: spawn failures and non-zero exits carry the step
//!     and the tool's stderr
//!
//! Removing the working directory is the one best-effort operation: a
//! failure there is logged with `log::warn!` and never replaces the
//! pipeline's own result.
//!
//! The tools are addressed through [`crate::config::ToolConfig`], so the
//! module builds on every platform; only macOS ships the real tools.

pub mod archive;
pub mod entitlements;
pub mod notarization;
pub mod process;
pub mod signing;
pub mod validation;

// Re-export public API
pub use archive::archive_name;
pub use entitlements::ENTITLEMENTS_PLIST;
pub use notarization::{NotarizeOptions, notarize};
pub use process::ProgressOutput;
pub use validation::check_toolchain;
