//! Error types for the notarization pipeline.

use std::fmt;
use std::process::ExitStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotarizeError>;

/// One external-tool stage of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Sign,
    Archive,
    Submit,
    Staple,
}

impl Step {
    /// Whether the tool's stdout is forwarded to the caller's progress output.
    ///
    /// Only submission and stapling are long-running enough to be worth
    /// streaming; signing and archiving report after exit.
    #[must_use]
    pub fn streams_progress(self) -> bool {
        matches!(self, Self::Submit | Self::Staple)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sign => "codesign",
            Self::Archive => "ditto",
            Self::Submit => "xcrun notarytool",
            Self::Staple => "xcrun stapler",
        })
    }
}

#[derive(Debug, Error)]
pub enum NotarizeError {
    #[error("notarize: failed to start {step} ({program}): {source}")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "notarize: {step} failed: {status}: {stderr}{}{}",
        hint_suffix(.hint),
        progress_suffix(.progress_error)
    )]
    ToolFailed {
        step: Step,
        status: ExitStatus,
        stderr: String,
        hint: Option<&'static str>,
        /// Progress output failure seen while the tool was running
        progress_error: Option<std::io::Error>,
    },

    #[error("notarize: writing {step} progress failed: {source}")]
    Progress {
        step: Step,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid app bundle: {0}")]
    InvalidBundle(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NotarizeError {
    /// The pipeline step that failed, if the failure came from an external tool.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Spawn { step, .. }
            | Self::ToolFailed { step, .. }
            | Self::Progress { step, .. } => Some(*step),
            _ => None,
        }
    }
}

fn hint_suffix(hint: &Option<&'static str>) -> String {
    hint.map(|h| format!("\n\n{h}")).unwrap_or_default()
}

fn progress_suffix(progress_error: &Option<std::io::Error>) -> String {
    progress_error
        .as_ref()
        .map(|e| format!("\n(writing progress output also failed: {e})"))
        .unwrap_or_default()
}
